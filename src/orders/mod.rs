//! Order placement domain rules: same-seller-per-order, prescription gating
//! and server-side totals. The HTTP handlers stay thin around this.

pub mod lifecycle;

use serde::Deserialize;
use utoipa::ToSchema;

use crate::{app_error::AppError, models::ProductEntity};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: i32,
    pub quantity: i32,
}

#[derive(Debug)]
pub struct ResolvedLine {
    pub product_id: i32,
    pub quantity: i32,
    pub unit_price: f32,
    pub requires_prescription: bool,
}

/// A validated cart: one seller, resolved prices, prescription demand known.
#[derive(Debug)]
pub struct CartSummary {
    pub seller_id: i32,
    pub requires_prescription: bool,
    pub items_total: f32,
    pub lines: Vec<ResolvedLine>,
}

/// Validates the cart against the catalog snapshot. `products` is the set of
/// catalog rows fetched for the referenced ids.
pub fn resolve_cart(lines: &[CartLine], products: &[ProductEntity]) -> Result<CartSummary, AppError> {
    if lines.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".to_string()));
    }

    let mut seller_id: Option<i32> = None;
    let mut requires_prescription = false;
    let mut items_total = 0.0_f32;
    let mut resolved = Vec::with_capacity(lines.len());

    for line in lines {
        if line.quantity <= 0 {
            return Err(AppError::BadRequest("Invalid item quantity".to_string()));
        }

        let product = products
            .iter()
            .find(|p| p.id == line.product_id)
            .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

        match seller_id {
            None => seller_id = Some(product.seller_id),
            Some(id) if id != product.seller_id => {
                return Err(AppError::BadRequest(
                    "All products in an order must be from the same seller".to_string(),
                ));
            }
            Some(_) => {}
        }

        requires_prescription |= !product.is_general;
        items_total += product.price * line.quantity as f32;
        // The same product on two lines folds into one: order items are
        // keyed by (order_id, product_id).
        match resolved
            .iter_mut()
            .find(|r: &&mut ResolvedLine| r.product_id == product.id)
        {
            Some(existing) => existing.quantity += line.quantity,
            None => resolved.push(ResolvedLine {
                product_id: product.id,
                quantity: line.quantity,
                unit_price: product.price,
                requires_prescription: !product.is_general,
            }),
        }
    }

    Ok(CartSummary {
        // Non-empty cart, so the first line set this.
        seller_id: seller_id.expect("cart has at least one line"),
        requires_prescription,
        items_total,
        lines: resolved,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(id: i32, seller_id: i32, price: f32, is_general: bool) -> ProductEntity {
        ProductEntity {
            id,
            seller_id,
            name: format!("product-{id}"),
            description: String::new(),
            price,
            category: "general".to_string(),
            image: None,
            is_general,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn line(product_id: i32, quantity: i32) -> CartLine {
        CartLine {
            product_id,
            quantity,
        }
    }

    #[test]
    fn empty_cart_is_rejected() {
        let err = resolve_cart(&[], &[]).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(m) if m == "Cart is empty"));
    }

    #[test]
    fn unknown_product_is_not_found() {
        let err = resolve_cart(&[line(9, 1)], &[product(1, 1, 10.0, true)]).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn multi_seller_cart_is_rejected() {
        let catalog = vec![product(1, 1, 10.0, true), product(2, 2, 5.0, true)];
        let err = resolve_cart(&[line(1, 1), line(2, 1)], &catalog).unwrap_err();
        assert!(matches!(
            err,
            AppError::BadRequest(m) if m == "All products in an order must be from the same seller"
        ));
    }

    #[test]
    fn single_seller_cart_resolves_totals() {
        let catalog = vec![product(1, 7, 10.0, true), product(2, 7, 2.5, true)];
        let summary = resolve_cart(&[line(1, 2), line(2, 4)], &catalog).unwrap();
        assert_eq!(summary.seller_id, 7);
        assert!(!summary.requires_prescription);
        assert!((summary.items_total - 30.0).abs() < f32::EPSILON);
        assert_eq!(summary.lines.len(), 2);
    }

    #[test]
    fn any_non_general_item_demands_a_prescription() {
        let catalog = vec![product(1, 7, 10.0, true), product(2, 7, 2.5, false)];
        let summary = resolve_cart(&[line(1, 1), line(2, 1)], &catalog).unwrap();
        assert!(summary.requires_prescription);
        assert!(summary.lines[1].requires_prescription);
        assert!(!summary.lines[0].requires_prescription);
    }

    #[test]
    fn repeated_product_lines_fold_into_one_item() {
        let catalog = vec![product(1, 7, 10.0, true), product(2, 7, 4.0, true)];
        let summary = resolve_cart(&[line(1, 1), line(2, 1), line(1, 2)], &catalog).unwrap();
        // One row per product, quantities summed, total unchanged.
        assert_eq!(summary.lines.len(), 2);
        let folded = summary
            .lines
            .iter()
            .find(|l| l.product_id == 1)
            .unwrap();
        assert_eq!(folded.quantity, 3);
        assert!((summary.items_total - 34.0).abs() < f32::EPSILON);
    }

    #[test]
    fn non_positive_quantity_is_rejected() {
        let catalog = vec![product(1, 7, 10.0, true)];
        assert!(resolve_cart(&[line(1, 0)], &catalog).is_err());
        assert!(resolve_cart(&[line(1, -2)], &catalog).is_err());
    }
}
