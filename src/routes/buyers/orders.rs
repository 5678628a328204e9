use std::collections::HashMap;

use anyhow::Context;
use axum::{
    Extension,
    extract::{DefaultBodyLimit, Multipart, State},
    response::IntoResponse,
};
use diesel::{ExpressionMethods, QueryDsl, SelectableHelper};
use diesel_async::{AsyncConnection, RunQueryDsl};
use serde::Serialize;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    middleware,
    models::{CreateOrderEntity, CreateOrderItemEntity, OrderEntity, OrderItemEntity, ProductEntity},
    orders::{CartLine, lifecycle::OrderStatus, resolve_cart},
    relay::{Notification, seller_room},
    schema::{order_items, orders, products},
    storage,
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/api/buyer",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(place_order))
            .routes(utoipa_axum::routes!(my_orders))
            .route_layer(axum::middleware::from_fn(
                middleware::buyers_authorization,
            ))
            .layer(DefaultBodyLimit::max(8 * 1024 * 1024)),
    )
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct PlaceOrderRes {
    order_id: i32,
}

#[derive(Default)]
struct PlaceOrderForm {
    items: Option<String>,
    address: Option<String>,
    name: Option<String>,
    contact_number: Option<String>,
    prescription: Option<(Vec<u8>, &'static str)>,
}

async fn read_form(multipart: &mut Multipart) -> Result<PlaceOrderForm, AppError> {
    let mut form = PlaceOrderForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::BadRequest("Malformed multipart body".to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "items" => {
                form.items = Some(
                    field
                        .text()
                        .await
                        .map_err(|_| AppError::BadRequest("Malformed items field".to_string()))?,
                )
            }
            "address" => {
                form.address = Some(field.text().await.unwrap_or_default());
            }
            "name" => {
                form.name = Some(field.text().await.unwrap_or_default());
            }
            "contactNumber" => {
                form.contact_number = Some(field.text().await.unwrap_or_default());
            }
            "prescription" => {
                let ext = storage::extension_for(field.content_type());
                let bytes = field.bytes().await.map_err(|_| {
                    AppError::BadRequest("Failed to read prescription upload".to_string())
                })?;
                form.prescription = Some((bytes.to_vec(), ext));
            }
            // totalPrice and any unknown fields are ignored; totals are
            // computed server-side.
            _ => {}
        }
    }

    Ok(form)
}

/// Place an order from the buyer's cart snapshot.
///
/// Multipart form: `items` (JSON array of `{productId, quantity}`),
/// `address`, `name`, `contactNumber`, optional `prescription` image.
#[utoipa::path(
    post,
    path = "/order/place",
    tags = ["Buyer orders"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Order placed", body = StdResponse<PlaceOrderRes, String>),
        (status = 400, description = "Empty cart, mixed sellers or missing prescription"),
        (status = 404, description = "Referenced product does not exist")
    )
)]
async fn place_order(
    State(state): State<AppState>,
    Extension(buyer_id): Extension<i32>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = read_form(&mut multipart).await?;

    let lines: Vec<CartLine> = match form.items.as_deref() {
        None | Some("") => Vec::new(),
        Some(raw) => serde_json::from_str(raw)
            .map_err(|_| AppError::BadRequest("Malformed items payload".to_string()))?,
    };

    let address = form
        .address
        .filter(|a| !a.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Delivery address is required".to_string()))?;
    let contact_name = form
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Contact name is required".to_string()))?;
    let contact_number = form
        .contact_number
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Contact number is required".to_string()))?;

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let ids: Vec<i32> = lines.iter().map(|l| l.product_id).collect();
    let catalog: Vec<ProductEntity> = products::table
        .filter(products::id.eq_any(&ids))
        .get_results(conn)
        .await
        .context("Failed to load cart products")?;

    let summary = resolve_cart(&lines, &catalog)?;

    if summary.requires_prescription && form.prescription.is_none() {
        return Err(AppError::BadRequest(
            "Prescription is required for prescribed medicines".to_string(),
        ));
    }

    let prescription = match &form.prescription {
        Some((bytes, ext)) => Some(storage::save_upload(
            &state.config.uploads_dir,
            "prescriptions",
            bytes,
            ext,
        )?),
        None => None,
    };

    let delivery_charge = state.config.delivery_charge;
    let platform_fee = state.config.platform_fee;
    let total_price = summary.items_total + delivery_charge + platform_fee;
    let requires_prescription = summary.requires_prescription;
    let seller_id = summary.seller_id;
    let item_count = summary.lines.len();
    let (status, _) = OrderStatus::Pending.encode();

    let order = conn
        .transaction(move |conn| {
            Box::pin(async move {
                let order = diesel::insert_into(orders::table)
                    .values(CreateOrderEntity {
                        buyer_id,
                        seller_id,
                        status: status.to_string(),
                        prescription,
                        prescription_verified: !requires_prescription,
                        total_price,
                        delivery_charge,
                        platform_fee,
                        delivery_address: address,
                        contact_name,
                        contact_number,
                    })
                    .returning(OrderEntity::as_returning())
                    .get_result(conn)
                    .await
                    .context("Failed to create order")?;

                let items: Vec<CreateOrderItemEntity> = summary
                    .lines
                    .iter()
                    .map(|line| CreateOrderItemEntity {
                        order_id: order.id,
                        product_id: line.product_id,
                        quantity: line.quantity,
                        unit_price: line.unit_price,
                        requires_prescription: line.requires_prescription,
                    })
                    .collect();

                diesel::insert_into(order_items::table)
                    .values(items)
                    .execute(conn)
                    .await
                    .context("Failed to create order items")?;

                Ok::<OrderEntity, anyhow::Error>(order)
            })
        })
        .await
        .context("Transaction failed")?;

    // Best-effort: a seller with no live session simply misses the push.
    state.relay.publish(
        &seller_room(order.seller_id),
        Notification::NewOrder {
            order_id: order.id,
            buyer_name: order.contact_name.clone(),
            total_price: order.total_price,
            item_count,
        },
    );

    Ok(StdResponse {
        data: Some(PlaceOrderRes { order_id: order.id }),
        message: Some("Order placed successfully"),
    })
}

#[derive(Serialize, ToSchema)]
struct OrderWithItems {
    order: OrderEntity,
    items: Vec<OrderItemEntity>,
    lifecycle: OrderStatus,
}

/// Fetch all orders belonging to the authenticated buyer.
#[utoipa::path(
    get,
    path = "/orders",
    tags = ["Buyer orders"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "List my orders", body = StdResponse<Vec<OrderWithItems>, String>)
    )
)]
async fn my_orders(
    State(state): State<AppState>,
    Extension(buyer_id): Extension<i32>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let my_orders: Vec<OrderEntity> = orders::table
        .filter(orders::buyer_id.eq(buyer_id))
        .order_by(orders::updated_at.desc())
        .get_results(conn)
        .await
        .context("Failed to get my orders")?;

    let order_ids: Vec<i32> = my_orders.iter().map(|o| o.id).collect();
    let items: Vec<OrderItemEntity> = order_items::table
        .filter(order_items::order_id.eq_any(&order_ids))
        .get_results(conn)
        .await
        .context("Failed to get order items")?;

    let mut grouped: HashMap<i32, Vec<OrderItemEntity>> = HashMap::new();
    for item in items {
        grouped.entry(item.order_id).or_default().push(item);
    }

    let data = my_orders
        .into_iter()
        .map(|order| {
            let lifecycle = OrderStatus::decode(&order.status, order.delivery_stage.as_deref())
                .context("Corrupt order status row")?;
            Ok(OrderWithItems {
                items: grouped.remove(&order.id).unwrap_or_default(),
                lifecycle,
                order,
            })
        })
        .collect::<Result<Vec<_>, anyhow::Error>>()?;

    Ok(StdResponse {
        data: Some(data),
        message: Some("Get my orders successfully"),
    })
}
