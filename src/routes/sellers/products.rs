use anyhow::Context;
use axum::{
    Extension,
    extract::{Multipart, Path, State},
    response::IntoResponse,
};
use diesel::{AsChangeset, ExpressionMethods, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    middleware,
    models::{CreateProductEntity, ProductEntity},
    schema::products,
    storage,
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/api/seller",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(list_products))
            .routes(utoipa_axum::routes!(create_product))
            .routes(utoipa_axum::routes!(update_product))
            .routes(utoipa_axum::routes!(delete_product))
            .route_layer(axum::middleware::from_fn(
                middleware::sellers_authorization,
            )),
    )
}

#[derive(Default, AsChangeset)]
#[diesel(table_name = crate::schema::products)]
struct ProductForm {
    name: Option<String>,
    description: Option<String>,
    price: Option<f32>,
    category: Option<String>,
    image: Option<String>,
    is_general: Option<bool>,
}

impl ProductForm {
    /// An all-`None` changeset is not a valid UPDATE.
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.category.is_none()
            && self.image.is_none()
            && self.is_general.is_none()
    }
}

async fn read_product_form(
    state: &AppState,
    multipart: &mut Multipart,
) -> Result<ProductForm, AppError> {
    let mut form = ProductForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::BadRequest("Malformed multipart body".to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "name" => form.name = Some(field.text().await.unwrap_or_default()),
            "description" => form.description = Some(field.text().await.unwrap_or_default()),
            "price" => {
                let raw = field.text().await.unwrap_or_default();
                form.price = Some(
                    raw.parse()
                        .map_err(|_| AppError::BadRequest("Invalid price".to_string()))?,
                );
            }
            "category" => form.category = Some(field.text().await.unwrap_or_default()),
            "isGeneral" => {
                let raw = field.text().await.unwrap_or_default();
                form.is_general = Some(
                    raw.parse()
                        .map_err(|_| AppError::BadRequest("Invalid isGeneral flag".to_string()))?,
                );
            }
            "image" => {
                let ext = storage::extension_for(field.content_type());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|_| AppError::BadRequest("Failed to read image upload".to_string()))?;
                form.image = Some(storage::save_upload(
                    &state.config.uploads_dir,
                    "products",
                    &bytes,
                    ext,
                )?);
            }
            _ => {}
        }
    }

    Ok(form)
}

/// List the authenticated seller's products.
#[utoipa::path(
    get,
    path = "/products",
    tags = ["Seller products"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Products", body = StdResponse<Vec<ProductEntity>, String>)
    )
)]
async fn list_products(
    State(state): State<AppState>,
    Extension(seller_id): Extension<i32>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let items: Vec<ProductEntity> = products::table
        .filter(products::seller_id.eq(seller_id))
        .order_by(products::updated_at.desc())
        .get_results(conn)
        .await
        .context("Failed to get products")?;

    Ok(StdResponse {
        data: Some(items),
        message: Some("Get products successfully"),
    })
}

/// Add a product (multipart: name, price, optional description, category,
/// isGeneral, image).
#[utoipa::path(
    post,
    path = "/products",
    tags = ["Seller products"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Created", body = StdResponse<ProductEntity, String>),
        (status = 400, description = "Missing name or price")
    )
)]
async fn create_product(
    State(state): State<AppState>,
    Extension(seller_id): Extension<i32>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = read_product_form(&state, &mut multipart).await?;

    let name = form
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Product name is required".to_string()))?;
    let price = form
        .price
        .ok_or_else(|| AppError::BadRequest("Product price is required".to_string()))?;

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let product: ProductEntity = diesel::insert_into(products::table)
        .values(CreateProductEntity {
            seller_id,
            name,
            description: form.description.unwrap_or_default(),
            price,
            category: form.category.unwrap_or_else(|| "general".to_string()),
            image: form.image,
            is_general: form.is_general.unwrap_or(true),
        })
        .returning(ProductEntity::as_returning())
        .get_result(conn)
        .await
        .context("Failed to create product")?;

    Ok(StdResponse {
        data: Some(product),
        message: Some("Product created successfully"),
    })
}

/// Edit an owned product; only supplied fields change.
#[utoipa::path(
    put,
    path = "/products/{id}",
    tags = ["Seller products"],
    security(("bearerAuth" = [])),
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Updated", body = StdResponse<ProductEntity, String>),
        (status = 404, description = "Not found or not owned")
    )
)]
async fn update_product(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Extension(seller_id): Extension<i32>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = read_product_form(&state, &mut multipart).await?;
    if form.is_empty() {
        return Err(AppError::BadRequest("No fields to update".to_string()));
    }

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let product: ProductEntity = diesel::update(
        products::table
            .find(id)
            .filter(products::seller_id.eq(seller_id)),
    )
    .set(form)
    .returning(ProductEntity::as_returning())
    .get_result(conn)
    .await
    .map_err(|err| match err {
        diesel::result::Error::NotFound => AppError::NotFound("Product not found".to_string()),
        other => AppError::Other(other.into()),
    })?;

    Ok(StdResponse {
        data: Some(product),
        message: Some("Product updated successfully"),
    })
}

/// Remove an owned product.
#[utoipa::path(
    delete,
    path = "/products/{id}",
    tags = ["Seller products"],
    security(("bearerAuth" = [])),
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Deleted", body = StdResponse<String, String>),
        (status = 404, description = "Not found or not owned")
    )
)]
async fn delete_product(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Extension(seller_id): Extension<i32>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let deleted = diesel::delete(
        products::table
            .find(id)
            .filter(products::seller_id.eq(seller_id)),
    )
    .execute(conn)
    .await
    .context("Failed to delete product")?;

    if deleted == 0 {
        return Err(AppError::NotFound("Product not found".to_string()));
    }

    Ok(StdResponse::<String, _> {
        data: None,
        message: Some("Product deleted successfully"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_with_no_fields_is_empty() {
        assert!(ProductForm::default().is_empty());
    }

    #[test]
    fn form_with_any_field_is_not_empty() {
        let form = ProductForm {
            price: Some(12.5),
            ..ProductForm::default()
        };
        assert!(!form.is_empty());

        let form = ProductForm {
            is_general: Some(false),
            ..ProductForm::default()
        };
        assert!(!form.is_empty());
    }
}
