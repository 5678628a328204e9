use anyhow::Context;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use diesel::{ExpressionMethods, QueryDsl};
use diesel_async::{AsyncConnection, RunQueryDsl};
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    middleware,
    models::SellerEntity,
    schema::{products, sellers},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/api/admin",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(list_sellers))
            .routes(utoipa_axum::routes!(delete_seller))
            .route_layer(axum::middleware::from_fn(
                middleware::admins_authorization,
            )),
    )
}

/// List all registered shops.
#[utoipa::path(
    get,
    path = "/sellers",
    tags = ["Admin sellers"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Sellers", body = StdResponse<Vec<SellerEntity>, String>)
    )
)]
async fn list_sellers(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let shops: Vec<SellerEntity> = sellers::table
        .order_by(sellers::created_at.desc())
        .get_results(conn)
        .await
        .context("Failed to get sellers")?;

    Ok(StdResponse {
        data: Some(shops),
        message: Some("Get sellers successfully"),
    })
}

/// Remove a shop. Its products go with it in the same transaction, so no
/// orphaned products survive.
#[utoipa::path(
    delete,
    path = "/sellers/{id}",
    tags = ["Admin sellers"],
    security(("bearerAuth" = [])),
    params(("id" = i32, Path, description = "Seller ID")),
    responses(
        (status = 200, description = "Deleted", body = StdResponse<String, String>),
        (status = 404, description = "Seller not found")
    )
)]
async fn delete_seller(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let deleted = conn
        .transaction(move |conn| {
            Box::pin(async move {
                diesel::delete(products::table.filter(products::seller_id.eq(id)))
                    .execute(conn)
                    .await
                    .context("Failed to delete seller's products")?;

                let deleted = diesel::delete(sellers::table.find(id))
                    .execute(conn)
                    .await
                    .context("Failed to delete seller")?;

                Ok::<usize, anyhow::Error>(deleted)
            })
        })
        .await
        .context("Transaction failed")?;

    if deleted == 0 {
        return Err(AppError::NotFound("Seller not found".to_string()));
    }

    Ok(StdResponse::<String, _> {
        data: None,
        message: Some("Seller deleted successfully"),
    })
}
