use anyhow::Context;
use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;
use serde::Deserialize;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    middleware,
    models::OrderEntity,
    orders::lifecycle::{DeliveryStage, OrderStatus},
    schema::{orders, riders},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/api/admin",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(list_orders))
            .routes(utoipa_axum::routes!(mark_assigned))
            .routes(utoipa_axum::routes!(mark_delivered))
            .route_layer(axum::middleware::from_fn(
                middleware::admins_authorization,
            )),
    )
}

/// All orders in the system, newest first.
#[utoipa::path(
    get,
    path = "/orders",
    tags = ["Admin orders"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Orders", body = StdResponse<Vec<OrderEntity>, String>)
    )
)]
async fn list_orders(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let all: Vec<OrderEntity> = orders::table
        .order_by(orders::updated_at.desc())
        .get_results(conn)
        .await
        .context("Failed to get orders")?;

    Ok(StdResponse {
        data: Some(all),
        message: Some("Get orders successfully"),
    })
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct MarkAssignedReq {
    assigned_rider_id: i32,
}

/// Hand an accepted order to a rider.
///
/// Gated on `Accepted(Preparing)`: a pending, rejected, already-shipped or
/// delivered order conflicts instead of silently re-shipping.
#[utoipa::path(
    put,
    path = "/orders/{order_id}/mark-assigned",
    tags = ["Admin orders"],
    security(("bearerAuth" = [])),
    params(("order_id" = i32, Path, description = "Order ID")),
    request_body = MarkAssignedReq,
    responses(
        (status = 200, description = "Order shipped", body = StdResponse<OrderEntity, String>),
        (status = 404, description = "Order or rider not found"),
        (status = 409, description = "Order is not awaiting shipment")
    )
)]
async fn mark_assigned(
    Path(order_id): Path<i32>,
    State(state): State<AppState>,
    Json(body): Json<MarkAssignedReq>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let rider_exists: Option<i32> = riders::table
        .find(body.assigned_rider_id)
        .select(riders::id)
        .first(conn)
        .await
        .optional()
        .context("Failed to look up rider")?;
    if rider_exists.is_none() {
        return Err(AppError::NotFound("Rider not found".to_string()));
    }

    let from = OrderStatus::Accepted(DeliveryStage::Preparing);
    let to = from.mark_shipped().expect("preparing order can ship");
    let (status, from_stage) = from.encode();
    let (_, to_stage) = to.encode();

    let updated: Option<OrderEntity> = diesel::update(
        orders::table
            .find(order_id)
            .filter(orders::status.eq(status))
            .filter(orders::delivery_stage.eq(from_stage)),
    )
    .set((
        orders::delivery_stage.eq(to_stage),
        orders::assigned_rider_id.eq(body.assigned_rider_id),
    ))
    .returning(OrderEntity::as_returning())
    .get_result(conn)
    .await
    .optional()
    .context("Failed to update order")?;

    match updated {
        Some(order) => Ok(StdResponse {
            data: Some(order),
            message: Some("Order marked as assigned"),
        }),
        None => {
            // Distinguish a missing order from one in the wrong state.
            let exists: Option<i32> = orders::table
                .find(order_id)
                .select(orders::id)
                .first(conn)
                .await
                .optional()
                .context("Failed to look up order")?;
            match exists {
                None => Err(AppError::NotFound("Order not found".to_string())),
                Some(_) => Err(AppError::Conflict(
                    "Order is not awaiting shipment".to_string(),
                )),
            }
        }
    }
}

/// Complete a shipped order. Terminal: a delivered order never transitions
/// again.
#[utoipa::path(
    put,
    path = "/orders/{order_id}/mark-delivered",
    tags = ["Admin orders"],
    security(("bearerAuth" = [])),
    params(("order_id" = i32, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order delivered", body = StdResponse<OrderEntity, String>),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order has not been shipped")
    )
)]
async fn mark_delivered(
    Path(order_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let from = OrderStatus::Accepted(DeliveryStage::Shipped);
    let to = from.mark_delivered().expect("shipped order can deliver");
    let (status, from_stage) = from.encode();
    let (_, to_stage) = to.encode();

    let updated: Option<OrderEntity> = diesel::update(
        orders::table
            .find(order_id)
            .filter(orders::status.eq(status))
            .filter(orders::delivery_stage.eq(from_stage)),
    )
    .set(orders::delivery_stage.eq(to_stage))
    .returning(OrderEntity::as_returning())
    .get_result(conn)
    .await
    .optional()
    .context("Failed to update order")?;

    match updated {
        Some(order) => Ok(StdResponse {
            data: Some(order),
            message: Some("Order marked as delivered"),
        }),
        None => {
            let exists: Option<i32> = orders::table
                .find(order_id)
                .select(orders::id)
                .first(conn)
                .await
                .optional()
                .context("Failed to look up order")?;
            match exists {
                None => Err(AppError::NotFound("Order not found".to_string())),
                Some(_) => Err(AppError::Conflict(
                    "Order has not been shipped".to_string(),
                )),
            }
        }
    }
}
