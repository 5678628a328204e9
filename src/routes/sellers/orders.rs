use std::collections::HashMap;

use anyhow::Context;
use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use diesel::{ExpressionMethods, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    middleware,
    models::{OrderEntity, OrderItemEntity},
    orders::lifecycle::{OrderAction, OrderStatus},
    relay::{Notification, buyer_room},
    schema::{order_items, orders},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/api/seller",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(list_orders))
            .routes(utoipa_axum::routes!(update_order_status))
            .routes(utoipa_axum::routes!(verify_prescription))
            .route_layer(axum::middleware::from_fn(
                middleware::sellers_authorization,
            )),
    )
}

#[derive(Serialize, ToSchema)]
struct SellerOrderWithItems {
    order: OrderEntity,
    items: Vec<OrderItemEntity>,
    lifecycle: OrderStatus,
}

/// All orders placed with the authenticated seller, newest first.
#[utoipa::path(
    get,
    path = "/orders",
    tags = ["Seller orders"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Orders", body = StdResponse<Vec<SellerOrderWithItems>, String>)
    )
)]
async fn list_orders(
    State(state): State<AppState>,
    Extension(seller_id): Extension<i32>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let my_orders: Vec<OrderEntity> = orders::table
        .filter(orders::seller_id.eq(seller_id))
        .order_by(orders::updated_at.desc())
        .get_results(conn)
        .await
        .context("Failed to get seller orders")?;

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
            Ok(SellerOrderWithItems {
                items: grouped.remove(&order.id).unwrap_or_default(),
                lifecycle,
                order,
            })
        })
        .collect::<Result<Vec<_>, anyhow::Error>>()?;

    Ok(StdResponse {
        data: Some(data),
        message: Some("Get orders successfully"),
    })
}

/// Accept or reject a pending order.
///
/// The UPDATE matches on `status = PENDING`, so a repeated call (or a
/// concurrent one) finds no row: at-most-once without explicit locking.
#[utoipa::path(
    put,
    path = "/order/{order_id}/{action}",
    tags = ["Seller orders"],
    security(("bearerAuth" = [])),
    params(
        ("order_id" = i32, Path, description = "Order ID"),
        ("action" = String, Path, description = "accept or reject")
    ),
    responses(
        (status = 200, description = "Status updated", body = StdResponse<OrderEntity, String>),
        (status = 400, description = "Invalid action"),
        (status = 404, description = "Order not found or not pending")
    )
)]
async fn update_order_status(
    Path((order_id, action)): Path<(i32, String)>,
    State(state): State<AppState>,
    Extension(seller_id): Extension<i32>,
) -> Result<impl IntoResponse, AppError> {
    let action =
        OrderAction::parse(&action).map_err(|e| AppError::BadRequest(e.to_string()))?;

    // Pending is the only state this endpoint may leave.
    let next = OrderStatus::Pending
        .apply(action)
        .expect("pending order accepts both actions");
    let (status, stage) = next.encode();

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let (pending, _) = OrderStatus::Pending.encode();
    let order: OrderEntity = diesel::update(
        orders::table
            .find(order_id)
            .filter(orders::seller_id.eq(seller_id))
            .filter(orders::status.eq(pending)),
    )
    .set((
        orders::status.eq(status),
        orders::delivery_stage.eq(stage),
    ))
    .returning(OrderEntity::as_returning())
    .get_result(conn)
    .await
    .map_err(|_| AppError::NotFound("Order not found or not pending".to_string()))?;

    state.relay.publish(
        &buyer_room(order.buyer_id),
        Notification::OrderDecision {
            order_id: order.id,
            accepted: action == OrderAction::Accept,
        },
    );

    Ok(StdResponse {
        data: Some(order),
        message: Some("Order status updated successfully"),
    })
}

#[derive(Deserialize, ToSchema)]
struct VerifyPrescriptionReq {
    verified: bool,
}

/// Record the seller's judgement on an uploaded prescription. Deliberately
/// independent of the order's lifecycle state.
#[utoipa::path(
    put,
    path = "/order/{order_id}/verify-prescription",
    tags = ["Seller orders"],
    security(("bearerAuth" = [])),
    params(("order_id" = i32, Path, description = "Order ID")),
    request_body = VerifyPrescriptionReq,
    responses(
        (status = 200, description = "Recorded", body = StdResponse<OrderEntity, String>),
        (status = 404, description = "Order not found")
    )
)]
async fn verify_prescription(
    Path(order_id): Path<i32>,
    State(state): State<AppState>,
    Extension(seller_id): Extension<i32>,
    Json(body): Json<VerifyPrescriptionReq>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let order: OrderEntity = diesel::update(
        orders::table
            .find(order_id)
            .filter(orders::seller_id.eq(seller_id)),
    )
    .set(orders::prescription_verified.eq(body.verified))
    .returning(OrderEntity::as_returning())
    .get_result(conn)
    .await
    .map_err(|_| AppError::NotFound("Order not found".to_string()))?;

    Ok(StdResponse {
        data: Some(order),
        message: Some("Prescription verification recorded"),
    })
}
