use anyhow::Context;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use diesel::{ExpressionMethods, QueryDsl};
use diesel_async::RunQueryDsl;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    geo,
    models::{ProductEntity, SellerEntity},
    schema::{products, sellers},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/api/buyer",
        OpenApiRouter::new().routes(utoipa_axum::routes!(nearby_products)),
    )
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct NearbyQuery {
    longitude: f64,
    latitude: f64,
    /// Search radius in meters, defaults to 3000.
    max_distance: Option<f64>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct NearbyProduct {
    product: ProductEntity,
    shop_name: String,
    distance_meters: f64,
}

/// Products from stores within the radius, nearest store first.
#[utoipa::path(
    get,
    path = "/products",
    tags = ["Catalog"],
    params(
        ("longitude" = f64, Query, description = "Buyer longitude"),
        ("latitude" = f64, Query, description = "Buyer latitude"),
        ("maxDistance" = Option<f64>, Query, description = "Radius in meters (default 3000)")
    ),
    responses(
        (status = 200, description = "Nearby products", body = StdResponse<Vec<NearbyProduct>, String>)
    )
)]
async fn nearby_products(
    State(state): State<AppState>,
    Query(query): Query<NearbyQuery>,
) -> Result<impl IntoResponse, AppError> {
    let radius = query.max_distance.unwrap_or(geo::DEFAULT_RADIUS_METERS);
    if !(-90.0..=90.0).contains(&query.latitude) || !(-180.0..=180.0).contains(&query.longitude) {
        return Err(AppError::BadRequest("Invalid coordinates".to_string()));
    }

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let (lat_min, lat_max, lon_min, lon_max) =
        geo::bounding_box(query.latitude, query.longitude, radius);

    let candidates: Vec<SellerEntity> = sellers::table
        .filter(sellers::latitude.between(lat_min, lat_max))
        .filter(sellers::longitude.between(lon_min, lon_max))
        .get_results(conn)
        .await
        .context("Failed to query sellers in bounding box")?;

    // Exact distance cut and nearest-first ordering.
    let mut nearby: Vec<(SellerEntity, f64)> = candidates
        .into_iter()
        .map(|s| {
            let d = geo::haversine_meters(query.latitude, query.longitude, s.latitude, s.longitude);
            (s, d)
        })
        .filter(|(_, d)| *d <= radius)
        .collect();
    nearby.sort_by(|a, b| a.1.total_cmp(&b.1));

    let seller_ids: Vec<i32> = nearby.iter().map(|(s, _)| s.id).collect();
    let catalog: Vec<ProductEntity> = products::table
        .filter(products::seller_id.eq_any(&seller_ids))
        .get_results(conn)
        .await
        .context("Failed to get products for nearby sellers")?;

    let results: Vec<NearbyProduct> = nearby
        .iter()
        .flat_map(|(seller, distance)| {
            catalog
                .iter()
                .filter(|p| p.seller_id == seller.id)
                .map(|p| NearbyProduct {
                    product: p.clone(),
                    shop_name: seller.shop_name.clone(),
                    distance_meters: *distance,
                })
                .collect::<Vec<_>>()
        })
        .collect();

    Ok(StdResponse {
        data: Some(results),
        message: Some("Nearby products fetched successfully"),
    })
}
