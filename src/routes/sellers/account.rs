use anyhow::Context;
use axum::{
    Extension, Json,
    extract::{Multipart, State},
    response::IntoResponse,
};
use chrono::Utc;
use diesel::{
    ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper,
    result::{DatabaseErrorKind, Error as DieselError},
};
use diesel_async::RunQueryDsl;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    auth::{jwt, password},
    middleware,
    models::{CreateSellerEntity, SellerEntity},
    orders::lifecycle::{STATUS_ACCEPTED, STATUS_PENDING},
    schema::{orders, sellers},
    storage,
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    let public = OpenApiRouter::new()
        .routes(utoipa_axum::routes!(register))
        .routes(utoipa_axum::routes!(login));

    let protected = OpenApiRouter::new()
        .routes(utoipa_axum::routes!(dashboard))
        .routes(utoipa_axum::routes!(upload_payment_qr))
        .route_layer(axum::middleware::from_fn(
            middleware::sellers_authorization,
        ));

    OpenApiRouter::new().nest("/api/seller", public.merge(protected))
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct RegisterReq {
    name: String,
    email: String,
    password: String,
    shop_name: String,
    tax_id: String,
    latitude: f64,
    longitude: f64,
    address: String,
}

#[derive(Serialize, ToSchema)]
struct AuthRes {
    token: String,
    seller: SellerEntity,
}

/// Register a new seller account.
#[utoipa::path(
    post,
    path = "/register",
    tags = ["Seller account"],
    request_body = RegisterReq,
    responses(
        (status = 200, description = "Seller registered", body = StdResponse<AuthRes, String>),
        (status = 400, description = "Missing fields or email already registered")
    )
)]
async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterReq>,
) -> Result<impl IntoResponse, AppError> {
    if body.email.trim().is_empty() || body.password.len() < 6 {
        return Err(AppError::BadRequest(
            "Email and a password of at least 6 characters are required".to_string(),
        ));
    }

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let password_hash = password::hash_password(&body.password)
        .map_err(|e| AppError::Other(anyhow::anyhow!("Failed to hash password: {e}")))?;

    let seller: SellerEntity = diesel::insert_into(sellers::table)
        .values(CreateSellerEntity {
            name: body.name,
            email: body.email.trim().to_lowercase(),
            password_hash,
            shop_name: body.shop_name,
            tax_id: body.tax_id,
            latitude: body.latitude,
            longitude: body.longitude,
            address: body.address,
        })
        .returning(SellerEntity::as_returning())
        .get_result(conn)
        .await
        .map_err(|err| match err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                AppError::BadRequest("Email already registered".to_string())
            }
            other => AppError::Other(other.into()),
        })?;

    let token = jwt::seller_token(seller.id)?;

    Ok(StdResponse {
        data: Some(AuthRes { token, seller }),
        message: Some("Seller registered successfully"),
    })
}

#[derive(Deserialize, ToSchema)]
struct LoginReq {
    email: String,
    password: String,
}

/// Log in with seller credentials.
#[utoipa::path(
    post,
    path = "/login",
    tags = ["Seller account"],
    request_body = LoginReq,
    responses(
        (status = 200, description = "Logged in", body = StdResponse<AuthRes, String>),
        (status = 401, description = "Invalid credentials")
    )
)]
async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginReq>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let seller: Option<SellerEntity> = sellers::table
        .filter(sellers::email.eq(body.email.trim().to_lowercase()))
        .first(conn)
        .await
        .optional()
        .context("Failed to look up seller")?;

    let seller = seller
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

    let valid = password::verify_password(&body.password, &seller.password_hash)
        .map_err(|e| AppError::Other(anyhow::anyhow!("Password verification failed: {e}")))?;
    if !valid {
        return Err(AppError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    let token = jwt::seller_token(seller.id)?;

    Ok(StdResponse {
        data: Some(AuthRes { token, seller }),
        message: Some("Logged in successfully"),
    })
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct DashboardCounters {
    pending_orders: i64,
    total_earnings: f32,
    today_orders: i64,
}

#[derive(Serialize, ToSchema)]
struct DashboardRes {
    seller: SellerEntity,
    dashboard: DashboardCounters,
}

/// Seller dashboard: pending work, earnings, today's volume.
#[utoipa::path(
    get,
    path = "/dashboard",
    tags = ["Seller account"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Dashboard", body = StdResponse<DashboardRes, String>)
    )
)]
async fn dashboard(
    State(state): State<AppState>,
    Extension(seller_id): Extension<i32>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let seller: SellerEntity = sellers::table
        .find(seller_id)
        .first(conn)
        .await
        .map_err(|_| AppError::NotFound("Seller not found".to_string()))?;

    let pending_orders: i64 = orders::table
        .filter(orders::seller_id.eq(seller_id))
        .filter(orders::status.eq(STATUS_PENDING))
        .count()
        .get_result(conn)
        .await
        .context("Failed to count pending orders")?;

    let total_earnings: Option<f32> = orders::table
        .filter(orders::seller_id.eq(seller_id))
        .filter(orders::status.eq(STATUS_ACCEPTED))
        .select(diesel::dsl::sum(orders::total_price))
        .get_result(conn)
        .await
        .context("Failed to sum earnings")?;

    let today_start = Utc::now()
        .date_naive()
        .and_time(chrono::NaiveTime::MIN)
        .and_utc();
    let today_orders: i64 = orders::table
        .filter(orders::seller_id.eq(seller_id))
        .filter(orders::created_at.ge(today_start))
        .count()
        .get_result(conn)
        .await
        .context("Failed to count today's orders")?;

    Ok(StdResponse {
        data: Some(DashboardRes {
            seller,
            dashboard: DashboardCounters {
                pending_orders,
                total_earnings: total_earnings.unwrap_or(0.0),
                today_orders,
            },
        }),
        message: Some("Dashboard fetched successfully"),
    })
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct PaymentQrRes {
    payment_qr: String,
}

/// Upload the shop's payment QR image (multipart field `qr`).
#[utoipa::path(
    put,
    path = "/payment-qr",
    tags = ["Seller account"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "QR stored", body = StdResponse<PaymentQrRes, String>),
        (status = 400, description = "Missing qr file")
    )
)]
async fn upload_payment_qr(
    State(state): State<AppState>,
    Extension(seller_id): Extension<i32>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut upload: Option<(Vec<u8>, &'static str)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::BadRequest("Malformed multipart body".to_string()))?
    {
        if field.name() == Some("qr") {
            let ext = storage::extension_for(field.content_type());
            let bytes = field
                .bytes()
                .await
                .map_err(|_| AppError::BadRequest("Failed to read qr upload".to_string()))?;
            upload = Some((bytes.to_vec(), ext));
        }
    }

    let (bytes, ext) =
        upload.ok_or_else(|| AppError::BadRequest("qr file is required".to_string()))?;
    let reference = storage::save_upload(&state.config.uploads_dir, "qr", &bytes, ext)?;

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    diesel::update(sellers::table.find(seller_id))
        .set(sellers::payment_qr.eq(&reference))
        .execute(conn)
        .await
        .context("Failed to store payment QR reference")?;

    Ok(StdResponse {
        data: Some(PaymentQrRes {
            payment_qr: reference,
        }),
        message: Some("Payment QR uploaded successfully"),
    })
}
