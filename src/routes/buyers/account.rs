use anyhow::Context;
use axum::{Extension, Json, extract::State, response::IntoResponse};
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    api::sms,
    app_error::{AppError, StdResponse},
    app_state::AppState,
    auth::jwt,
    middleware,
    models::{CreateUserEntity, UserEntity},
    otp::{self, OTP_TTL},
    schema::users,
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    let public = OpenApiRouter::new()
        .routes(utoipa_axum::routes!(send_otp))
        .routes(utoipa_axum::routes!(verify_otp));

    let protected = OpenApiRouter::new()
        .routes(utoipa_axum::routes!(update_location))
        .route_layer(axum::middleware::from_fn(
            middleware::buyers_authorization,
        ));

    OpenApiRouter::new().nest("/api/buyer", public.merge(protected))
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct SendOtpReq {
    phone_number: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct SendOtpRes {
    is_existing_user: bool,
    /// Present in development mode only, where no SMS is dispatched.
    #[serde(skip_serializing_if = "Option::is_none")]
    otp: Option<String>,
}

/// Issue a one-time verification code for a phone number.
#[utoipa::path(
    post,
    path = "/send-otp",
    tags = ["Buyer account"],
    request_body = SendOtpReq,
    responses(
        (status = 200, description = "OTP issued", body = StdResponse<SendOtpRes, String>),
        (status = 400, description = "Missing phone number")
    )
)]
async fn send_otp(
    State(state): State<AppState>,
    Json(body): Json<SendOtpReq>,
) -> Result<impl IntoResponse, AppError> {
    let phone_number = body.phone_number.trim().to_string();
    if phone_number.is_empty() {
        return Err(AppError::BadRequest("Phone number is required".to_string()));
    }

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let existing: Option<UserEntity> = users::table
        .filter(users::phone_number.eq(&phone_number))
        .first(conn)
        .await
        .optional()
        .context("Failed to look up user by phone number")?;

    // Overwrites any pending code for this number.
    let code = otp::generate_code();
    state.otp_store.put(&phone_number, &code, OTP_TTL).await;

    let otp_echo = if state.config.dev_mode {
        tracing::info!(%phone_number, %code, "Development mode, skipping SMS dispatch");
        Some(code)
    } else {
        sms::send_otp_sms(state.http_client.clone(), &phone_number, &code).await?;
        None
    };

    Ok(StdResponse {
        data: Some(SendOtpRes {
            is_existing_user: existing.is_some(),
            otp: otp_echo,
        }),
        message: Some("OTP sent successfully"),
    })
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct VerifyOtpReq {
    phone_number: String,
    otp: String,
    /// Required on first verification, when no account exists yet.
    name: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct BuyerProfile {
    id: i32,
    name: String,
    phone_number: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct VerifyOtpRes {
    token: String,
    user: BuyerProfile,
}

/// Verify a one-time code, creating the buyer account on first use.
#[utoipa::path(
    post,
    path = "/verify-otp",
    tags = ["Buyer account"],
    request_body = VerifyOtpReq,
    responses(
        (status = 200, description = "Verified", body = StdResponse<VerifyOtpRes, String>),
        (status = 400, description = "Invalid or expired OTP / name required")
    )
)]
async fn verify_otp(
    State(state): State<AppState>,
    Json(body): Json<VerifyOtpReq>,
) -> Result<impl IntoResponse, AppError> {
    let phone_number = body.phone_number.trim().to_string();

    let pending = state.otp_store.get(&phone_number).await;
    if pending.as_deref() != Some(body.otp.as_str()) {
        return Err(AppError::BadRequest("Invalid or expired OTP".to_string()));
    }

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let existing: Option<UserEntity> = users::table
        .filter(users::phone_number.eq(&phone_number))
        .first(conn)
        .await
        .optional()
        .context("Failed to look up user by phone number")?;

    // Registration needs a name; the pending code survives this failure so
    // the client can retry with one.
    let user = match existing {
        Some(user) => user,
        None => {
            let name = match body.name.as_deref().map(str::trim) {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => {
                    return Err(AppError::BadRequest(
                        "Name is required for registration".to_string(),
                    ));
                }
            };

            diesel::insert_into(users::table)
                .values(CreateUserEntity {
                    name,
                    phone_number: phone_number.clone(),
                    verified: true,
                    latitude: 0.0,
                    longitude: 0.0,
                    address: "Not set".to_string(),
                })
                .returning(UserEntity::as_returning())
                .get_result(conn)
                .await
                .context("Failed to create user")?
        }
    };

    // Single-use: consume only once verification fully succeeded.
    state.otp_store.remove(&phone_number).await;

    let token = jwt::buyer_token(user.id)?;

    Ok(StdResponse {
        data: Some(VerifyOtpRes {
            token,
            user: BuyerProfile {
                id: user.id,
                name: user.name,
                phone_number: user.phone_number,
            },
        }),
        message: Some("Phone number verified successfully"),
    })
}

#[derive(Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct LocationDto {
    latitude: f64,
    longitude: f64,
    address: String,
}

#[derive(Deserialize, ToSchema)]
struct UpdateLocationReq {
    location: LocationDto,
}

#[derive(Serialize, ToSchema)]
struct UpdateLocationRes {
    location: LocationDto,
}

/// Update the authenticated buyer's delivery location.
#[utoipa::path(
    put,
    path = "/update-location",
    tags = ["Buyer account"],
    security(("bearerAuth" = [])),
    request_body = UpdateLocationReq,
    responses(
        (status = 200, description = "Location updated", body = StdResponse<UpdateLocationRes, String>)
    )
)]
async fn update_location(
    State(state): State<AppState>,
    Extension(buyer_id): Extension<i32>,
    Json(body): Json<UpdateLocationReq>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let updated: UserEntity = diesel::update(users::table.find(buyer_id))
        .set((
            users::latitude.eq(body.location.latitude),
            users::longitude.eq(body.location.longitude),
            users::address.eq(&body.location.address),
        ))
        .returning(UserEntity::as_returning())
        .get_result(conn)
        .await
        .map_err(|_| AppError::NotFound("User not found".to_string()))?;

    Ok(StdResponse {
        data: Some(UpdateLocationRes {
            location: LocationDto {
                latitude: updated.latitude,
                longitude: updated.longitude,
                address: updated.address,
            },
        }),
        message: Some("Location updated successfully"),
    })
}
