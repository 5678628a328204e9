use anyhow::Context;
use axum::{Json, extract::State, response::IntoResponse};
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl};
use diesel_async::RunQueryDsl;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    auth::{jwt, password},
    models::AdminEntity,
    schema::admins,
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/api/admin",
        OpenApiRouter::new().routes(utoipa_axum::routes!(login)),
    )
}

#[derive(Deserialize, ToSchema)]
struct LoginReq {
    email: String,
    password: String,
}

#[derive(Serialize, ToSchema)]
struct LoginRes {
    token: String,
}

/// Admin login; the returned token expires after 24 hours.
#[utoipa::path(
    post,
    path = "/login",
    tags = ["Admin"],
    request_body = LoginReq,
    responses(
        (status = 200, description = "Logged in", body = StdResponse<LoginRes, String>),
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

    let admin: Option<AdminEntity> = admins::table
        .filter(admins::email.eq(body.email.trim().to_lowercase()))
        .first(conn)
        .await
        .optional()
        .context("Failed to look up admin")?;

    let admin =
        admin.ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

    let valid = password::verify_password(&body.password, &admin.password_hash)
        .map_err(|e| AppError::Other(anyhow::anyhow!("Password verification failed: {e}")))?;
    if !valid {
        return Err(AppError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    let token = jwt::admin_token(admin.id)?;

    Ok(StdResponse {
        data: Some(LoginRes { token }),
        message: Some("Logged in successfully"),
    })
}
