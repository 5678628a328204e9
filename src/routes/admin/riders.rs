use anyhow::Context;
use axum::{
    extract::{Multipart, Path, State},
    response::IntoResponse,
};
use diesel::{
    ExpressionMethods, QueryDsl, SelectableHelper,
    result::{DatabaseErrorKind, Error as DieselError},
};
use diesel_async::RunQueryDsl;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    middleware,
    models::{CreateRiderEntity, RiderEntity},
    schema::riders,
    storage,
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/api/admin",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(create_rider))
            .routes(utoipa_axum::routes!(list_riders))
            .routes(utoipa_axum::routes!(delete_rider))
            .route_layer(axum::middleware::from_fn(
                middleware::admins_authorization,
            )),
    )
}

/// Register a delivery rider (multipart: name, phoneNumber, identityPicture).
#[utoipa::path(
    post,
    path = "/riders",
    tags = ["Admin riders"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Rider created", body = StdResponse<RiderEntity, String>),
        (status = 400, description = "Missing fields or phone already registered")
    )
)]
async fn create_rider(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut name: Option<String> = None;
    let mut phone_number: Option<String> = None;
    let mut picture: Option<(Vec<u8>, &'static str)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::BadRequest("Malformed multipart body".to_string()))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "name" => name = Some(field.text().await.unwrap_or_default()),
            "phoneNumber" => phone_number = Some(field.text().await.unwrap_or_default()),
            "identityPicture" => {
                let ext = storage::extension_for(field.content_type());
                let bytes = field.bytes().await.map_err(|_| {
                    AppError::BadRequest("Failed to read identity picture".to_string())
                })?;
                picture = Some((bytes.to_vec(), ext));
            }
            _ => {}
        }
    }

    let name = name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Rider name is required".to_string()))?;
    let phone_number = phone_number
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Rider phone number is required".to_string()))?;
    let (bytes, ext) = picture
        .ok_or_else(|| AppError::BadRequest("identityPicture file is required".to_string()))?;

    let identity_picture = storage::save_upload(&state.config.uploads_dir, "riders", &bytes, ext)?;

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let rider: RiderEntity = diesel::insert_into(riders::table)
        .values(CreateRiderEntity {
            name,
            phone_number,
            identity_picture,
        })
        .returning(RiderEntity::as_returning())
        .get_result(conn)
        .await
        .map_err(|err| match err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                AppError::BadRequest("Phone number already registered".to_string())
            }
            other => AppError::Other(other.into()),
        })?;

    Ok(StdResponse {
        data: Some(rider),
        message: Some("Rider created successfully"),
    })
}

/// List the delivery fleet.
#[utoipa::path(
    get,
    path = "/riders",
    tags = ["Admin riders"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Riders", body = StdResponse<Vec<RiderEntity>, String>)
    )
)]
async fn list_riders(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let fleet: Vec<RiderEntity> = riders::table
        .order_by(riders::created_at.desc())
        .get_results(conn)
        .await
        .context("Failed to get riders")?;

    Ok(StdResponse {
        data: Some(fleet),
        message: Some("Get riders successfully"),
    })
}

/// Remove a rider. Orders it delivered keep their history; the linkage
/// column nulls out.
#[utoipa::path(
    delete,
    path = "/riders/{id}",
    tags = ["Admin riders"],
    security(("bearerAuth" = [])),
    params(("id" = i32, Path, description = "Rider ID")),
    responses(
        (status = 200, description = "Deleted", body = StdResponse<String, String>),
        (status = 404, description = "Rider not found")
    )
)]
async fn delete_rider(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let deleted = diesel::delete(riders::table.find(id))
        .execute(conn)
        .await
        .context("Failed to delete rider")?;

    if deleted == 0 {
        return Err(AppError::NotFound("Rider not found".to_string()));
    }

    Ok(StdResponse::<String, _> {
        data: None,
        message: Some("Rider deleted successfully"),
    })
}
