//! Role-gated authorization layers.
//!
//! Each protected route group is wrapped with the middleware for its role;
//! on success the identity id is attached as an `Extension<i32>` for handlers.

use axum::{extract::Request, http::header, middleware::Next, response::Response};

use crate::{
    app_error::AppError,
    auth::{Role, jwt},
};

fn authorize(req: &mut Request, expected: Role) -> Result<(), AppError> {
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

    let token = header_value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Malformed Authorization header".to_string()))?;

    let claims = jwt::decode_token(token)?;
    if claims.role != expected {
        return Err(AppError::Unauthorized(
            "Token role does not permit this resource".to_string(),
        ));
    }

    req.extensions_mut().insert(claims.sub);
    Ok(())
}

pub async fn buyers_authorization(mut req: Request, next: Next) -> Result<Response, AppError> {
    authorize(&mut req, Role::Buyer)?;
    Ok(next.run(req).await)
}

pub async fn sellers_authorization(mut req: Request, next: Next) -> Result<Response, AppError> {
    authorize(&mut req, Role::Seller)?;
    Ok(next.run(req).await)
}

pub async fn admins_authorization(mut req: Request, next: Next) -> Result<Response, AppError> {
    authorize(&mut req, Role::Admin)?;
    Ok(next.run(req).await)
}
