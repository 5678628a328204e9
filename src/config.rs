use anyhow::{Context, Result};

/// Runtime configuration resolved once at startup from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub uploads_dir: String,
    /// Anything other than `APP_ENV=production` counts as development mode:
    /// OTP codes are logged and echoed in the send-otp response instead of
    /// being dispatched through the SMS gateway.
    pub dev_mode: bool,
    pub jwt_secret: String,
    pub admin_email: String,
    pub admin_password: String,
    pub delivery_charge: f32,
    pub platform_fee: f32,
}

pub fn load() -> Result<Config> {
    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL environment variable is not set")?;

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);

    let dev_mode = std::env::var("APP_ENV")
        .map(|env| env != "production")
        .unwrap_or(true);

    let jwt_secret = resolve_jwt_secret(std::env::var("JWT_SECRET").ok(), dev_mode)?;

    Ok(Config {
        database_url,
        port,
        uploads_dir: std::env::var("UPLOADS_DIR").unwrap_or_else(|_| "uploads".to_string()),
        dev_mode,
        jwt_secret,
        admin_email: std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@medimart.local".to_string()),
        admin_password: std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "changeme".to_string()),
        delivery_charge: std::env::var("DELIVERY_CHARGE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(40.0),
        platform_fee: std::env::var("PLATFORM_FEE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5.0),
    })
}

/// A missing or empty `JWT_SECRET` is a startup error in production; in
/// development a fixed fallback keeps local runs working.
fn resolve_jwt_secret(raw: Option<String>, dev_mode: bool) -> Result<String> {
    match raw {
        Some(secret) if !secret.is_empty() => Ok(secret),
        _ if dev_mode => {
            tracing::warn!("JWT_SECRET not set, using development fallback key");
            Ok("medimart-development-only-secret-key".to_string())
        }
        _ => anyhow::bail!("JWT_SECRET environment variable must be set in production"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_secret_is_kept() {
        let secret = resolve_jwt_secret(Some("s3cret".to_string()), false).unwrap();
        assert_eq!(secret, "s3cret");
    }

    #[test]
    fn development_falls_back_when_unset() {
        assert!(resolve_jwt_secret(None, true).is_ok());
        assert!(resolve_jwt_secret(Some(String::new()), true).is_ok());
    }

    #[test]
    fn production_fails_fast_when_unset() {
        assert!(resolve_jwt_secret(None, false).is_err());
        assert!(resolve_jwt_secret(Some(String::new()), false).is_err());
    }
}
