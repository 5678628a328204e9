use std::sync::Arc;

use crate::{config::Config, db::DbPool, otp::OtpStore, relay::NotificationRelay};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: DbPool,
    pub http_client: reqwest::Client,
    pub otp_store: Arc<dyn OtpStore>,
    pub relay: NotificationRelay,
    pub config: Arc<Config>,
}
