use anyhow::Context;
use reqwest::Client;
use serde::Serialize;

use crate::{api::ApiUrls, app_error::AppError};

#[derive(Serialize)]
struct SmsDispatch<'a> {
    to: &'a str,
    body: String,
}

/// Fire-and-forget dispatch of the verification code through the external
/// SMS gateway. A gateway failure propagates to the caller; no retry.
pub async fn send_otp_sms(client: Client, phone_number: &str, code: &str) -> Result<(), AppError> {
    let url = ApiUrls::get_sms_gateway_url();
    let response = client
        .post(format!("{}/messages", url))
        .json(&SmsDispatch {
            to: phone_number,
            body: format!("Your Medimart verification code is {code}. Valid for 5 minutes."),
        })
        .send()
        .await
        .map_err(|_| AppError::ServiceUnreachable("SmsGateway".into()))?;

    response
        .error_for_status()
        .context("SMS gateway rejected the dispatch")?;

    Ok(())
}
