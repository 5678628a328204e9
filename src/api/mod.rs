pub mod sms;

pub struct ApiUrls;

impl ApiUrls {
    pub fn get_sms_gateway_url() -> String {
        std::env::var("SMS_GATEWAY_URL")
            .unwrap_or("http://localhost:3000/sms-gateway".to_string())
    }
}
