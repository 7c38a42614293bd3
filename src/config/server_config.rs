use std::env;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub gateway_url: String,
    pub gateway_api_key: Option<String>,
    pub webhook_url: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            gateway_url: env::var("GATEWAY_URL").expect("GATEWAY_URL must be set"),
            gateway_api_key: env::var("GATEWAY_API_KEY").ok().filter(|v| !v.is_empty()),
            webhook_url: env::var("WEBHOOK_URL").ok().filter(|v| !v.is_empty()),
        }
    }
}
