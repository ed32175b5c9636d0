use axum::Router;
use tokio::net::TcpListener;

use crate::config::{Config, DEFAULT_ENDPOINT, DEFAULT_REGION_ID};

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

pub fn test_config() -> Config {
    Config {
        access_key_id: "LTAIexample".to_string(),
        access_key_secret: "secret".to_string(),
        region_id: DEFAULT_REGION_ID.to_string(),
        domain_name: "example.com".to_string(),
        subdomains: vec!["home".to_string(), "office".to_string()],
        endpoint: DEFAULT_ENDPOINT.to_string(),
        log_level: "info".to_string(),
    }
}
