//! HTTP middleware (CORS, 404 handler)

use axum::Json;
use axum::extract::Request;
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::IntoResponse;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::core::config::is_all_interfaces;

/// Allowed origins configuration
#[derive(Debug, Clone)]
pub struct AllowedOrigins {
    origins: Vec<String>,
}

impl AllowedOrigins {
    /// Create allowed origins from host and port configuration
    pub fn new(host: &str, port: u16) -> Self {
        let mut origins = Vec::new();
        let dev_port = port.saturating_add(1);

        // Binding to all interfaces or loopback allows both loopback spellings
        let base_hosts: Vec<&str> =
            if is_all_interfaces(host) || host == "127.0.0.1" || host == "localhost" {
                vec!["localhost", "127.0.0.1"]
            } else {
                vec![host]
            };

        for h in &base_hosts {
            origins.push(format!("http://{}:{}", h, port));
            origins.push(format!("http://{}:{}", h, dev_port));
            origins.push(format!("http://{}", h));
        }

        Self { origins }
    }

    /// Check if an origin is allowed
    pub fn is_allowed(&self, origin: &str) -> bool {
        self.origins.iter().any(|o| o == origin)
    }

    fn as_header_values(&self) -> Vec<HeaderValue> {
        self.origins.iter().filter_map(|o| o.parse().ok()).collect()
    }
}

/// Create CORS layer (read-only API)
pub fn cors(allowed: &AllowedOrigins) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed.as_header_values()))
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::ORIGIN,
            header::CACHE_CONTROL,
        ])
}

/// Handle unknown routes with logging
pub async fn handle_404(req: Request) -> impl IntoResponse {
    let method = req.method().clone();
    let uri = req.uri().clone();

    if tracing::enabled!(tracing::Level::DEBUG) {
        let mut headers_map = serde_json::Map::new();
        for (name, value) in req.headers() {
            if let Ok(value_str) = value.to_str() {
                headers_map.insert(
                    name.to_string(),
                    serde_json::Value::String(value_str.to_string()),
                );
            }
        }

        let log_entry = serde_json::json!({
            "status": 404,
            "method": method.to_string(),
            "url": uri.to_string(),
            "headers": headers_map,
        });

        if let Ok(pretty) = serde_json::to_string_pretty(&log_entry) {
            tracing::debug!("[404]\n{}", pretty);
        }
    }

    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": format!("Route not found: {} {}", method, uri.path()) })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loopback_origins() {
        let allowed = AllowedOrigins::new("127.0.0.1", 5480);
        assert!(allowed.is_allowed("http://localhost:5480"));
        assert!(allowed.is_allowed("http://127.0.0.1:5481"));
        assert!(allowed.is_allowed("http://localhost"));
        assert!(!allowed.is_allowed("http://evil.example:5480"));
    }

    #[test]
    fn test_all_interfaces_uses_loopback() {
        let allowed = AllowedOrigins::new("0.0.0.0", 8080);
        assert!(allowed.is_allowed("http://localhost:8080"));
        assert!(!allowed.is_allowed("http://0.0.0.0:8080"));
    }

    #[test]
    fn test_named_host() {
        let allowed = AllowedOrigins::new("api.internal", 80);
        assert!(allowed.is_allowed("http://api.internal:80"));
        assert!(allowed.is_allowed("http://api.internal"));
        assert!(!allowed.is_allowed("http://localhost:80"));
    }
}
