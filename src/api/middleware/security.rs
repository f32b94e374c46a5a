use crate::core::config::SecurityConfig;
use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};

/// Security headers middleware
///
/// Adds to every response:
/// - X-Content-Type-Options: nosniff
/// - X-Frame-Options: DENY
/// - Content-Security-Policy locked down for a JSON API that also serves images
/// - Strict-Transport-Security when enabled in the configuration
pub async fn security_headers_middleware(
    State(config): State<SecurityHeadersConfig>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    let (mut parts, body) = response.into_parts();

    parts.headers.insert(
        "X-Content-Type-Options",
        HeaderValue::from_static("nosniff"),
    );
    parts.headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    parts.headers.insert(
        "Content-Security-Policy",
        HeaderValue::from_static("default-src 'none'; img-src 'self'; frame-ancestors 'none';"),
    );

    if config.enable_hsts {
        let hsts_value = format!("max-age={}; includeSubDomains", config.hsts_max_age);
        parts.headers.insert(
            "Strict-Transport-Security",
            HeaderValue::from_str(&hsts_value)
                .unwrap_or_else(|_| HeaderValue::from_static("max-age=31536000; includeSubDomains")),
        );
    }

    Response::from_parts(parts, body)
}

/// Configuration for security headers
#[derive(Clone, Debug)]
pub struct SecurityHeadersConfig {
    pub enable_hsts: bool,
    /// HSTS max-age in seconds
    pub hsts_max_age: u64,
}

impl SecurityHeadersConfig {
    pub fn new(enable_hsts: bool, hsts_max_age: u64) -> Self {
        Self {
            enable_hsts,
            hsts_max_age,
        }
    }
}

impl From<&SecurityConfig> for SecurityHeadersConfig {
    fn from(config: &SecurityConfig) -> Self {
        Self::new(config.enable_hsts, config.hsts_max_age)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, middleware, routing::get, Router};
    use tower::util::ServiceExt;

    async fn headers_for(config: SecurityHeadersConfig) -> axum::http::HeaderMap {
        let app = Router::new()
            .route("/test", get(|| async { "OK" }))
            .layer(middleware::from_fn_with_state(config, security_headers_middleware));

        let request = axum::http::Request::builder()
            .uri("/test")
            .body(Body::empty())
            .unwrap();
        app.oneshot(request).await.unwrap().headers().clone()
    }

    #[tokio::test]
    async fn test_basic_headers_present() {
        let headers = headers_for(SecurityHeadersConfig::new(false, 0)).await;

        assert_eq!(headers.get("X-Content-Type-Options").unwrap(), "nosniff");
        assert_eq!(headers.get("X-Frame-Options").unwrap(), "DENY");
        let csp = headers.get("Content-Security-Policy").unwrap().to_str().unwrap();
        assert!(csp.contains("frame-ancestors 'none'"));
        assert!(!headers.contains_key("Strict-Transport-Security"));
    }

    #[tokio::test]
    async fn test_hsts_uses_configured_max_age() {
        let headers = headers_for(SecurityHeadersConfig::new(true, 86400)).await;

        let hsts = headers.get("Strict-Transport-Security").unwrap().to_str().unwrap();
        assert!(hsts.contains("max-age=86400"));
        assert!(hsts.contains("includeSubDomains"));
    }
}
