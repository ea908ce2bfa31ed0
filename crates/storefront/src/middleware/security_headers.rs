//! Security headers middleware for XSS, clickjacking, and isolation protection.
//!
//! Everything is locked down except what the payment gateway needs: its
//! origins may serve scripts, frames and XHR.

use axum::{
    extract::{Request, State},
    http::{
        HeaderName, HeaderValue,
        header::{
            CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

use crate::state::AppState;

/// Build the Content-Security-Policy for the given gateway origins.
///
/// ```text
/// default-src 'none';
/// script-src 'self' <gateway>;
/// style-src 'self';
/// img-src 'self' https: data:;
/// connect-src 'self' <gateway>;
/// frame-src <gateway>;
/// ...
/// ```
#[must_use]
pub fn content_security_policy(gateway_origins: &[String]) -> String {
    let gateway = gateway_origins.join(" ");
    let frame_src = if gateway.is_empty() {
        "'none'".to_string()
    } else {
        gateway.clone()
    };

    format!(
        "default-src 'none'; \
         script-src 'self' {gateway}; \
         style-src 'self'; \
         font-src 'self'; \
         img-src 'self' https: data:; \
         connect-src 'self' {gateway}; \
         frame-src {frame_src}; \
         object-src 'none'; \
         base-uri 'self'; \
         form-action 'self'; \
         frame-ancestors 'none'"
    )
}

/// Add security headers to all responses.
///
/// Headers applied:
/// - `X-Frame-Options: DENY` - Prevent clickjacking
/// - `X-Content-Type-Options: nosniff` - Prevent MIME sniffing
/// - `Referrer-Policy: strict-origin-when-cross-origin` - The gateway checks the referring origin
/// - `Content-Security-Policy` - See [`content_security_policy`]
/// - `Permissions-Policy` - Deny sensitive features, allow `payment` for the gateway
/// - `Cache-Control: no-store, max-age=0` - Cart and checkout pages are per-visitor
/// - `Cross-Origin-Opener-Policy: same-origin-allow-popups` - The widget may open popups
/// - `X-DNS-Prefetch-Control: off`
pub async fn security_headers_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(
        REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    match HeaderValue::from_str(&content_security_policy(
        &state.config().payment.gateway_origins,
    )) {
        Ok(csp) => {
            headers.insert(CONTENT_SECURITY_POLICY, csp);
        }
        Err(e) => tracing::error!(error = %e, "Gateway origins produce an invalid CSP header"),
    }

    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(
            "accelerometer=(), \
             camera=(), \
             display-capture=(), \
             geolocation=(), \
             gyroscope=(), \
             magnetometer=(), \
             microphone=(), \
             payment=(self), \
             usb=()",
        ),
    );

    headers.insert(
        HeaderName::from_static("cache-control"),
        HeaderValue::from_static("no-store, max-age=0"),
    );

    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin-allow-popups"),
    );

    headers.insert(
        HeaderName::from_static("x-dns-prefetch-control"),
        HeaderValue::from_static("off"),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_origins_are_allowed() {
        let csp = content_security_policy(&["https://checkout.razorpay.com".to_string()]);
        assert!(csp.contains("script-src 'self' https://checkout.razorpay.com;"));
        assert!(csp.contains("frame-src https://checkout.razorpay.com;"));
        assert!(csp.contains("connect-src 'self' https://checkout.razorpay.com;"));
    }

    #[test]
    fn test_no_gateway_means_no_frames() {
        let csp = content_security_policy(&[]);
        assert!(csp.contains("frame-src 'none';"));
        assert!(!csp.contains("unsafe-inline"));
    }
}
