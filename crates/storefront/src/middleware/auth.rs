//! Authentication middleware and extractors.
//!
//! Provides extractors for requiring a signed-in customer in route handlers.

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{HeaderValue, StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{CurrentCustomer, session_keys};

/// Extractor that requires a signed-in customer.
///
/// If the customer is not logged in, returns a redirect to the login page
/// that comes back to the requested page afterwards.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(customer): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", customer.email)
/// }
/// ```
pub struct RequireAuth(pub CurrentCustomer);

/// Error returned when authentication is required but the customer is not logged in.
pub enum AuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin(String),
    /// Full-page redirect for HTMX requests, which would otherwise swap the
    /// login page into a fragment.
    HxRedirect(String),
    /// Unauthorized response (for API requests).
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin(location) => Redirect::to(&location).into_response(),
            Self::HxRedirect(location) => {
                let mut response = StatusCode::UNAUTHORIZED.into_response();
                if let Ok(value) = HeaderValue::from_str(&location) {
                    response.headers_mut().insert("HX-Redirect", value);
                }
                response
            }
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

/// Login URL that returns to `path` after sign-in.
#[must_use]
pub fn login_url(path: &str) -> String {
    if path.is_empty() || path == "/" {
        "/auth/login".to_string()
    } else {
        format!("/auth/login?next={}", urlencoding::encode(path))
    }
}

/// Only same-site relative paths are accepted as post-login targets.
#[must_use]
pub fn safe_return_path(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => "/",
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::Unauthorized)?;

        let customer: Option<CurrentCustomer> = session
            .get(session_keys::CURRENT_CUSTOMER)
            .await
            .ok()
            .flatten();

        customer.map(Self).ok_or_else(|| {
            // Nested routers see the URI with their prefix stripped.
            let uri = parts
                .extensions
                .get::<OriginalUri>()
                .map_or(&parts.uri, |OriginalUri(uri)| uri);
            let path = uri.path();
            if path.starts_with("/api/") {
                AuthRejection::Unauthorized
            } else if parts.headers.contains_key("hx-request") {
                // Fragments come back to the page that embedded them.
                let page = parts
                    .headers
                    .get("hx-current-url")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|url| url::Url::parse(url).ok())
                    .map_or_else(|| path.to_string(), |url| url.path().to_string());
                AuthRejection::HxRedirect(login_url(&page))
            } else if parts.method == axum::http::Method::GET {
                let target = uri.path_and_query().map_or(path, |pq| pq.as_str());
                AuthRejection::RedirectToLogin(login_url(target))
            } else {
                AuthRejection::RedirectToLogin(login_url(""))
            }
        })
    }
}

/// Extractor that optionally gets the current customer.
///
/// Unlike `RequireAuth`, this does not reject the request if the customer is not logged in.
pub struct OptionalAuth(pub Option<CurrentCustomer>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let customer = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentCustomer>(session_keys::CURRENT_CUSTOMER)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(customer))
    }
}

/// Helper to set the current customer in the session.
///
/// Cycles the session id first so a pre-login id can't be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_customer(
    session: &Session,
    customer: &CurrentCustomer,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session
        .insert(session_keys::CURRENT_CUSTOMER, customer)
        .await
}

/// Helper to clear the current customer from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_customer(
    session: &Session,
) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentCustomer>(session_keys::CURRENT_CUSTOMER)
        .await?;
    session
        .remove::<serde_json::Value>(session_keys::CHECKOUT_SHIPPING)
        .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, header};
    use tower::ServiceExt;
    use wiremock::MockServer;

    use super::*;
    use crate::routes::tests::test_app;

    async fn login_redirect_for(uri: &str) -> String {
        let server = MockServer::start().await;
        let response = test_app(&server)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_nested_pages_keep_full_return_path() {
        assert_eq!(login_redirect_for("/cart").await, "/auth/login?next=%2Fcart");
        assert_eq!(
            login_redirect_for("/checkout").await,
            "/auth/login?next=%2Fcheckout"
        );
        assert_eq!(
            login_redirect_for("/checkout/payment").await,
            "/auth/login?next=%2Fcheckout%2Fpayment"
        );
        assert_eq!(
            login_redirect_for("/account/orders?page=2").await,
            "/auth/login?next=%2Faccount%2Forders%3Fpage%3D2"
        );
    }

    #[tokio::test]
    async fn test_htmx_request_redirects_whole_page() {
        let server = MockServer::start().await;
        let response = test_app(&server)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/cart/add")
                    .header("hx-request", "true")
                    .header("hx-current-url", "http://localhost:3000/products/3")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get("hx-redirect").unwrap(),
            "/auth/login?next=%2Fproducts%2F3"
        );
    }

    #[test]
    fn test_login_url_keeps_return_path() {
        assert_eq!(login_url("/"), "/auth/login");
        assert_eq!(login_url("/cart"), "/auth/login?next=%2Fcart");
    }

    #[test]
    fn test_safe_return_path_rejects_offsite() {
        assert_eq!(safe_return_path(Some("/account/orders")), "/account/orders");
        assert_eq!(safe_return_path(Some("//evil.example")), "/");
        assert_eq!(safe_return_path(Some("https://evil.example")), "/");
        assert_eq!(safe_return_path(Some("/\\evil.example")), "/");
        assert_eq!(safe_return_path(None), "/");
    }
}
