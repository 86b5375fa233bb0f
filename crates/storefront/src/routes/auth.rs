//! Authentication route handlers.
//!
//! Customers sign in with the commerce API's email/password login. The
//! returned bearer token is kept server-side in the session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::{Layout, set_flash};
use crate::commerce::CommerceError;
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{
    OptionalAuth, clear_current_customer, safe_return_path, set_current_customer,
};
use crate::models::CurrentCustomer;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data. Not `Debug`: it carries the password.
#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

/// Login page query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub layout: Layout,
    pub email: String,
    pub next: String,
    pub error: Option<String>,
}

// =============================================================================
// Routes
// =============================================================================

/// Display the login page. Signed-in customers go straight to `next`.
pub async fn login_page(
    session: Session,
    OptionalAuth(customer): OptionalAuth,
    Query(query): Query<LoginQuery>,
) -> Response {
    let next = safe_return_path(query.next.as_deref()).to_string();
    if customer.is_some() {
        return Redirect::to(&next).into_response();
    }

    LoginTemplate {
        layout: Layout::load(&session, None).await,
        email: String::new(),
        next,
        error: None,
    }
    .into_response()
}

/// Handle login form submission.
///
/// On success the session id is cycled, the customer stored, and the browser
/// sent back to the page that required login.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let next = safe_return_path(form.next.as_deref()).to_string();
    let email = form.email.trim();

    if email.is_empty() || form.password.is_empty() {
        return Ok(login_error(
            &session,
            email,
            next,
            StatusCode::UNPROCESSABLE_ENTITY,
            "Enter your email and password.",
        )
        .await);
    }

    match state
        .commerce()
        .login(email, &form.password)
        .await
    {
        Ok(login) => {
            let customer = CurrentCustomer {
                id: login.user.id,
                email: login.user.email,
                name: login.user.name,
                token: login.token,
            };
            set_current_customer(&session, &customer).await?;
            set_sentry_user(&customer.id, Some(&customer.email));
            tracing::info!(user_id = %customer.id, "Customer signed in");
            Ok(Redirect::to(&next).into_response())
        }
        Err(CommerceError::Unauthorized) => {
            tracing::info!("Login rejected");
            Ok(login_error(
                &session,
                email,
                next,
                StatusCode::UNAUTHORIZED,
                "Invalid email or password.",
            )
            .await)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Login failed");
            Ok(login_error(
                &session,
                email,
                next,
                StatusCode::BAD_GATEWAY,
                e.user_message()
                    .unwrap_or("Sign-in is unavailable right now. Please try again."),
            )
            .await)
        }
    }
}

async fn login_error(
    session: &Session,
    email: &str,
    next: String,
    status: StatusCode,
    message: &str,
) -> Response {
    let page = LoginTemplate {
        layout: Layout::load(session, None).await,
        email: email.to_string(),
        next,
        error: Some(message.to_string()),
    };
    (status, page).into_response()
}

/// Handle logout: drop the cached cart and the customer, keep the session.
#[instrument(skip(state, session, customer))]
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(customer): OptionalAuth,
) -> Result<Response> {
    if let Some(customer) = customer {
        state.carts().forget(customer.id).await;
        tracing::info!(user_id = %customer.id, "Customer signed out");
    }
    clear_current_customer(&session).await?;
    clear_sentry_user();
    set_flash(&session, "You have been signed out.").await;
    Ok(Redirect::to("/").into_response())
}
