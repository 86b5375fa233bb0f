//! Checkout route handlers.
//!
//! Checkout is two steps. The shipping form is validated server-side and the
//! validated details are stashed in the session; the payment page reads them
//! back together with the current cart. Payment itself is handled outside
//! the storefront.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use rigbay_core::cart::CartState;
use rigbay_core::checkout::{
    CheckoutError, CheckoutSummary, DISTRICTS, FieldErrors, ShippingDetails, ShippingForm,
};
use rigbay_core::CurrencyCode;
use tower_sessions::Session;
use tracing::instrument;

use super::cart::CartItemView;
use super::{Layout, money, set_flash};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::{CurrentCustomer, session_keys};
use crate::state::AppState;

/// Order totals display data for templates.
#[derive(Clone)]
pub struct SummaryView {
    pub item_count: u32,
    pub subtotal: String,
    pub shipping: String,
    pub total: String,
    pub free_shipping: bool,
}

impl SummaryView {
    fn new(summary: &CheckoutSummary, currency: CurrencyCode) -> Self {
        Self {
            item_count: summary.item_count,
            subtotal: money(summary.subtotal, currency),
            shipping: money(summary.shipping, currency),
            total: money(summary.total, currency),
            free_shipping: summary.is_free_shipping(),
        }
    }
}

/// Shipping form page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/shipping.html")]
pub struct ShippingTemplate {
    pub layout: Layout,
    pub form: ShippingForm,
    pub errors: FieldErrors,
    pub districts: &'static [&'static str],
    pub summary: SummaryView,
}

/// Payment summary page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/payment.html")]
pub struct PaymentTemplate {
    pub layout: Layout,
    pub shipping: ShippingDetails,
    pub items: Vec<CartItemView>,
    pub summary: SummaryView,
}

/// The customer's cart if it can be checked out, else where to send them.
async fn checkout_cart(
    state: &AppState,
    session: &Session,
    customer: &CurrentCustomer,
) -> std::result::Result<(CartState, CheckoutSummary), Response> {
    let cart = match state
        .carts()
        .refresh(state.commerce(), customer.id, &customer.token)
        .await
    {
        Ok(cart) => cart,
        Err(e) => {
            tracing::warn!(error = %e, "Cart refresh failed during checkout");
            state.carts().cached(customer.id).await.unwrap_or_default()
        }
    };

    match CheckoutSummary::for_checkout(&cart, &state.shipping()) {
        Ok(summary) => Ok((cart, summary)),
        Err(e) => {
            let notice = match e {
                CheckoutError::StockIssues { .. } => {
                    "Some items in your cart exceed available stock. Update them to continue."
                }
                _ => "Your cart is empty.",
            };
            set_flash(session, notice).await;
            Err(Redirect::to("/cart").into_response())
        }
    }
}

async fn stashed_shipping(session: &Session) -> Option<ShippingDetails> {
    session
        .get::<ShippingDetails>(session_keys::CHECKOUT_SHIPPING)
        .await
        .ok()
        .flatten()
}

/// Display the shipping form, prefilled from an earlier attempt.
#[instrument(skip(state, session, customer), fields(user_id = %customer.id))]
pub async fn shipping_page(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(customer): RequireAuth,
) -> Response {
    let (_, summary) = match checkout_cart(&state, &session, &customer).await {
        Ok(found) => found,
        Err(redirect) => return redirect,
    };

    let form = stashed_shipping(&session).await.map_or_else(
        || ShippingForm {
            email: customer.email.clone(),
            ..ShippingForm::default()
        },
        |details| ShippingForm::from(&details),
    );

    ShippingTemplate {
        layout: Layout::load(&session, Some(&customer)).await,
        form,
        errors: FieldErrors::default(),
        districts: &DISTRICTS,
        summary: SummaryView::new(&summary, state.currency()),
    }
    .into_response()
}

/// Validate the shipping form.
///
/// Invalid input re-renders the form with every field error at once.
#[instrument(skip(state, session, customer, form), fields(user_id = %customer.id))]
pub async fn submit_shipping(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(customer): RequireAuth,
    Form(form): Form<ShippingForm>,
) -> Result<Response> {
    let (_, summary) = match checkout_cart(&state, &session, &customer).await {
        Ok(found) => found,
        Err(redirect) => return Ok(redirect),
    };

    match form.validate() {
        Ok(details) => {
            session
                .insert(session_keys::CHECKOUT_SHIPPING, &details)
                .await?;
            Ok(Redirect::to("/checkout/payment").into_response())
        }
        Err(errors) => {
            tracing::debug!(fields = errors.len(), "Shipping form rejected");
            let page = ShippingTemplate {
                layout: Layout::load(&session, Some(&customer)).await,
                form,
                errors,
                districts: &DISTRICTS,
                summary: SummaryView::new(&summary, state.currency()),
            };
            Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response())
        }
    }
}

/// Display the payment summary: stashed shipping details and current totals.
#[instrument(skip(state, session, customer), fields(user_id = %customer.id))]
pub async fn payment(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(customer): RequireAuth,
) -> Response {
    let Some(shipping) = stashed_shipping(&session).await else {
        return Redirect::to("/checkout").into_response();
    };
    let (cart, summary) = match checkout_cart(&state, &session, &customer).await {
        Ok(found) => found,
        Err(redirect) => return redirect,
    };
    let currency = state.currency();

    PaymentTemplate {
        layout: Layout::load(&session, Some(&customer)).await,
        shipping,
        items: cart
            .items()
            .iter()
            .map(|item| CartItemView::new(item, currency))
            .collect(),
        summary: SummaryView::new(&summary, currency),
    }
    .into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, header};
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::routes::cart::tests::{cart_json, login};
    use crate::routes::tests::{body_text, test_app};

    const VALID_FORM: &str = "first_name=Nimal&last_name=Perera&email=nimal%40rigbay.lk\
        &phone=0771234567&address_line1=12+Galle+Road&city=Colombo&district=Colombo\
        &postal_code=00300";

    async fn mount_cart(server: &MockServer, quantity: u32, stock: i64) {
        Mock::given(method("GET"))
            .and(path("/api/cart"))
            .respond_with(ResponseTemplate::new(200).set_body_json(cart_json(quantity, stock)))
            .mount(server)
            .await;
    }

    async fn post_form(app: &Router, cookie: &str, body: &str) -> Response {
        app.clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/checkout")
                    .header(header::COOKIE, cookie)
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn get(app: &Router, cookie: &str, uri: &str) -> Response {
        app.clone()
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_shipping_form_prefills_email() {
        let server = MockServer::start().await;
        let app = test_app(&server);
        let cookie = login(&app, &server).await;
        mount_cart(&server, 1, 5).await;

        let response = get(&app, &cookie, "/checkout").await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("nimal@rigbay.lk"));
        assert!(html.contains("Nuwara Eliya"));
    }

    #[tokio::test]
    async fn test_stock_issues_send_back_to_cart() {
        let server = MockServer::start().await;
        let app = test_app(&server);
        let cookie = login(&app, &server).await;
        mount_cart(&server, 3, 1).await;

        let response = get(&app, &cookie, "/checkout").await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/cart");
    }

    #[tokio::test]
    async fn test_invalid_form_lists_every_error() {
        let server = MockServer::start().await;
        let app = test_app(&server);
        let cookie = login(&app, &server).await;
        mount_cart(&server, 1, 5).await;

        let response = post_form(&app, &cookie, "first_name=N&phone=123&district=Narnia").await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let html = body_text(response).await;
        assert!(html.contains("First name must be 2-50 characters"));
        assert!(html.contains("Last name is required"));
    }

    #[tokio::test]
    async fn test_payment_requires_shipping_details() {
        let server = MockServer::start().await;
        let app = test_app(&server);
        let cookie = login(&app, &server).await;
        mount_cart(&server, 1, 5).await;

        let response = get(&app, &cookie, "/checkout/payment").await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/checkout");
    }

    #[tokio::test]
    async fn test_valid_form_reaches_payment_summary() {
        let server = MockServer::start().await;
        let app = test_app(&server);
        let cookie = login(&app, &server).await;
        mount_cart(&server, 2, 5).await;

        let response = post_form(&app, &cookie, VALID_FORM).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/checkout/payment"
        );

        let response = get(&app, &cookie, "/checkout/payment").await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Nimal Perera"));
        assert!(html.contains("12 Galle Road"));
        assert!(html.contains("Rs. 420,000.00"));
    }
}
