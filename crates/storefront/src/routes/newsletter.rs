//! Newsletter subscription route handlers.
//!
//! Subscribing creates a Shopify customer with marketing consent. An email
//! that is already registered counts as subscribed. Failures are reported
//! inline; the response status is always 200.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json,
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
};
use rand::{Rng, distr::Alphanumeric};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use beyond_wellness_core::Email;

use crate::context::LoaderContext;
use crate::error::add_breadcrumb;

/// Length of the throwaway password newsletter-only customers get.
const PASSWORD_LENGTH: usize = 32;

/// Newsletter subscription form data.
#[derive(Debug, Deserialize)]
pub struct SubscribeForm {
    #[serde(default)]
    pub email: String,
}

/// Outcome reported to JSON clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscribeResult {
    pub success: bool,
    pub error: Option<String>,
}

/// Success fragment template (replaces the form).
#[derive(Template, WebTemplate)]
#[template(path = "newsletter/subscribe_success.html")]
pub struct SubscribeSuccessTemplate {
    pub email: String,
}

/// Error fragment template (re-renders the form with the message).
#[derive(Template, WebTemplate)]
#[template(path = "newsletter/subscribe_error.html")]
pub struct SubscribeErrorTemplate {
    pub message: String,
    pub email: String,
}

/// Subscribe to the newsletter.
#[instrument(skip_all)]
pub async fn subscribe(
    ctx: LoaderContext,
    headers: HeaderMap,
    Form(form): Form<SubscribeForm>,
) -> Response {
    let result = create_subscriber(&ctx, &form.email).await;
    let email = form.email.trim().to_string();

    if wants_json(&headers) {
        return Json(result).into_response();
    }

    match result.error {
        None => SubscribeSuccessTemplate { email }.into_response(),
        Some(message) => SubscribeErrorTemplate { message, email }.into_response(),
    }
}

async fn create_subscriber(ctx: &LoaderContext, input: &str) -> SubscribeResult {
    let email = match Email::parse(&input.trim().to_lowercase()) {
        Ok(email) => email,
        Err(e) => {
            tracing::debug!(error = %e, "Rejected newsletter email");
            return SubscribeResult {
                success: false,
                error: Some("Please enter a valid email address.".to_string()),
            };
        }
    };

    add_breadcrumb("newsletter", "Subscribe", Some(&[("domain", email.domain())]));

    // Newsletter-only customers never sign in with this password
    let password = generate_password();

    match ctx
        .storefront
        .create_customer(email.as_str(), &password, true)
        .await
    {
        Ok(_) => {
            tracing::info!(domain = email.domain(), "Newsletter subscription created");
            SubscribeResult {
                success: true,
                error: None,
            }
        }
        Err(e) if is_already_registered(&e.to_string()) => {
            tracing::info!(domain = email.domain(), "Email already registered");
            SubscribeResult {
                success: true,
                error: None,
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Newsletter subscription failed");
            SubscribeResult {
                success: false,
                error: Some("Something went wrong. Please try again.".to_string()),
            }
        }
    }
}

/// Shopify rejects duplicate customers with "Email has already been taken".
fn is_already_registered(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("already been taken") || message.contains("already exists")
}

fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("application/json"))
}

fn generate_password() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(PASSWORD_LENGTH)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_already_registered_detection() {
        assert!(is_already_registered("Email has already been taken"));
        assert!(is_already_registered("Customer ALREADY EXISTS"));
        assert!(!is_already_registered("Password is too short"));
    }

    #[test]
    fn test_wants_json() {
        let mut headers = HeaderMap::new();
        assert!(!wants_json(&headers));
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/json, text/plain"),
        );
        assert!(wants_json(&headers));
    }

    #[test]
    fn test_generate_password() {
        let a = generate_password();
        let b = generate_password();
        assert_eq!(a.len(), PASSWORD_LENGTH);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }
}
