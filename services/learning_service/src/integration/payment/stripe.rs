use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

use super::{CheckoutRequest, CheckoutSession, GatewayError, PaymentGateway};

const DEFAULT_API_BASE: &str = "https://api.stripe.com";

pub struct StripeGateway {
    http: reqwest::Client,
    api_base: String,
    secret_key: String,
}

#[derive(Deserialize)]
struct SessionResponse {
    id: String,
    url: Option<String>,
}

impl StripeGateway {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            secret_key: secret_key.into(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }
}

/// Form fields of a one-item, payment-mode checkout session.
fn session_form(request: &CheckoutRequest) -> Vec<(&'static str, String)> {
    let mut form = vec![
        ("mode", "payment".to_string()),
        ("payment_method_types[0]", "card".to_string()),
        ("success_url", request.success_url.clone()),
        ("cancel_url", request.cancel_url.clone()),
        ("client_reference_id", request.user_id.clone()),
        ("line_items[0][quantity]", "1".to_string()),
        ("line_items[0][price_data][currency]", request.currency.to_lowercase()),
        ("line_items[0][price_data][unit_amount]", request.unit_amount.to_string()),
        ("line_items[0][price_data][product_data][name]", request.title.clone()),
        (
            "line_items[0][price_data][product_data][description]",
            format!("Enrollment for {}", request.title),
        ),
        ("metadata[purchaseId]", request.purchase_id.to_string()),
        ("metadata[courseId]", request.course_id.to_string()),
        ("metadata[userId]", request.user_id.clone()),
    ];
    if !request.customer_email.is_empty() {
        form.push(("customer_email", request.customer_email.clone()));
    }
    if !request.thumbnail.is_empty() {
        form.push(("line_items[0][price_data][product_data][images][0]", request.thumbnail.clone()));
    }
    form
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    #[instrument(skip(self, request), fields(purchase_id = %request.purchase_id))]
    async fn create_checkout_session(&self, request: &CheckoutRequest) -> Result<CheckoutSession, GatewayError> {
        let response = self
            .http
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&session_form(request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let session: SessionResponse = response.json().await?;
        let url = session.url.ok_or(GatewayError::MissingUrl)?;
        tracing::info!(session_id = %session.id, "Checkout session created.");
        Ok(CheckoutSession { id: session.id, url })
    }
}
