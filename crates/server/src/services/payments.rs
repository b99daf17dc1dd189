//! Payment gateway.
//!
//! Placing an order creates a payment intent and hands its client secret to
//! the caller. Fulfilling the order presents that secret again; the gateway
//! checks it against the stored one and, for Stripe, that the intent has
//! actually been paid.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

use bluejay_core::Price;

use super::auth::jwt::random_token;
use crate::config::PaymentSettings;
use crate::models::ClientSecret;

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// Payment provider errors.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Presented secret does not belong to the order.
    #[error("client secret does not match")]
    SecretMismatch,

    /// The provider has not captured the payment yet.
    #[error("payment not completed (status: {0})")]
    NotCompleted(String),

    /// The stored secret carries no payment intent id.
    #[error("client secret has no payment intent id")]
    MissingIntentId,

    /// The amount cannot be expressed in minor units.
    #[error("amount out of range: {0}")]
    InvalidAmount(Price),

    /// The provider answered with an error.
    #[error("payment provider error: {0}")]
    Provider(String),

    /// The provider could not be reached.
    #[error("payment provider request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Where payments are processed.
#[derive(Debug, Clone)]
pub enum PaymentGateway {
    Stripe(StripeClient),
    /// No provider configured; secrets are generated locally and any
    /// matching secret counts as paid.
    Offline,
}

impl PaymentGateway {
    #[must_use]
    pub fn from_settings(settings: &PaymentSettings) -> Self {
        match &settings.stripe_secret_key {
            Some(key) => Self::Stripe(StripeClient::new(key.clone(), settings.currency.clone())),
            None => Self::Offline,
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Stripe(_) => "stripe",
            Self::Offline => "offline",
        }
    }

    /// Start a payment for `amount` and return the client secret.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError` if the provider rejects the request.
    pub async fn create_intent(&self, amount: Price) -> Result<ClientSecret, PaymentError> {
        match self {
            Self::Stripe(client) => client.create_payment_intent(amount).await,
            Self::Offline => Ok(ClientSecret::new(format!(
                "offline_{}_secret_{}",
                random_token(16),
                random_token(24)
            ))),
        }
    }

    /// Check that `presented` is the order's secret and the payment went through.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::SecretMismatch` if the secrets differ and
    /// `PaymentError::NotCompleted` if the provider has not captured the
    /// payment.
    pub async fn confirm(&self, stored: &ClientSecret, presented: &str) -> Result<(), PaymentError> {
        if !stored.matches(presented) {
            return Err(PaymentError::SecretMismatch);
        }

        match self {
            Self::Stripe(client) => client.confirm_succeeded(stored).await,
            Self::Offline => Ok(()),
        }
    }
}

/// Stripe REST client for payment intents.
#[derive(Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    secret_key: SecretString,
    currency: String,
}

impl std::fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeClient")
            .field("secret_key", &"[REDACTED]")
            .field("currency", &self.currency)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct StripePaymentIntent {
    id: String,
    client_secret: Option<String>,
    status: String,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

impl StripeClient {
    #[must_use]
    pub fn new(secret_key: SecretString, currency: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            secret_key,
            currency,
        }
    }

    async fn create_payment_intent(&self, amount: Price) -> Result<ClientSecret, PaymentError> {
        let cents = amount
            .to_cents()
            .ok_or(PaymentError::InvalidAmount(amount))?
            .to_string();

        let response = self
            .http
            .post(format!("{STRIPE_API_BASE}/payment_intents"))
            .basic_auth(self.secret_key.expose_secret(), None::<&str>)
            .form(&[
                ("amount", cents.as_str()),
                ("currency", self.currency.as_str()),
                ("automatic_payment_methods[enabled]", "true"),
            ])
            .send()
            .await?;

        let intent = Self::parse_intent(response).await?;
        tracing::info!(payment_intent = %intent.id, "Payment intent created");

        intent
            .client_secret
            .map(ClientSecret::new)
            .ok_or_else(|| PaymentError::Provider("payment intent has no client secret".into()))
    }

    async fn confirm_succeeded(&self, stored: &ClientSecret) -> Result<(), PaymentError> {
        let intent_id = stored
            .payment_intent_id()
            .ok_or(PaymentError::MissingIntentId)?;

        let response = self
            .http
            .get(format!("{STRIPE_API_BASE}/payment_intents/{intent_id}"))
            .basic_auth(self.secret_key.expose_secret(), None::<&str>)
            .send()
            .await?;

        let intent = Self::parse_intent(response).await?;

        if !intent
            .client_secret
            .as_deref()
            .is_some_and(|secret| stored.matches(secret))
        {
            return Err(PaymentError::SecretMismatch);
        }

        if intent.status != "succeeded" {
            return Err(PaymentError::NotCompleted(intent.status));
        }

        Ok(())
    }

    async fn parse_intent(response: reqwest::Response) -> Result<StripePaymentIntent, PaymentError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let message = response
            .json::<StripeErrorBody>()
            .await
            .ok()
            .and_then(|body| body.error.message)
            .unwrap_or_else(|| status.to_string());

        tracing::warn!(%status, %message, "Stripe request failed");
        Err(PaymentError::Provider(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_settings() -> PaymentSettings {
        PaymentSettings {
            stripe_secret_key: None,
            currency: "usd".to_string(),
        }
    }

    #[tokio::test]
    async fn test_offline_secret_shape() {
        let gateway = PaymentGateway::from_settings(&offline_settings());
        assert_eq!(gateway.name(), "offline");

        let secret = gateway
            .create_intent(Price::from_cents(1250))
            .await
            .unwrap_or_else(|e| panic!("{e}"));

        let intent_id = secret.payment_intent_id().unwrap_or_default();
        assert!(intent_id.starts_with("offline_"));
    }

    #[tokio::test]
    async fn test_offline_confirm() {
        let gateway = PaymentGateway::Offline;
        let secret = gateway
            .create_intent(Price::from_cents(100))
            .await
            .unwrap_or_else(|e| panic!("{e}"));

        assert!(gateway.confirm(&secret, secret.expose()).await.is_ok());
        assert!(matches!(
            gateway.confirm(&secret, "offline_x_secret_y").await,
            Err(PaymentError::SecretMismatch)
        ));
    }

    #[tokio::test]
    async fn test_offline_secrets_are_unique() {
        let gateway = PaymentGateway::Offline;
        let a = gateway.create_intent(Price::ZERO).await;
        let b = gateway.create_intent(Price::ZERO).await;
        match (a, b) {
            (Ok(a), Ok(b)) => assert_ne!(a, b),
            _ => panic!("offline intents never fail"),
        }
    }

    #[tokio::test]
    async fn test_stripe_mismatch_checked_before_network() {
        let gateway = PaymentGateway::from_settings(&PaymentSettings {
            stripe_secret_key: Some(SecretString::from("sk_test_123".to_string())),
            currency: "usd".to_string(),
        });
        assert_eq!(gateway.name(), "stripe");

        let stored = ClientSecret::new("pi_1_secret_a".to_string());
        assert!(matches!(
            gateway.confirm(&stored, "pi_1_secret_b").await,
            Err(PaymentError::SecretMismatch)
        ));
    }

    #[tokio::test]
    async fn test_stripe_requires_intent_id() {
        let gateway = PaymentGateway::Stripe(StripeClient::new(
            SecretString::from("sk_test_123".to_string()),
            "usd".to_string(),
        ));

        let stored = ClientSecret::new("opaque".to_string());
        assert!(matches!(
            gateway.confirm(&stored, "opaque").await,
            Err(PaymentError::MissingIntentId)
        ));
    }

    #[test]
    fn test_stripe_debug_redacts_key() {
        let client = StripeClient::new(
            SecretString::from("sk_live_abc".to_string()),
            "usd".to_string(),
        );
        assert!(!format!("{client:?}").contains("sk_live_abc"));
    }
}
