//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::services::{JwtService, PaymentGateway};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. The pool is handed to
/// short-lived repositories inside each handler.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    jwt: JwtService,
    payments: PaymentGateway,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The payment gateway is Stripe when a secret key is configured and
    /// offline otherwise.
    #[must_use]
    pub fn new(config: ServerConfig, pool: PgPool) -> Self {
        let jwt = JwtService::new(&config.jwt);
        let payments = PaymentGateway::from_settings(&config.payments);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                jwt,
                payments,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn jwt(&self) -> &JwtService {
        &self.inner.jwt
    }

    #[must_use]
    pub fn payments(&self) -> &PaymentGateway {
        &self.inner.payments
    }
}
