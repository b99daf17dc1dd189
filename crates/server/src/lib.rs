//! Bluejay server library.
//!
//! HTTP API for the food-ordering app: users and chefs, meal items, orders
//! and cookie-based JWT authentication on top of `PostgreSQL`. The binary in
//! `main.rs` and the integration tests both build the router with
//! [`app::build_app`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod schemas;
pub mod services;
pub mod state;

pub use app::build_app;
pub use config::ServerConfig;
pub use state::AppState;
