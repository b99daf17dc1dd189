//! Bluejay Core - Shared domain types.
//!
//! This crate provides the types shared by every Bluejay component:
//! - `server` - The HTTP API for users, chefs, meal items and orders
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. Database encoding is available behind the `postgres`
//! feature.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, emails, prices, roles and order state

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
