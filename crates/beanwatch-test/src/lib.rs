//! Shared test fixtures for beanwatch crates.
//!
//! This crate provides hand-instrumented observables and recording listeners.
//! It does NOT depend on the `beanwatch` facade, so the facade and the macro
//! crate can use it without a cycle.
//!
//! - [`account`] - An observable account with scalar, list and map properties
//! - [`listeners`] - Listeners that record or count what they receive
//!
//! # Usage
//!
//! Add as a dev-dependency in your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! beanwatch-test = { workspace = true }
//! ```
//!
//! Then import the fixtures you need:
//!
//! ```ignore
//! use beanwatch_test::account::Account;
//! use beanwatch_test::listeners::RecordingListener;
//! ```

pub mod account;
pub mod listeners;

pub use account::Account;
pub use listeners::{CountingListener, FailingListener, RecordingListener};
