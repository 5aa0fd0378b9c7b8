//! Core types and trait definitions for Event Hub.
//!
//! This crate is deliberately free of HTTP and database dependencies. It owns
//! the two pieces of real domain logic: event status resolution and the
//! append-only audit trail.

// We intentionally use native `async fn` in trait impls.
#![allow(async_fn_in_trait)]

pub mod audit;
pub mod clock;
pub mod directory;
pub mod error;
pub mod event;
pub mod listing;
pub mod status;
pub mod store;

pub use error::{Error, Result};
