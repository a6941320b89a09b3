//! Testing utilities and helpers
//!
//! - **[`fixtures`]**: unsigned JWT-shaped tokens with or without `exp`
//! - **[`mocks`]**: scripted implementations of [`Transport`],
//!   [`TokenProvider`], [`HandleCreator`] and [`ConfigReader`]
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use steadfast_common::cache_aside::{TokenCacheAside, TokenProvider};
//! use steadfast_common::testing::{jwt_expiring_at, MockClock, MockTokenProvider};
//!
//! # tokio_test::block_on(async {
//! let clock = MockClock::at_epoch_secs(1_000);
//! let provider = MockTokenProvider::with_tokens([jwt_expiring_at(1_060)]);
//! let cache = TokenCacheAside::with_clock(Box::new(provider.clone()), Arc::new(clock.clone()));
//!
//! cache.get_token().await.unwrap();
//! clock.advance(Duration::from_secs(30));
//! cache.get_token().await.unwrap();
//! assert_eq!(provider.call_count(), 1);
//! # });
//! ```
//!
//! [`Transport`]: crate::http::Transport
//! [`TokenProvider`]: crate::cache_aside::TokenProvider
//! [`HandleCreator`]: crate::cache_aside::HandleCreator
//! [`ConfigReader`]: crate::config::ConfigReader

pub mod fixtures;
pub mod mocks;

pub use fixtures::{jwt_expiring_at, jwt_without_expiry, unsigned_jwt};
pub use mocks::{
    MockConfigReader, MockHandleCreator, MockOutcome, MockTokenProvider, MockTransport,
};

pub use crate::resilience::clock::{Clock, MockClock, SystemClock};
