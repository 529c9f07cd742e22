//! Tollgate - Sliding-Window Rate Limiting
//!
//! This crate implements sliding-window request throttling with a pluggable
//! storage backend. Every hit is timestamped individually, so the count for
//! a key is always the number of hits inside the trailing window rather than
//! a fixed, clock-aligned bucket. Storage is either a process-local map or a
//! shared Redis sorted set for multi-instance deployments.
//!
//! The limiter is transport-agnostic: adapt your framework's request into a
//! [`RequestDescriptor`], evaluate it, and apply the returned [`Decision`]
//! (headers, 429 body, retry-after) however your framework exposes responses.
//!
//! ```no_run
//! use tollgate::{presets, RequestDescriptor, TimeWindow};
//!
//! # async fn demo() -> tollgate::Result<()> {
//! let limiter = presets::api(100, TimeWindow::Minute)?;
//!
//! let request = RequestDescriptor::new("203.0.113.7", "GET", "/orders");
//! let decision = limiter.evaluate(&request).await;
//!
//! if decision.allowed() {
//!     // proceed, attaching decision.headers()
//! } else {
//!     // respond 429 with decision.rejection_body()
//! }
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod decision;
pub mod error;
pub mod key;
pub mod limiter;
pub mod presets;
pub mod request;
pub mod rules;
pub mod store;
pub mod window;

pub use decision::Decision;
pub use error::{Result, TollgateError};
pub use key::KeyStrategy;
pub use limiter::RateLimiter;
pub use request::RequestDescriptor;
pub use rules::RulesConfig;
pub use store::{Hit, MemoryStore, RedisStore, Store};
pub use window::TimeWindow;
