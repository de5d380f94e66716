//! PII detection and masking for Brewline.
//!
//! [`PrivacyGuard`] is what the turn pipeline calls. It delegates to a
//! [`PiiEngine`](brewline_core::PiiEngine): either a Presidio-compatible
//! HTTP service or the local regex [`PatternEngine`].

pub mod guard;
pub mod pattern;
pub mod presidio;

pub use guard::PrivacyGuard;
pub use pattern::PatternEngine;
pub use presidio::PresidioEngine;
