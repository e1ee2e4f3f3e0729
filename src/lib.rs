//! Offline-capable license activation built on a small result type.
//!
//! [`fallible::Fallible`] carries either a value or an error and offers the
//! combinators the activation workflow is written with. The workflow itself
//! lives in [`client::resolver`]: it prefers a locally stored activation and
//! reactivates against the license server only when that activation is
//! missing or no longer valid.
//!
//! # Features
//!
//! - `http` - HTTP license server client and the `activation_client` binary.
//!   Enabled by default.
//!
//! # Example
//!
//! ```toml
//! # Use defaults (HTTP client included)
//! option-activation = { path = "." }
//!
//! # Combinators and resolver only, bring your own server
//! option-activation = { path = ".", default-features = false }
//! ```

// Core modules (always available)
pub mod activation;
pub mod config;
pub mod encryption;
pub mod errors;
pub mod fallible;
pub mod license_key;

// Activation client
pub mod client {
    pub mod codec;
    pub mod format;
    pub mod resolver;
    pub mod server;
    pub mod storage;

    pub use resolver::{ActivationOutcome, ActivationResolver};
}

pub use activation::{Activation, ActivationWindow};
pub use errors::{LicenseError, LicenseErrorKind, LicenseResult};
pub use fallible::Fallible;
