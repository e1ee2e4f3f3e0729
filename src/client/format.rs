//! Activation (de)serialization.
//!
//! Stored activations are plain [`Activation`] JSON. The license server wraps
//! the activation in an envelope:
//!
//! ```json
//! {
//!   "success": true,
//!   "activation": { "key": "LIC-...", "licensee": "...", ... },
//!   "message": null
//! }
//! ```
//!
//! [`JsonActivationFormat`] accepts both shapes.

use serde::{Deserialize, Serialize};

use crate::activation::Activation;
use crate::errors::{LicenseError, LicenseResult};

/// Text representation of an [`Activation`].
pub trait ActivationFormat {
    fn parse_activation(&self, text: &str) -> LicenseResult<Activation>;

    fn render_activation(&self, activation: &Activation) -> LicenseResult<String>;
}

impl<T: ActivationFormat + ?Sized> ActivationFormat for &T {
    fn parse_activation(&self, text: &str) -> LicenseResult<Activation> {
        (**self).parse_activation(text)
    }

    fn render_activation(&self, activation: &Activation) -> LicenseResult<String> {
        (**self).render_activation(activation)
    }
}

/// Server response for the activation endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerActivationResponse {
    pub success: bool,
    #[serde(default)]
    pub activation: Option<Activation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ActivationPayload {
    Envelope(ServerActivationResponse),
    Bare(Activation),
}

/// JSON via serde_json.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonActivationFormat;

impl ActivationFormat for JsonActivationFormat {
    fn parse_activation(&self, text: &str) -> LicenseResult<Activation> {
        match serde_json::from_str::<ActivationPayload>(text)? {
            ActivationPayload::Bare(activation) => Ok(activation),
            ActivationPayload::Envelope(ServerActivationResponse {
                success: true,
                activation: Some(activation),
                ..
            }) => Ok(activation),
            ActivationPayload::Envelope(resp) => Err(LicenseError::ServerError(
                resp.message
                    .unwrap_or_else(|| "server did not return an activation".to_string()),
            )),
        }
    }

    fn render_activation(&self, activation: &Activation) -> LicenseResult<String> {
        Ok(serde_json::to_string(activation)?)
    }
}
