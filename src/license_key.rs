//! License key format validation.
//!
//! Keys look like `PREFIX-XXXX-XXXX-XXXX-XXXX`. Segment characters come from
//! a set without the ambiguous characters 0, O, I, L and 1.

use regex::Regex;

use crate::config::LicenseConfig;

/// Characters allowed in key segments.
pub const LICENSE_KEY_CHARSET: &str = "23456789ABCDEFGHJKMNPQRSTUVWXYZ";

/// Expected shape of a license key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseKeyConfig {
    /// Prefix for the license key (e.g., "LIC")
    pub prefix: String,
    /// Number of segments after the prefix
    pub segments: u8,
    /// Length of each segment
    pub segment_length: u8,
}

impl Default for LicenseKeyConfig {
    fn default() -> Self {
        Self {
            prefix: "LIC".to_string(),
            segments: 4,
            segment_length: 4,
        }
    }
}

impl From<&LicenseConfig> for LicenseKeyConfig {
    fn from(config: &LicenseConfig) -> Self {
        Self {
            prefix: config.key_prefix.clone(),
            segments: config.key_segments,
            segment_length: config.key_segment_length,
        }
    }
}

impl LicenseKeyConfig {
    fn pattern(&self) -> String {
        format!(
            "^{}(-[{}]{{{}}}){{{}}}$",
            regex::escape(&self.prefix),
            LICENSE_KEY_CHARSET,
            self.segment_length,
            self.segments
        )
    }
}

/// Check that `key` has the configured prefix, segment count and segment length,
/// with every segment character taken from [`LICENSE_KEY_CHARSET`].
pub fn validate_license_key_format(key: &str, config: &LicenseKeyConfig) -> bool {
    if config.segments == 0 || config.segment_length == 0 {
        return false;
    }

    match Regex::new(&config.pattern()) {
        Ok(re) => re.is_match(key),
        Err(e) => {
            log::warn!("invalid license key pattern for prefix {:?}: {}", config.prefix, e);
            false
        }
    }
}
