//! The activation record and its validity rules.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Default lower bound of the activation window in seconds (5 hours):
/// timestamps may lag `now` by strictly less than this.
pub const DEFAULT_MAX_AGE_SECS: i64 = 5 * 60 * 60;

/// Default upper bound of the activation window in seconds (5 minutes):
/// timestamps may lead `now` by at most this.
pub const DEFAULT_MAX_LEAD_SECS: i64 = 5 * 60;

/// A license activation as stored locally and returned by the license server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activation {
    /// License key this activation was issued for.
    pub key: String,
    /// Name of the license holder.
    pub licensee: String,
    /// The activation may be used offline until this instant.
    pub activated_until: DateTime<Utc>,
    /// When the license itself runs out (independent of activation).
    pub license_expires: DateTime<Utc>,
    /// When the server issued this activation.
    pub activation_timestamp: DateTime<Utc>,
    /// Server-side validity flag.
    pub valid: bool,
}

impl Activation {
    /// Still usable at `now`: inside the activation period and flagged valid.
    pub fn is_still_valid(&self, now: DateTime<Utc>) -> bool {
        now <= self.activated_until && self.valid
    }

    /// Whether the license behind this activation has run out at `now`.
    pub fn is_license_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.license_expires
    }

    /// Time left on the activation period, or `None` once it has passed.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        let remaining = self.activated_until - now;
        if remaining > Duration::zero() {
            Some(remaining)
        } else {
            None
        }
    }
}

/// Accepted clock skew between a fresh activation's timestamp and local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivationWindow {
    /// How far in the past the timestamp may be (exclusive).
    pub max_age: Duration,
    /// How far in the future the timestamp may be (inclusive).
    pub max_lead: Duration,
}

impl Default for ActivationWindow {
    fn default() -> Self {
        Self {
            max_age: Duration::seconds(DEFAULT_MAX_AGE_SECS),
            max_lead: Duration::seconds(DEFAULT_MAX_LEAD_SECS),
        }
    }
}

impl ActivationWindow {
    pub fn new(max_age: Duration, max_lead: Duration) -> Self {
        Self { max_age, max_lead }
    }

    /// `timestamp - now` lies in `(-max_age, +max_lead]`.
    pub fn contains(&self, timestamp: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let skew = timestamp - now;
        skew > -self.max_age && skew <= self.max_lead
    }

    /// Acceptance rule for a freshly retrieved activation.
    ///
    /// The `valid` flag overrides the window, so a flagged activation passes
    /// even when its timestamp is far outside it.
    pub fn accepts(&self, activation: &Activation, now: DateTime<Utc>) -> bool {
        self.contains(activation.activation_timestamp, now) || activation.valid
    }
}
