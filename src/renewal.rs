//! Renewal policy for cached key-set ids

use std::fmt;

/// Licenses with less than this much validity left are renewed (4 hours)
pub const RENEWAL_THRESHOLD_SECS: u64 = 4 * 60 * 60;

/// Remaining validity of an offline license, as reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemainingValidity {
    pub playback_secs: u64,
    pub license_secs: u64,
}

impl RemainingValidity {
    pub fn new(playback_secs: u64, license_secs: u64) -> Self {
        Self {
            playback_secs,
            license_secs,
        }
    }
}

/// What to do with a cached key-set id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenewalDecision {
    Reuse,
    Renew,
}

impl fmt::Display for RenewalDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reuse => write!(f, "reuse"),
            Self::Renew => write!(f, "renew"),
        }
    }
}

/// Decides whether a cached license is still good enough to play from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenewalPolicy {
    threshold_secs: u64,
}

impl RenewalPolicy {
    pub fn with_threshold(threshold_secs: u64) -> Self {
        Self { threshold_secs }
    }

    pub fn threshold_secs(&self) -> u64 {
        self.threshold_secs
    }

    /// `Renew` if either window is strictly below the threshold
    pub fn decide(
        &self,
        playback_remaining_secs: u64,
        license_remaining_secs: u64,
    ) -> RenewalDecision {
        if playback_remaining_secs < self.threshold_secs
            || license_remaining_secs < self.threshold_secs
        {
            RenewalDecision::Renew
        } else {
            RenewalDecision::Reuse
        }
    }

    pub fn decide_for(&self, remaining: RemainingValidity) -> RenewalDecision {
        self.decide(remaining.playback_secs, remaining.license_secs)
    }
}

impl Default for RenewalPolicy {
    fn default() -> Self {
        Self::with_threshold(RENEWAL_THRESHOLD_SECS)
    }
}
