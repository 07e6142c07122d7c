//! Validation outcomes: severity ranking, the rejection taxonomy, and the
//! [`Verdict`] value returned for every call.
//!
//! Rejections are ordinary return values. The gate never surfaces an `Err` or
//! a panic to its caller; every failure mode maps to a [`RejectReason`] inside
//! a `Verdict`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ordinal danger rating for a rejected input.
///
/// Ordering is `Low < Medium < High < Critical`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a URL was rejected.
///
/// The `Display` strings are short and non-sensitive, fit for logs and for
/// returning across an IPC boundary. The attempted URL itself is carried only
/// in the [`SecurityEvent`](crate::audit::SecurityEvent).
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectReason {
    /// Missing, oversized, control-character-bearing, or unparsable input.
    #[error("invalid URL format")]
    InvalidFormat,

    /// Scheme is denylisted or not on the allowlist. Default-deny.
    #[error("protocol not allowed: {scheme}")]
    ProtocolNotAllowed { scheme: String },

    /// A threat pattern matched the raw string or the decoded query/fragment.
    #[error("URL contains suspicious patterns")]
    SuspiciousPatterns,

    /// Host of an `http`/`https` URL failed the trust rules.
    #[error("hostname is not valid: {host}")]
    HostnameNotValid { host: String },

    /// Path of a `file:` URL hit a traversal or sensitive-path rule.
    #[error("file URL is not valid")]
    FileUrlNotValid,

    /// Unexpected internal failure, folded into a rejection at the
    /// orchestrator boundary.
    #[error("validation error")]
    Internal,
}

impl RejectReason {
    /// Baseline severity for this rejection class.
    pub fn severity(&self) -> Severity {
        match self {
            RejectReason::InvalidFormat => Severity::Medium,
            RejectReason::ProtocolNotAllowed { .. } => Severity::High,
            RejectReason::SuspiciousPatterns => Severity::Critical,
            RejectReason::HostnameNotValid { .. } => Severity::Medium,
            RejectReason::FileUrlNotValid => Severity::High,
            RejectReason::Internal => Severity::Medium,
        }
    }
}

/// Outcome of validating one URL.
///
/// Indicators name the concrete rules that fired (threat-pattern labels,
/// `denied-scheme:<s>`, `path-traversal`, ...). A non-empty indicator list
/// implies `allowed == false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub allowed: bool,
    pub reason: Option<RejectReason>,
    pub severity: Severity,
    pub indicators: Vec<String>,
}

impl Verdict {
    /// The URL may be handed to the OS external handler.
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
            severity: Severity::Low,
            indicators: Vec::new(),
        }
    }

    /// Rejection with the reason's baseline severity and at least one
    /// indicator naming the rule that fired.
    pub fn reject(reason: RejectReason, indicators: Vec<String>) -> Self {
        Self {
            allowed: false,
            severity: reason.severity(),
            reason: Some(reason),
            indicators,
        }
    }

    /// Human-readable reason, if the verdict is a rejection.
    pub fn reason_text(&self) -> Option<String> {
        self.reason.as_ref().map(|r| r.to_string())
    }
}
