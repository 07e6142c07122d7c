//! Scheme classification against the gate policy.

use crate::policy::GatePolicy;
use serde::{Deserialize, Serialize};

/// Classification of a URL scheme.
///
/// `Unrecognized` means the scheme is on neither list; it is rejected just
/// like `Denied`, because the gate is default-deny.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolClass {
    Allowed,
    Denied,
    Unrecognized,
}

/// Classify a scheme. The deny list takes precedence over the allow list.
pub fn classify(policy: &GatePolicy, scheme: &str) -> ProtocolClass {
    if policy.is_scheme_denied(scheme) {
        ProtocolClass::Denied
    } else if policy.is_scheme_allowed(scheme) {
        ProtocolClass::Allowed
    } else {
        ProtocolClass::Unrecognized
    }
}
