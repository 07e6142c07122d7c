//! Hostname trust analysis for `http`/`https` navigation.
//!
//! The loopback set from the policy is trusted exactly. Everything else must
//! be a well-formed domain name; non-loopback IP literals are rejected under
//! [`HostnamePolicy::Strict`] and permitted with a warning under
//! [`HostnamePolicy::PermitIpLiterals`].

use crate::policy::{GatePolicy, HostnamePolicy};
use url::Host;

/// Maximum total length of a domain name.
pub const MAX_DOMAIN_LENGTH: usize = 253;

/// Maximum length of a single domain label.
pub const MAX_LABEL_LENGTH: usize = 63;

/// Check the host of an `http`/`https` URL. Returns the indicator label of
/// the failed rule on rejection.
pub(crate) fn check_host(
    host: Option<Host<&str>>,
    policy: &GatePolicy,
) -> Result<(), String> {
    let host = match host {
        Some(host) => host,
        None => return Err("missing-host".to_string()),
    };

    match host {
        Host::Domain(domain) => {
            if policy.is_loopback_host(domain) {
                return Ok(());
            }
            if is_valid_domain_name(domain) {
                Ok(())
            } else {
                Err("malformed-hostname".to_string())
            }
        }
        Host::Ipv4(addr) => check_ip_literal(&addr.to_string(), policy),
        Host::Ipv6(addr) => check_ip_literal(&addr.to_string(), policy),
    }
}

fn check_ip_literal(literal: &str, policy: &GatePolicy) -> Result<(), String> {
    if policy.is_loopback_host(literal) {
        return Ok(());
    }
    match policy.hostname_policy {
        HostnamePolicy::Strict => Err("ip-literal-host".to_string()),
        HostnamePolicy::PermitIpLiterals => {
            tracing::warn!(
                target: "linkgate_audit",
                host = %literal,
                "permitting non-loopback IP literal host"
            );
            Ok(())
        }
    }
}

/// Whether `domain` matches the domain-name grammar: dot-separated labels of
/// 1 to 63 characters from `[A-Za-z0-9-]`, no leading or trailing hyphen,
/// total length at most 253. Empty labels (and so trailing dots) fail.
pub fn is_valid_domain_name(domain: &str) -> bool {
    if domain.is_empty() || domain.len() > MAX_DOMAIN_LENGTH {
        return false;
    }
    domain.split('.').all(is_valid_label)
}

fn is_valid_label(label: &str) -> bool {
    if label.is_empty() || label.len() > MAX_LABEL_LENGTH {
        return false;
    }
    if label.starts_with('-') || label.ends_with('-') {
        return false;
    }
    label
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-')
}
