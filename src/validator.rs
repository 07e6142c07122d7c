//! The validation orchestrator.
//!
//! [`UrlValidator`] composes the scanner, classifier, hostname, and file-path
//! checks in a fixed order and returns a [`Verdict`] for every input. Nothing
//! on the public path panics or returns `Err`: internal panics are caught at
//! this boundary and folded into a generic rejection, and sink failures are
//! logged and discarded.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use url::Url;

use crate::audit::{EventSink, SecurityEvent, TracingSink};
use crate::catalog::{PatternHit, ThreatCatalog};
use crate::decode::percent_decode_lossy;
use crate::filepath;
use crate::hostname;
use crate::policy::GatePolicy;
use crate::protocol::{self, ProtocolClass};
use crate::verdict::{RejectReason, Verdict};

/// Synchronous URL gate consulted before any outbound navigation.
///
/// The policy and catalog are immutable after construction, so one validator
/// can be shared across threads behind an `Arc` without locks. Each call is
/// independent; no state survives between calls.
///
/// # Example
///
/// ```
/// use linkgate::UrlValidator;
///
/// let gate = UrlValidator::with_defaults();
///
/// assert!(gate.validate("https://example.com").allowed);
/// assert!(!gate.validate("javascript:alert(1)").allowed);
/// ```
pub struct UrlValidator {
    policy: GatePolicy,
    catalog: Arc<ThreatCatalog>,
    sink: Arc<dyn EventSink>,
}

impl UrlValidator {
    /// Validator with the given policy and sink, using the builtin catalog.
    pub fn new(policy: GatePolicy, sink: Arc<dyn EventSink>) -> Self {
        Self::with_catalog(policy, ThreatCatalog::shared(), sink)
    }

    pub fn with_catalog(
        policy: GatePolicy,
        catalog: Arc<ThreatCatalog>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            policy,
            catalog,
            sink,
        }
    }

    /// Default policy, builtin catalog, events to [`TracingSink`].
    pub fn with_defaults() -> Self {
        Self::new(GatePolicy::default(), Arc::new(TracingSink))
    }

    pub fn policy(&self) -> &GatePolicy {
        &self.policy
    }

    /// Entry point for callers whose URL may be absent (IPC payloads,
    /// foreign-function boundaries). `None` rejects as invalid format.
    pub fn validate_input(&self, input: Option<&str>) -> Verdict {
        match input {
            Some(raw) => self.validate(raw),
            None => {
                let verdict = Verdict::reject(
                    RejectReason::InvalidFormat,
                    vec!["missing-input".to_string()],
                );
                self.emit("", &verdict);
                verdict
            }
        }
    }

    /// Validate one URL. Always returns a verdict; a rejection also emits a
    /// [`SecurityEvent`] to the sink.
    pub fn validate(&self, raw: &str) -> Verdict {
        let verdict = panic::catch_unwind(AssertUnwindSafe(|| self.evaluate(raw)))
            .unwrap_or_else(|_| {
                Verdict::reject(RejectReason::Internal, vec!["internal-error".to_string()])
            });
        if !verdict.allowed {
            self.emit(raw, &verdict);
        }
        verdict
    }

    fn evaluate(&self, raw: &str) -> Verdict {
        if raw.chars().count() > self.policy.max_url_length.chars() {
            return Verdict::reject(
                RejectReason::InvalidFormat,
                vec!["length-cap-exceeded".to_string()],
            );
        }

        if raw.bytes().any(|b| b < 0x20 || b == 0x7f) {
            return Verdict::reject(
                RejectReason::InvalidFormat,
                vec!["control-characters".to_string()],
            );
        }

        // Raw-string scan. A scheme-smuggling match at offset 0 is the URL's
        // own scheme; the protocol classifier owns that rejection.
        let hits: Vec<PatternHit<'_>> = self
            .catalog
            .scan(raw)
            .into_iter()
            .filter(|hit| !(hit.pattern.is_scheme_smuggling() && hit.offset == 0))
            .collect();
        if !hits.is_empty() {
            return pattern_verdict(&hits);
        }

        let url = match Url::parse(raw) {
            Ok(url) => url,
            Err(_) => {
                return Verdict::reject(
                    RejectReason::InvalidFormat,
                    vec!["unparsable-url".to_string()],
                );
            }
        };

        let scheme = url.scheme();
        match protocol::classify(&self.policy, scheme) {
            ProtocolClass::Allowed => {}
            ProtocolClass::Denied => {
                return Verdict::reject(
                    RejectReason::ProtocolNotAllowed {
                        scheme: scheme.to_string(),
                    },
                    vec![format!("denied-scheme:{scheme}")],
                );
            }
            ProtocolClass::Unrecognized => {
                return Verdict::reject(
                    RejectReason::ProtocolNotAllowed {
                        scheme: scheme.to_string(),
                    },
                    vec![format!("unrecognized-scheme:{scheme}")],
                );
            }
        }

        match scheme {
            "http" | "https" => {
                if let Err(indicator) = hostname::check_host(url.host(), &self.policy) {
                    return Verdict::reject(
                        RejectReason::HostnameNotValid {
                            host: url.host_str().unwrap_or_default().to_string(),
                        },
                        vec![indicator],
                    );
                }
            }
            "file" => {
                let decoded = percent_decode_lossy(url.path());
                if let Some(indicator) =
                    filepath::find_violation(&decoded, &self.policy.file_deny_patterns)
                {
                    return Verdict::reject(RejectReason::FileUrlNotValid, vec![indicator]);
                }
            }
            _ => {}
        }

        // Second scan over decoded query and fragment. Payloads hidden by
        // percent-encoding only become visible here, and a match at offset 0
        // of a component is embedded, so nothing is deferred.
        for part in [url.query(), url.fragment()].into_iter().flatten() {
            let decoded = percent_decode_lossy(part);
            let hits = self.catalog.scan(&decoded);
            if !hits.is_empty() {
                return pattern_verdict(&hits);
            }
        }

        Verdict::allow()
    }

    fn emit(&self, attempted_url: &str, verdict: &Verdict) {
        let event = SecurityEvent::for_rejection(attempted_url, verdict);
        match panic::catch_unwind(AssertUnwindSafe(|| self.sink.record(&event))) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                tracing::debug!(
                    target: "linkgate_audit",
                    error = %err,
                    "event sink rejected security event"
                );
            }
            Err(_) => {
                tracing::debug!(
                    target: "linkgate_audit",
                    "event sink panicked while recording security event"
                );
            }
        }
    }
}

fn pattern_verdict(hits: &[PatternHit<'_>]) -> Verdict {
    let indicators = hits
        .iter()
        .map(|hit| hit.pattern.label().to_string())
        .collect();
    // SuspiciousPatterns carries Critical, which dominates every pattern
    // severity hint, so the verdict severity invariant holds.
    Verdict::reject(RejectReason::SuspiciousPatterns, indicators)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{MemorySink, SinkError};
    use crate::policy::HostnamePolicy;
    use crate::verdict::Severity;

    fn gate() -> (UrlValidator, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let validator = UrlValidator::new(GatePolicy::default(), sink.clone());
        (validator, sink)
    }

    #[test]
    fn test_allows_plain_https() {
        let (gate, sink) = gate();
        let verdict = gate.validate("https://example.com");
        assert!(verdict.allowed);
        assert!(verdict.indicators.is_empty());
        assert!(sink.is_empty());
    }

    #[test]
    fn test_allows_localhost_with_port() {
        let (gate, _) = gate();
        assert!(gate.validate("http://localhost:3000").allowed);
        assert!(gate.validate("http://127.0.0.1:8080/health").allowed);
    }

    #[test]
    fn test_rejects_javascript_scheme_as_protocol() {
        let (gate, sink) = gate();
        let verdict = gate.validate("javascript:alert(1)");

        assert!(!verdict.allowed);
        assert!(verdict.reason_text().unwrap().contains("not allowed"));
        assert_eq!(verdict.severity, Severity::High);
        assert_eq!(verdict.indicators, vec!["denied-scheme:javascript"]);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_rejects_denied_scheme_in_any_case() {
        let (gate, _) = gate();
        for raw in ["JAVASCRIPT:x", "JaVaScRiPt:alert(1)", "DATA:text/plain,x", "VbScRiPt:y"] {
            let verdict = gate.validate(raw);
            assert!(!verdict.allowed, "{raw}");
            assert!(verdict.severity >= Severity::High, "{raw}");
        }
    }

    #[test]
    fn test_rejects_data_url_with_script_payload() {
        let (gate, _) = gate();
        let verdict = gate.validate("data:text/html,<script>alert(1)</script>");

        assert!(!verdict.allowed);
        assert!(verdict.severity >= Severity::High);
        // The embedded script tag outranks the scheme here.
        assert!(verdict.indicators.contains(&"script-tag".to_string()));
    }

    #[test]
    fn test_rejects_smuggled_scheme_in_query() {
        let (gate, _) = gate();
        let verdict = gate.validate("https://example.com/?next=javascript:alert(1)");

        assert!(!verdict.allowed);
        assert_eq!(verdict.severity, Severity::Critical);
        assert_eq!(
            verdict.reason_text().as_deref(),
            Some("URL contains suspicious patterns")
        );
        assert!(verdict.indicators.contains(&"javascript-protocol".to_string()));
    }

    #[test]
    fn test_rejects_percent_encoded_payload_in_query() {
        // %6a%61vascript: only reads as javascript: after decoding.
        let (gate, _) = gate();
        let verdict = gate.validate("https://example.com/?next=%6a%61vascript:alert(1)");

        assert!(!verdict.allowed);
        assert!(verdict.indicators.contains(&"javascript-protocol".to_string()));
    }

    #[test]
    fn test_rejects_encoded_markup_in_fragment() {
        let (gate, _) = gate();
        let verdict = gate.validate("https://example.com/#%3Cscript%3E");

        assert!(!verdict.allowed);
        assert_eq!(verdict.severity, Severity::Critical);
    }

    #[test]
    fn test_rejects_unrecognized_scheme() {
        let (gate, _) = gate();
        let verdict = gate.validate("ftp://mirror.example.com/file.iso");

        assert!(!verdict.allowed);
        assert_eq!(verdict.severity, Severity::High);
        assert_eq!(verdict.indicators, vec!["unrecognized-scheme:ftp"]);
    }

    #[test]
    fn test_rejects_sensitive_file_url() {
        let (gate, _) = gate();
        let verdict = gate.validate("file:///etc/passwd");

        assert!(!verdict.allowed);
        assert!(verdict.reason_text().unwrap().contains("not valid"));
        assert_eq!(verdict.severity, Severity::High);
    }

    #[test]
    fn test_rejects_encoded_file_traversal() {
        // Encoded slashes keep the traversal inside one path segment, so the
        // parser cannot resolve it away; decoding exposes the literal ../ .
        let (gate, _) = gate();
        let verdict = gate.validate("file:///safe/..%2F..%2Fetc/shadow");

        assert!(!verdict.allowed);
        assert_eq!(verdict.indicators, vec!["path-traversal"]);
    }

    #[test]
    fn test_dot_segments_resolving_into_sensitive_path_rejected() {
        // The URL parser resolves /safe/%2e%2e/ during parsing, so the final
        // path is /etc/passwd and the denylist catches it.
        let (gate, _) = gate();
        let verdict = gate.validate("file:///safe/%2e%2e/etc/passwd");

        assert!(!verdict.allowed);
        assert_eq!(verdict.indicators, vec!["sensitive-path:/etc/passwd"]);
    }

    #[test]
    fn test_allows_ordinary_file_url() {
        let (gate, _) = gate();
        assert!(gate.validate("file:///home/user/report.pdf").allowed);
    }

    #[test]
    fn test_rejects_empty_and_missing_input() {
        let (gate, sink) = gate();

        let verdict = gate.validate("");
        assert!(!verdict.allowed);
        assert!(verdict.reason_text().unwrap().contains("invalid"));

        let verdict = gate.validate_input(None);
        assert!(!verdict.allowed);
        assert_eq!(verdict.indicators, vec!["missing-input"]);

        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn test_rejects_control_characters() {
        let (gate, _) = gate();
        let verdict = gate.validate("https://example.com/\x00");
        assert!(!verdict.allowed);
        assert_eq!(verdict.indicators, vec!["control-characters"]);

        assert!(!gate.validate("https://example.com/\x1b[31m").allowed);
        assert!(!gate.validate("https://example.com/\x7f").allowed);
    }

    #[test]
    fn test_rejects_overlong_input() {
        let (gate, _) = gate();
        let raw = format!("https://example.com/{}", "a".repeat(3000));
        let verdict = gate.validate(&raw);

        assert!(!verdict.allowed);
        assert_eq!(verdict.indicators, vec!["length-cap-exceeded"]);
    }

    #[test]
    fn test_rejects_invalid_hostname() {
        let (gate, _) = gate();
        let verdict = gate.validate("https://exa_mple.com/page");

        assert!(!verdict.allowed);
        assert!(verdict.reason_text().unwrap().contains("hostname"));
        assert_eq!(verdict.severity, Severity::Medium);
    }

    #[test]
    fn test_ip_literal_hosts_follow_policy_mode() {
        let (strict, _) = gate();
        assert!(!strict.validate("http://192.168.0.10/admin").allowed);

        let permissive = UrlValidator::new(
            GatePolicy::builder()
                .hostname_policy(HostnamePolicy::PermitIpLiterals)
                .build(),
            Arc::new(MemorySink::new()),
        );
        assert!(permissive.validate("http://192.168.0.10/admin").allowed);
    }

    #[test]
    fn test_mailto_requires_opt_in() {
        let (default_gate, _) = gate();
        assert!(!default_gate.validate("mailto:user@example.com").allowed);

        let opted_in = UrlValidator::new(
            GatePolicy::builder().allow_scheme("mailto").build(),
            Arc::new(MemorySink::new()),
        );
        assert!(opted_in.validate("mailto:user@example.com").allowed);
    }

    #[test]
    fn test_rejection_event_matches_verdict() {
        let (gate, sink) = gate();
        let raw = "https://example.com/?q=<script>alert(1)</script>";
        let verdict = gate.validate(raw);

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].attempted_url, raw);
        assert_eq!(events[0].severity, verdict.severity);
        assert_eq!(events[0].indicators, verdict.indicators);
        assert_eq!(Some(events[0].reason.clone()), verdict.reason_text());
    }

    #[test]
    fn test_failing_sink_does_not_change_verdict() {
        struct FailingSink;
        impl EventSink for FailingSink {
            fn record(&self, _event: &SecurityEvent) -> Result<(), SinkError> {
                Err(SinkError::new("disk full"))
            }
        }

        let gate = UrlValidator::new(GatePolicy::default(), Arc::new(FailingSink));
        let verdict = gate.validate("javascript:alert(1)");
        assert!(!verdict.allowed);
        assert!(verdict.reason_text().unwrap().contains("not allowed"));
    }

    #[test]
    fn test_panicking_sink_does_not_change_verdict() {
        struct PanickingSink;
        impl EventSink for PanickingSink {
            fn record(&self, _event: &SecurityEvent) -> Result<(), SinkError> {
                panic!("sink exploded");
            }
        }

        let gate = UrlValidator::new(GatePolicy::default(), Arc::new(PanickingSink));
        let verdict = gate.validate("javascript:alert(1)");
        assert!(!verdict.allowed);
    }

    #[test]
    fn test_validation_is_deterministic() {
        let (gate, _) = gate();
        for raw in [
            "https://example.com",
            "javascript:alert(1)",
            "file:///etc/passwd",
            "not a url",
            "",
        ] {
            assert_eq!(gate.validate(raw), gate.validate(raw), "{raw}");
        }
    }

    #[test]
    fn test_verdict_severity_dominates_pattern_hints() {
        let (gate, _) = gate();
        let verdict = gate.validate("https://example.com/?q=%22%3Cscript%3E");
        assert!(!verdict.allowed);

        let catalog = ThreatCatalog::shared();
        for indicator in &verdict.indicators {
            let hint = catalog
                .patterns()
                .iter()
                .find(|p| p.label() == indicator.as_str())
                .map(|p| p.severity())
                .unwrap();
            assert!(verdict.severity >= hint);
        }
    }
}
