//! # linkgate
//!
//! External-URL security gate for desktop host processes. Before a URL is
//! handed to the OS external handler (browser, file viewer, mail client), the
//! host calls [`UrlValidator::validate`] and acts on the returned
//! [`Verdict`]. The gate stops protocol injection (`javascript:`, `data:`,
//! `vbscript:`), path traversal and sensitive-file exposure through `file:`
//! URLs, and percent-encoded variants of both.
//!
//! The gate is default-deny: a scheme must be on the allowlist to pass, the
//! denylist wins over the allowlist, and unrecognized schemes are rejected.
//! Every call is synchronous, side-effect free apart from best-effort audit
//! events, and bounded in time by the policy length cap together with the
//! linear-time regex engine.
//!
//! Pattern matching is defense-in-depth, not the primary safeguard: a regex
//! catalog cannot enumerate every encoding bypass, so the scheme allowlist
//! carries the main load.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use linkgate::{GatePolicy, MemorySink, UrlValidator};
//!
//! let sink = Arc::new(MemorySink::new());
//! let gate = UrlValidator::new(GatePolicy::default(), sink.clone());
//!
//! assert!(gate.validate("https://example.com").allowed);
//!
//! let verdict = gate.validate("data:text/html,<script>alert(1)</script>");
//! assert!(!verdict.allowed);
//! assert_eq!(sink.len(), 1);
//! ```

pub mod audit;
pub mod catalog;
mod decode;
pub mod filepath;
pub mod hostname;
pub mod policy;
pub mod protocol;
pub mod validator;
pub mod verdict;

pub use audit::{EventId, EventSink, MemorySink, SecurityEvent, SinkError, TracingSink};
pub use catalog::{PatternHit, ThreatCatalog, ThreatPattern};
pub use policy::{
    GatePolicy, GatePolicyBuilder, HostnamePolicy, UrlLengthLimit, UrlLengthLimitError,
};
pub use protocol::ProtocolClass;
pub use validator::UrlValidator;
pub use verdict::{RejectReason, Severity, Verdict};
