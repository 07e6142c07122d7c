//! Gate policy: which schemes may leave the process, and under which host and
//! path constraints.
//!
//! The policy is plain data, constructed once at startup (directly, through
//! the builder, or deserialized from the embedder's configuration layer) and
//! shared read-only for the process lifetime. Nothing in this crate mutates a
//! policy after construction.

use serde::{Deserialize, Serialize};

/// Validated cap on URL length, counted in characters.
///
/// The cap is what bounds the work done by the pattern scanners, so it cannot
/// be zero and cannot exceed [`UrlLengthLimit::MAX`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UrlLengthLimit(usize);

impl UrlLengthLimit {
    /// Hard ceiling on the configurable cap.
    pub const MAX: usize = 65_536;

    pub fn new(value: usize) -> Result<Self, UrlLengthLimitError> {
        if value == 0 {
            return Err(UrlLengthLimitError::Zero);
        }
        if value > Self::MAX {
            return Err(UrlLengthLimitError::TooLarge {
                value,
                max: Self::MAX,
            });
        }
        Ok(UrlLengthLimit(value))
    }

    pub fn chars(&self) -> usize {
        self.0
    }
}

impl Default for UrlLengthLimit {
    fn default() -> Self {
        UrlLengthLimit(2048)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlLengthLimitError {
    Zero,
    TooLarge { value: usize, max: usize },
}

impl std::fmt::Display for UrlLengthLimitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Zero => write!(f, "UrlLengthLimit cannot be zero"),
            Self::TooLarge { value, max } => {
                write!(f, "UrlLengthLimit too large: {} chars (max: {} chars)", value, max)
            }
        }
    }
}

impl std::error::Error for UrlLengthLimitError {}

/// How non-loopback IP-literal hosts are treated for `http`/`https`.
///
/// `Strict` is the default and rejects them. `PermitIpLiterals` allows them
/// with a `tracing` warning; it exists for products that navigate to LAN
/// devices and must be opted into explicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostnamePolicy {
    #[default]
    Strict,
    PermitIpLiterals,
}

/// Immutable configuration for the URL gate.
///
/// Scheme comparison is case-insensitive; entries are stored lowercase.
/// The deny list always wins over the allow list, and a scheme on neither
/// list is rejected (default-deny).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatePolicy {
    pub allowed_schemes: Vec<String>,
    pub denied_schemes: Vec<String>,
    #[serde(default)]
    pub max_url_length: UrlLengthLimit,
    /// Hosts trusted exactly, without further analysis.
    pub loopback_hosts: Vec<String>,
    #[serde(default)]
    pub hostname_policy: HostnamePolicy,
    /// Deny patterns applied to decoded `file:` paths. `*` wildcards are
    /// supported in prefix, suffix, and contains positions.
    pub file_deny_patterns: Vec<String>,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self {
            allowed_schemes: vec!["http".into(), "https".into(), "file".into()],
            denied_schemes: vec![
                "javascript".into(),
                "data".into(),
                "vbscript".into(),
                "about".into(),
                "chrome".into(),
                "chrome-extension".into(),
                "moz-extension".into(),
                "ms-browser-extension".into(),
            ],
            max_url_length: UrlLengthLimit::default(),
            loopback_hosts: vec!["localhost".into(), "127.0.0.1".into(), "::1".into()],
            hostname_policy: HostnamePolicy::default(),
            file_deny_patterns: vec![
                "/etc/passwd".into(),
                "/etc/shadow".into(),
                "*/windows/system32/*".into(),
                "/proc/*".into(),
                "/dev/*".into(),
            ],
        }
    }
}

impl GatePolicy {
    /// Create a new gate policy builder.
    pub fn builder() -> GatePolicyBuilder {
        GatePolicyBuilder::default()
    }

    pub fn is_scheme_allowed(&self, scheme: &str) -> bool {
        self.allowed_schemes
            .iter()
            .any(|s| s.eq_ignore_ascii_case(scheme))
    }

    pub fn is_scheme_denied(&self, scheme: &str) -> bool {
        self.denied_schemes
            .iter()
            .any(|s| s.eq_ignore_ascii_case(scheme))
    }

    pub fn is_loopback_host(&self, host: &str) -> bool {
        self.loopback_hosts
            .iter()
            .any(|h| h.eq_ignore_ascii_case(host))
    }
}

/// Builder for constructing `GatePolicy` with a fluent API.
#[derive(Debug, Default)]
pub struct GatePolicyBuilder {
    allowed_schemes: Option<Vec<String>>,
    denied_schemes: Option<Vec<String>>,
    max_url_length: Option<UrlLengthLimit>,
    loopback_hosts: Option<Vec<String>>,
    hostname_policy: Option<HostnamePolicy>,
    file_deny_patterns: Option<Vec<String>>,
}

impl GatePolicyBuilder {
    /// Set allowed schemes, replacing the defaults.
    pub fn allowed_schemes(mut self, schemes: Vec<String>) -> Self {
        self.allowed_schemes = Some(lowercase_all(schemes));
        self
    }

    /// Add an allowed scheme on top of the defaults. Used to opt into
    /// `mailto` or `tel` where the product enables them.
    pub fn allow_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.allowed_schemes
            .get_or_insert_with(|| GatePolicy::default().allowed_schemes)
            .push(scheme.into().to_ascii_lowercase());
        self
    }

    /// Set denied schemes, replacing the defaults.
    pub fn denied_schemes(mut self, schemes: Vec<String>) -> Self {
        self.denied_schemes = Some(lowercase_all(schemes));
        self
    }

    /// Add a denied scheme on top of the defaults.
    pub fn deny_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.denied_schemes
            .get_or_insert_with(|| GatePolicy::default().denied_schemes)
            .push(scheme.into().to_ascii_lowercase());
        self
    }

    pub fn max_url_length(mut self, limit: UrlLengthLimit) -> Self {
        self.max_url_length = Some(limit);
        self
    }

    pub fn max_url_chars(mut self, chars: usize) -> Result<Self, UrlLengthLimitError> {
        self.max_url_length = Some(UrlLengthLimit::new(chars)?);
        Ok(self)
    }

    /// Set the trusted loopback host set, replacing the defaults.
    pub fn loopback_hosts(mut self, hosts: Vec<String>) -> Self {
        self.loopback_hosts = Some(lowercase_all(hosts));
        self
    }

    pub fn hostname_policy(mut self, policy: HostnamePolicy) -> Self {
        self.hostname_policy = Some(policy);
        self
    }

    /// Add a `file:` deny pattern on top of the defaults.
    pub fn file_deny_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.file_deny_patterns
            .get_or_insert_with(|| GatePolicy::default().file_deny_patterns)
            .push(pattern.into());
        self
    }

    /// Set `file:` deny patterns, replacing the defaults.
    pub fn file_deny_patterns(mut self, patterns: Vec<String>) -> Self {
        self.file_deny_patterns = Some(patterns);
        self
    }

    pub fn build(self) -> GatePolicy {
        let default = GatePolicy::default();
        GatePolicy {
            allowed_schemes: self.allowed_schemes.unwrap_or(default.allowed_schemes),
            denied_schemes: self.denied_schemes.unwrap_or(default.denied_schemes),
            max_url_length: self.max_url_length.unwrap_or(default.max_url_length),
            loopback_hosts: self.loopback_hosts.unwrap_or(default.loopback_hosts),
            hostname_policy: self.hostname_policy.unwrap_or(default.hostname_policy),
            file_deny_patterns: self
                .file_deny_patterns
                .unwrap_or(default.file_deny_patterns),
        }
    }
}

fn lowercase_all(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.to_ascii_lowercase())
        .collect()
}
