//! Threat pattern catalog: the detection rules applied to every candidate URL.
//!
//! Patterns are compiled once and shared read-only across callers. All builtin
//! patterns are short literals or near-literals; combined with the regex
//! engine's linear-time matching and the policy length cap, scanning cost is
//! bounded for any input.

use crate::verdict::Severity;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

/// One detection rule: a compiled case-insensitive pattern, a stable label
/// used as the threat indicator, and a severity hint.
#[derive(Debug, Clone)]
pub struct ThreatPattern {
    regex: Regex,
    label: String,
    severity: Severity,
    scheme_smuggling: bool,
}

impl ThreatPattern {
    pub fn new(
        pattern: &str,
        label: impl Into<String>,
        severity: Severity,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            label: label.into(),
            severity,
            scheme_smuggling: false,
        })
    }

    /// A pattern that matches a dangerous scheme prefix anywhere in the text.
    /// When such a match sits at offset 0 of the raw string it is the URL's
    /// own scheme, which the protocol classifier handles instead.
    fn smuggled_scheme(
        pattern: &str,
        label: impl Into<String>,
        severity: Severity,
    ) -> Result<Self, regex::Error> {
        let mut p = Self::new(pattern, label, severity)?;
        p.scheme_smuggling = true;
        Ok(p)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub(crate) fn is_scheme_smuggling(&self) -> bool {
        self.scheme_smuggling
    }
}

/// A pattern match found by [`ThreatCatalog::scan`].
#[derive(Debug, Clone, Copy)]
pub struct PatternHit<'a> {
    pub pattern: &'a ThreatPattern,
    /// Byte offset of the first match in the scanned text.
    pub offset: usize,
}

/// Immutable, ordered set of threat patterns.
#[derive(Debug)]
pub struct ThreatCatalog {
    patterns: Vec<ThreatPattern>,
}

static BUILTIN: Lazy<Arc<ThreatCatalog>> = Lazy::new(|| Arc::new(ThreatCatalog::builtin()));

impl ThreatCatalog {
    pub fn new(patterns: Vec<ThreatPattern>) -> Self {
        Self { patterns }
    }

    /// The builtin catalog: script injection, inline event handlers, `eval`,
    /// dangerous scheme prefixes anywhere in the string, and percent-encoded
    /// markup characters.
    pub fn builtin() -> Self {
        let patterns = vec![
            ThreatPattern::new(r"(?i)<script", "script-tag", Severity::Critical),
            ThreatPattern::new(
                r"(?i)\bon[a-z]+\s*=",
                "event-handler-attribute",
                Severity::Critical,
            ),
            ThreatPattern::new(r"(?i)eval\(", "eval-call", Severity::Critical),
            ThreatPattern::smuggled_scheme(
                r"(?i)javascript:",
                "javascript-protocol",
                Severity::Critical,
            ),
            ThreatPattern::smuggled_scheme(r"(?i)data:", "data-protocol", Severity::Critical),
            ThreatPattern::smuggled_scheme(
                r"(?i)vbscript:",
                "vbscript-protocol",
                Severity::Critical,
            ),
            ThreatPattern::new(r"(?i)%3c", "encoded-angle-open", Severity::High),
            ThreatPattern::new(r"(?i)%3e", "encoded-angle-close", Severity::High),
            ThreatPattern::new(r"(?i)%22", "encoded-double-quote", Severity::High),
            ThreatPattern::new(r"(?i)%27", "encoded-single-quote", Severity::High),
        ];

        let patterns = patterns
            .into_iter()
            .collect::<Result<Vec<_>, _>>()
            .expect("builtin threat patterns must compile");

        Self::new(patterns)
    }

    /// Process-wide shared builtin catalog.
    pub fn shared() -> Arc<ThreatCatalog> {
        Arc::clone(&BUILTIN)
    }

    pub fn patterns(&self) -> &[ThreatPattern] {
        &self.patterns
    }

    /// Find every pattern that matches `text`, reporting the first match
    /// offset per pattern.
    pub fn scan<'a>(&'a self, text: &str) -> Vec<PatternHit<'a>> {
        self.patterns
            .iter()
            .filter_map(|pattern| {
                pattern.regex.find(text).map(|m| PatternHit {
                    pattern,
                    offset: m.start(),
                })
            })
            .collect()
    }
}
