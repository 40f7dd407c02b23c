//! Prompt-injection guard
//!
//! A best-effort heuristic, not a security boundary: it catches the common
//! phrasings of role impersonation and "ignore your instructions" attacks.
//! False negatives are expected. The trait exists so a stronger classifier can
//! replace the pattern list without touching the pipeline.

/// Decides whether a piece of text looks like an attempt to manipulate the model
pub trait InjectionGuard: Send + Sync {
    fn is_suspicious(&self, text: &str) -> bool;
}

/// Known manipulation phrases, matched case-insensitively by containment
pub const DEFAULT_PATTERNS: &[&str] = &[
    "ignore previous instructions",
    "ignore the system message",
    "disregard previous instructions",
    "you are now",
    "act as",
    "system:",
    "assistant:",
];

/// Lower-cases input and checks it against a fixed phrase list
#[derive(Debug, Clone)]
pub struct PatternGuard {
    patterns: Vec<String>,
}

impl PatternGuard {
    /// Guard with a custom phrase list
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| p.as_ref().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }
}

impl Default for PatternGuard {
    fn default() -> Self {
        Self::new(DEFAULT_PATTERNS)
    }
}

impl InjectionGuard for PatternGuard {
    fn is_suspicious(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        let hit = self.patterns.iter().find(|p| lowered.contains(p.as_str()));
        if let Some(pattern) = hit {
            tracing::warn!("Injection pattern matched: {:?}", pattern);
        }
        hit.is_some()
    }
}
