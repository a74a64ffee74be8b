/// A non-fatal problem detected while loading the configuration.
///
/// Warnings are collected during parsing and reported once at startup;
/// the offending entry is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    /// The configuration source (e.g., "konfsave.ini").
    pub source: String,
    /// The specific section or key that triggered the warning.
    pub item: String,
    /// Human-readable warning message.
    pub message: String,
}

impl ConfigWarning {
    /// Create a warning about `item` in `source`.
    #[must_use]
    pub fn new(
        source: impl Into<String>,
        item: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            item: item.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]: {}", self.source, self.item, self.message)
    }
}
