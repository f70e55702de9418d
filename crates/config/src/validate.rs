//! Semantic checks on a loaded configuration.

use crate::schema::RosterConfig;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "resolver.draw_character"
    pub path: String,
    pub message: String,
}

/// Result of validating a configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    fn push(&mut self, severity: Severity, path: &str, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity,
            path: path.to_string(),
            message: message.into(),
        });
    }
}

/// Check trigger words, action tags and channel credentials.
pub fn validate(config: &RosterConfig) -> ValidationResult {
    let mut result = ValidationResult::default();
    let resolver = &config.resolver;

    let triggers = [
        ("resolver.draw_character", &resolver.draw_character),
        ("resolver.draw_wallpaper", &resolver.draw_wallpaper),
        ("resolver.list_characters", &resolver.list_characters),
    ];
    for (i, (path, value)) in triggers.iter().enumerate() {
        if value.trim().is_empty() {
            result.push(Severity::Error, path, "trigger word must not be empty");
            continue;
        }
        if let Some((other, _)) = triggers[..i].iter().find(|(_, v)| v == value) {
            result.push(
                Severity::Error,
                path,
                format!("trigger word \"{value}\" is already used by {other}"),
            );
        }
    }

    for (path, value) in [
        ("resolver.intro_action", &resolver.intro_action),
        ("resolver.wallpaper_action", &resolver.wallpaper_action),
        ("resolver.wallpaper_prefix", &resolver.wallpaper_prefix),
    ] {
        if value.trim().is_empty() {
            result.push(Severity::Error, path, "must not be empty");
        }
    }

    if config.content.path.as_os_str().is_empty() {
        result.push(Severity::Error, "content.path", "content table path is empty");
    }

    if !config.line.has_token() {
        result.push(
            Severity::Warning,
            "line.channel_access_token",
            "no channel access token; replies cannot be delivered",
        );
    }

    result
}
