//! Errors with context and suggestions for CLI commands

use std::fmt;
use std::path::Path;

/// An error with helpful context and suggestions
#[derive(Debug)]
pub struct HelpfulError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
}

impl HelpfulError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_suggestions(
        mut self,
        suggestions: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.suggestions.extend(suggestions.into_iter().map(|s| s.into()));
        self
    }

    // === Common error constructors ===

    pub fn step_not_found(path: &Path) -> Self {
        Self::new(format!("Step definition not found: {}", path.display()))
            .with_context("Expected an XML file with an <entry> step node")
            .with_suggestions([
                format!("TRY: Check that the file exists: ls -la {}", path.display()),
                "TRY: Check for typos in the path".to_string(),
            ])
    }

    pub fn config_not_found(path: &Path) -> Self {
        Self::new(format!("Config file not found: {}", path.display()))
            .with_context("An explicit --config path must exist")
            .with_suggestion("TRY: Omit --config to use ~/.sinkpath/config.toml or defaults")
    }

    pub fn cluster_not_registered(name: &str, known: &[String]) -> Self {
        let err = Self::new(format!("Cluster not registered: '{}'", name))
            .with_context("The cluster registry has no definition under this name")
            .with_suggestion("TRY: List registered clusters: sinkpath clusters");
        if known.is_empty() {
            err.with_suggestion("TRY: Add a [[cluster]] entry to ~/.sinkpath/clusters.toml")
        } else {
            err.with_suggestion(format!("TRY: Known clusters: {}", known.join(", ")))
        }
    }

    pub fn invalid_variable(raw: &str) -> Self {
        Self::new(format!("Invalid variable: '{}'", raw))
            .with_context("Variables are passed as KEY=VALUE")
            .with_suggestion("TRY: --var DAY=2024-01-01")
    }
}

impl fmt::Display for HelpfulError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ERROR: {}", self.message)?;

        if let Some(ctx) = &self.context {
            writeln!(f, "CONTEXT: {}", ctx)?;
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            for suggestion in &self.suggestions {
                writeln!(f, "  {}", suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for HelpfulError {}
