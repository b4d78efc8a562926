//! Error handling for prefetch
//!
//! This module provides the error taxonomy of the planner and user-friendly error
//! reporting for the `prefetch` binary. It follows two principles:
//! 1. **Strongly-typed errors** so callers can react to a specific failure
//! 2. **User-friendly messages** with an actionable suggestion for CLI users
//!
//! # Error Categories
//!
//! - **Configuration**: [`PrefetchError::ConfigurationMissing`],
//!   [`PrefetchError::ConfigurationParseError`], [`PrefetchError::InvalidSettings`]
//! - **Fetching**: [`PrefetchError::FetchFailure`], [`PrefetchError::MalformedManifest`]
//! - **Versions**: [`PrefetchError::InvalidVersion`]
//! - **Tasks**: [`PrefetchError::TaskNotFound`], [`PrefetchError::CircularTask`],
//!   [`PrefetchError::TaskFailed`]
//!
//! An unresolvable version is deliberately *not* an error: the pipeline reports
//! it as a diagnostic and keeps going (see [`crate::resolver::UnresolvedVersion`]).
//!
//! Functions return [`anyhow::Result`] and carry a [`PrefetchError`] inside, so
//! callers can still recover the variant with `downcast_ref`.
//!
//! # Examples
//!
//! ```rust,no_run
//! use prefetch_cli::core::{PrefetchError, user_friendly_error};
//!
//! let error = PrefetchError::ConfigurationMissing {
//!     identifier: "open_jdk_jre".to_string(),
//!     path: "config/open_jdk_jre.yml".to_string(),
//! };
//! let context = user_friendly_error(anyhow::Error::from(error));
//! context.display(); // Shows colored error with suggestions
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for prefetch operations.
#[derive(Error, Debug)]
pub enum PrefetchError {
    /// A configuration document has no backing file
    #[error("Configuration '{identifier}' not found at {path}")]
    ConfigurationMissing {
        /// Identifier of the requested document (e.g. "components")
        identifier: String,
        /// Where the store looked for it
        path: String,
    },

    /// A configuration document or override is not valid YAML
    #[error("Invalid configuration '{identifier}': {reason}")]
    ConfigurationParseError {
        /// Identifier of the document that failed to parse
        identifier: String,
        /// Underlying parse failure
        reason: String,
    },

    /// A required configuration value is missing or has the wrong type
    #[error("Configuration '{identifier}' is missing required value '{key}'")]
    ConfigurationValueMissing {
        /// Identifier of the document
        identifier: String,
        /// Key that was expected
        key: String,
    },

    /// The `prefetch.toml` settings are unusable
    #[error("Invalid settings in {path}: {reason}")]
    InvalidSettings {
        /// Path of the settings file
        path: String,
        /// What is wrong with them
        reason: String,
    },

    /// The download cache could not obtain content for a URI
    #[error("Failed to fetch {uri}: {reason}")]
    FetchFailure {
        /// The URI that could not be fetched
        uri: String,
        /// Network, storage or protocol failure description
        reason: String,
    },

    /// A fetched `index.yml` is not a mapping from version to artifact URI
    #[error("Malformed version manifest {uri}: {reason}")]
    MalformedManifest {
        /// URI of the manifest
        uri: String,
        /// Why it could not be used
        reason: String,
    },

    /// A version string is not `major[.minor[.micro[_qualifier]]]`
    #[error("Invalid version '{version}': {reason}")]
    InvalidVersion {
        /// The version text
        version: String,
        /// Why it could not be parsed
        reason: String,
    },

    /// A task was invoked or referenced but never registered
    #[error("Task '{name}' is not defined")]
    TaskNotFound {
        /// Name of the missing task
        name: String,
    },

    /// The task graph contains a prerequisite cycle
    #[error("Circular task dependency detected: {chain}")]
    CircularTask {
        /// The cycle, rendered as `a → b → a`
        chain: String,
    },

    /// One or more prerequisite tasks failed while a task was invoked
    #[error("Task '{task}' failed: {failures} prerequisite task(s) did not complete")]
    TaskFailed {
        /// The invoked task
        task: String,
        /// Number of failed prerequisites
        failures: usize,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Any other error
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
    },
}

impl Clone for PrefetchError {
    fn clone(&self) -> Self {
        match self {
            Self::ConfigurationMissing {
                identifier,
                path,
            } => Self::ConfigurationMissing {
                identifier: identifier.clone(),
                path: path.clone(),
            },
            Self::ConfigurationParseError {
                identifier,
                reason,
            } => Self::ConfigurationParseError {
                identifier: identifier.clone(),
                reason: reason.clone(),
            },
            Self::ConfigurationValueMissing {
                identifier,
                key,
            } => Self::ConfigurationValueMissing {
                identifier: identifier.clone(),
                key: key.clone(),
            },
            Self::InvalidSettings {
                path,
                reason,
            } => Self::InvalidSettings {
                path: path.clone(),
                reason: reason.clone(),
            },
            Self::FetchFailure {
                uri,
                reason,
            } => Self::FetchFailure {
                uri: uri.clone(),
                reason: reason.clone(),
            },
            Self::MalformedManifest {
                uri,
                reason,
            } => Self::MalformedManifest {
                uri: uri.clone(),
                reason: reason.clone(),
            },
            Self::InvalidVersion {
                version,
                reason,
            } => Self::InvalidVersion {
                version: version.clone(),
                reason: reason.clone(),
            },
            Self::TaskNotFound {
                name,
            } => Self::TaskNotFound {
                name: name.clone(),
            },
            Self::CircularTask {
                chain,
            } => Self::CircularTask {
                chain: chain.clone(),
            },
            Self::TaskFailed {
                task,
                failures,
            } => Self::TaskFailed {
                task: task.clone(),
                failures: *failures,
            },
            // io::Error is not Clone; keep kind and message
            Self::IoError(e) => Self::IoError(std::io::Error::new(e.kind(), e.to_string())),
            Self::Other {
                message,
            } => Self::Other {
                message: message.clone(),
            },
        }
    }
}

/// Error wrapper that adds a suggestion and details for CLI display.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: PrefetchError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context without suggestion or details.
    #[must_use]
    pub const fn new(error: PrefetchError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`].
///
/// Recognizes [`PrefetchError`] anywhere in the error chain (so errors wrapped
/// with `anyhow` context are still classified), then [`std::io::Error`] and
/// YAML/TOML parse failures. Anything else becomes [`PrefetchError::Other`]
/// with the full cause chain in the message.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let mut current_error: &dyn std::error::Error = error.as_ref();
    loop {
        if let Some(prefetch_error) = current_error.downcast_ref::<PrefetchError>() {
            return create_error_context(prefetch_error.clone());
        }

        match current_error.source() {
            Some(source) => current_error = source,
            None => break,
        }
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>()
        && io_error.kind() == std::io::ErrorKind::PermissionDenied
    {
        return ErrorContext::new(PrefetchError::Other {
            message: io_error.to_string(),
        })
        .with_suggestion("Check that the cache and configuration directories are writable")
        .with_details("The planner writes fetched manifests and artifacts into the cache directory");
    }

    if let Some(yaml_error) = error.downcast_ref::<serde_yaml::Error>() {
        return ErrorContext::new(PrefetchError::Other {
            message: format!("YAML parsing error: {yaml_error}"),
        })
        .with_suggestion("Check the YAML syntax of the configuration documents");
    }

    if let Some(toml_error) = error.downcast_ref::<toml::de::Error>() {
        return ErrorContext::new(PrefetchError::Other {
            message: format!("TOML parsing error: {toml_error}"),
        })
        .with_suggestion("Check the TOML syntax in prefetch.toml");
    }

    let mut message = error.to_string();
    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(PrefetchError::Other {
        message,
    })
}

fn create_error_context(error: PrefetchError) -> ErrorContext {
    match &error {
        PrefetchError::ConfigurationMissing { identifier, path } => {
            let suggestion = format!("Create {path} or remove '{identifier}' from components.yml");
            ErrorContext::new(error)
                .with_suggestion(suggestion)
                .with_details("Every component listed in components.yml needs a configuration document")
        }
        PrefetchError::ConfigurationParseError { identifier, .. } => {
            let suggestion = format!(
                "Check the YAML syntax of '{identifier}' and of any PREFETCH_CONFIG_* override for it"
            );
            ErrorContext::new(error).with_suggestion(suggestion)
        }
        PrefetchError::ConfigurationValueMissing { identifier, key } => {
            let suggestion = format!("Add a '{key}' entry to the '{identifier}' configuration");
            ErrorContext::new(error).with_suggestion(suggestion)
        }
        PrefetchError::InvalidSettings { .. } => ErrorContext::new(error)
            .with_suggestion("Fix the reported value in prefetch.toml or remove it to use the default"),
        PrefetchError::FetchFailure { uri, .. } => {
            let details = if uri.starts_with("file://") {
                "Local repository files must exist and be readable"
            } else {
                "Manifests are fetched while planning, so a single unreachable manifest aborts the run"
            };
            ErrorContext::new(error)
                .with_suggestion("Check your network connection and that the repository root is correct")
                .with_details(details)
        }
        PrefetchError::MalformedManifest { .. } => ErrorContext::new(error)
            .with_suggestion("The repository index must be a YAML mapping of version to artifact URI")
            .with_details("Example:\n  1.2.0: https://repo.example/artifact-1.2.0.tar.gz"),
        PrefetchError::InvalidVersion { .. } => ErrorContext::new(error)
            .with_suggestion("Use versions like 1.8.0_292, or 1.8.0_+ to match the newest patch"),
        PrefetchError::TaskNotFound { .. } => ErrorContext::new(error)
            .with_suggestion("Check the package_task setting in prefetch.toml"),
        PrefetchError::CircularTask { .. } => ErrorContext::new(error)
            .with_details("Tasks cannot depend on themselves directly or indirectly"),
        PrefetchError::TaskFailed { .. } => ErrorContext::new(error)
            .with_suggestion("Re-run with --verbose to see which downloads failed")
            .with_details("Artifacts that were fetched successfully stay in the cache"),
        PrefetchError::IoError(_) | PrefetchError::Other { .. } => ErrorContext::new(error),
    }
}
