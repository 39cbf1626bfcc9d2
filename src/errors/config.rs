// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Problems found while validating a manifest against the particle registry.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A particle spec names an implementation the registry does not provide
    UnknownImplementation {
        /// The particle spec name
        particle: String,
        /// The implementation name that could not be found
        implementation: String,
    },
    /// Two particle specs share a name
    DuplicateParticle { particle: String },
    /// Two context views share an id
    DuplicateViewId { view_id: String },
    /// A recipe refers to a particle that is not in the catalog
    UnknownParticle {
        recipe: String,
        particle: String,
    },
    /// A recipe connection points past the end of the recipe's view list
    DanglingViewIndex {
        recipe: String,
        particle: String,
        connection: String,
        index: usize,
    },
    /// A recipe connection names a connection the particle spec does not declare
    UnknownConnection {
        recipe: String,
        particle: String,
        connection: String,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::UnknownImplementation {
                particle,
                implementation,
            } => {
                write!(
                    f,
                    "Particle '{}' uses implementation '{}' which is not registered",
                    particle, implementation
                )
            }
            ValidationError::DuplicateParticle { particle } => {
                write!(f, "Duplicate particle spec: '{}'", particle)
            }
            ValidationError::DuplicateViewId { view_id } => {
                write!(f, "Duplicate view ID: '{}'", view_id)
            }
            ValidationError::UnknownParticle { recipe, particle } => {
                write!(
                    f,
                    "Recipe '{}' uses particle '{}' which is not in the catalog",
                    recipe, particle
                )
            }
            ValidationError::DanglingViewIndex {
                recipe,
                particle,
                connection,
                index,
            } => {
                write!(
                    f,
                    "Recipe '{}' binds {}.{} to view #{} which does not exist",
                    recipe, particle, connection, index
                )
            }
            ValidationError::UnknownConnection {
                recipe,
                particle,
                connection,
            } => {
                write!(
                    f,
                    "Recipe '{}' binds {}.{} but the particle declares no such connection",
                    recipe, particle, connection
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Errors from loading planner configs and manifests.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// Config files are chosen by extension: `.yaml`, `.yml` or `.toml`.
    #[error("unsupported config format '{0}'")]
    UnsupportedFormat(String),

    #[error("manifest validation failed:\n{}", format_validation_errors(.0))]
    Invalid(Vec<ValidationError>),
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|error| format!("  - {}", error))
        .collect::<Vec<_>>()
        .join("\n")
}
