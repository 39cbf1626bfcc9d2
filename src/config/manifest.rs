// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::loader::read;
use crate::errors::ConfigError;
use crate::recipe::{ParticleSpec, Recipe, ViewType};
use serde::Deserialize;
use serde_json::Value as Json;
use std::path::Path;

/// Everything a context starts from: the particle catalog, seed recipes,
/// the views and slots already present, and an optional search phrase.
///
/// # Example
/// ```yaml
/// particles:
///   - name: ChangeTextCaseUpper
///     implementation: change_text_case_upper
///     verbs: [shout]
///     description: "Uppercase ${input}"
///     connections:
///       - { name: input, direction: in, type: Text }
///       - { name: output, direction: out, type: Text }
/// views:
///   - id: greeting
///     name: greeting
///     type: Text
///     data: "hello world"
/// slots: [root]
/// search: shout
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub particles: Vec<ParticleSpec>,
    #[serde(default)]
    pub recipes: Vec<Recipe>,
    #[serde(default)]
    pub views: Vec<ViewDeclaration>,
    #[serde(default)]
    pub slots: Vec<String>,
    #[serde(default)]
    pub search: Option<String>,
}

/// A view present in the context before planning starts.
///
/// # Fields
/// * `id` - Context-unique view id that recipes bind by
/// * `name` - Human label, used in suggestion descriptions
/// * `view_type` - Schema, `Text` or `[Text]`
/// * `tags` - Matched by tag-aware strategies
/// * `data` - Initial value; defaults to null, or an empty list for collections
#[derive(Debug, Clone, Deserialize)]
pub struct ViewDeclaration {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub view_type: ViewType,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub data: Option<Json>,
}

/// Parse a YAML manifest without validating it.
pub fn load_manifest<P: AsRef<Path>>(path: P) -> Result<Manifest, ConfigError> {
    let content = read(path.as_ref())?;
    Ok(serde_yaml::from_str(&content)?)
}
