// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Built-in particles. All of them work on text views and report relevance
//! 1.0 when they had text to work with, 0.0 otherwise.

pub mod change_text_case;
pub mod reverse_text;
pub mod show_text;
pub mod token_counter;

pub use change_text_case::{CaseType, ChangeTextCaseParticle};
pub use reverse_text::ReverseTextParticle;
pub use show_text::ShowTextParticle;
pub use token_counter::TokenCounterParticle;

use serde_json::Value as Json;

/// Text held by a view: a string, an entity's `text` field, or nothing.
pub fn text_of(value: &Json) -> String {
    match value {
        Json::Null => String::new(),
        Json::String(text) => text.clone(),
        Json::Object(fields) => fields.get("text").map(text_of).unwrap_or_default(),
        other => other.to_string(),
    }
}

pub(crate) fn relevance_of(text: &str) -> f64 {
    if text.trim().is_empty() {
        0.0
    } else {
        1.0
    }
}
