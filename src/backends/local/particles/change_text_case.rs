// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use super::{relevance_of, text_of};
use crate::errors::ParticleError;
use crate::runtime::ParticleHost;
use crate::traits::Particle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseType {
    Upper,
    Lower,
    Proper,
    Title,
}

impl CaseType {
    pub fn apply(self, input: &str) -> String {
        match self {
            CaseType::Upper => input.to_uppercase(),
            CaseType::Lower => input.to_lowercase(),
            CaseType::Proper => input
                .split_whitespace()
                .map(capitalize)
                .collect::<Vec<_>>()
                .join(" "),
            CaseType::Title => input
                .split_whitespace()
                .enumerate()
                .map(|(i, word)| {
                    let lower_word = word.to_lowercase();
                    // Small words stay lowercase unless they lead
                    if i > 0 && is_small_word(&lower_word) {
                        lower_word
                    } else {
                        capitalize(word)
                    }
                })
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
    }
}

fn is_small_word(word: &str) -> bool {
    matches!(
        word,
        "a" | "an" | "the" | "and" | "or" | "but" | "in" | "on" | "at" | "to" | "for" | "of" | "with" | "by"
    )
}

/// Reads `input`, writes the re-cased text to `output`.
pub struct ChangeTextCaseParticle {
    case_type: CaseType,
}

impl ChangeTextCaseParticle {
    pub fn new(case_type: CaseType) -> Self {
        Self { case_type }
    }

    pub fn upper() -> Self {
        Self::new(CaseType::Upper)
    }

    pub fn lower() -> Self {
        Self::new(CaseType::Lower)
    }

    pub fn proper() -> Self {
        Self::new(CaseType::Proper)
    }

    pub fn title() -> Self {
        Self::new(CaseType::Title)
    }
}

#[async_trait]
impl Particle for ChangeTextCaseParticle {
    async fn setup(&self, host: &ParticleHost) -> Result<(), ParticleError> {
        let input = text_of(&host.view("input")?.get().await?);
        host.view("output")?
            .set(Json::String(self.case_type.apply(&input)))?;
        host.set_relevance(relevance_of(&input));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "change_text_case"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_types() {
        let cases = vec![
            (CaseType::Upper, "hello World", "HELLO WORLD"),
            (CaseType::Lower, "HELLO World", "hello world"),
            (CaseType::Proper, "hello wORLD", "Hello World"),
            (CaseType::Title, "the lord of the rings", "The Lord of the Rings"),
            (CaseType::Upper, "", ""),
        ];
        for (case_type, input, expected) in cases {
            assert_eq!(case_type.apply(input), expected, "{:?} on '{}'", case_type, input);
        }
    }
}
