// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::{json, Value as Json};

use super::{relevance_of, text_of};
use crate::errors::ParticleError;
use crate::runtime::ParticleHost;
use crate::traits::Particle;

const TEMPLATE: &str = "<span>{{text}}</span>";

/// Renders its `text` view into whatever slot it consumes.
pub struct ShowTextParticle;

impl ShowTextParticle {
    pub fn new() -> Self {
        Self
    }

    pub fn content(text: &str) -> IndexMap<String, Json> {
        IndexMap::from([
            ("template".to_string(), Json::String(TEMPLATE.to_string())),
            ("model".to_string(), json!({ "text": text })),
        ])
    }
}

impl Default for ShowTextParticle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Particle for ShowTextParticle {
    async fn setup(&self, host: &ParticleHost) -> Result<(), ParticleError> {
        let text = text_of(&host.view("text")?.get().await?);
        host.set_relevance(relevance_of(&text));
        Ok(())
    }

    async fn render(&self, host: &ParticleHost, slot_name: &str) -> Result<(), ParticleError> {
        let text = text_of(&host.view("text")?.get().await?);
        host.render(slot_name, Self::content(&text))
    }

    fn name(&self) -> &'static str {
        "show_text"
    }
}
