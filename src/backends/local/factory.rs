// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use super::particles::*;
use crate::traits::{Particle, ParticleFactory};

/// Factory for the built-in (in-process) particles.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalParticleFactory;

impl ParticleFactory for LocalParticleFactory {
    /// Create a particle by implementation name:
    /// - "change_text_case_upper" -> ChangeTextCaseParticle (uppercase)
    /// - "change_text_case_lower" -> ChangeTextCaseParticle (lowercase)
    /// - "change_text_case_proper" -> ChangeTextCaseParticle (proper case)
    /// - "change_text_case_title" -> ChangeTextCaseParticle (title case)
    /// - "reverse_text" -> ReverseTextParticle
    /// - "token_counter" -> TokenCounterParticle
    /// - "show_text" -> ShowTextParticle
    fn create_particle(&self, implementation: &str) -> Result<Arc<dyn Particle>, String> {
        match implementation {
            // Text case particles
            "change_text_case_upper" => Ok(Arc::new(ChangeTextCaseParticle::upper())),
            "change_text_case_lower" => Ok(Arc::new(ChangeTextCaseParticle::lower())),
            "change_text_case_proper" => Ok(Arc::new(ChangeTextCaseParticle::proper())),
            "change_text_case_title" => Ok(Arc::new(ChangeTextCaseParticle::title())),

            "reverse_text" => Ok(Arc::new(ReverseTextParticle::new())),
            "token_counter" => Ok(Arc::new(TokenCounterParticle::new())),
            "show_text" => Ok(Arc::new(ShowTextParticle::new())),

            _ => Err(format!("Unknown local particle implementation: '{}'", implementation)),
        }
    }

    fn list_available_implementations(&self) -> Vec<&'static str> {
        vec![
            "change_text_case_upper",
            "change_text_case_lower",
            "change_text_case_proper",
            "change_text_case_title",
            "reverse_text",
            "token_counter",
            "show_text",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::{
        Catalog, Connection, ConnectionSpec, Direction, Fate, ParticleNode, ParticleSpec, Recipe,
        SlotConnection, SlotNode, SlotSpec, ViewNode, ViewType,
    };
    use crate::runtime::{Context, Scheduler, StoredView};
    use serde_json::json;
    use std::time::Duration;

    fn text_connection(name: &str, direction: Direction) -> ConnectionSpec {
        ConnectionSpec {
            name: name.into(),
            direction,
            view_type: ViewType::entity("Text"),
            tags: vec![],
        }
    }

    fn transform_spec(implementation: &str) -> ParticleSpec {
        ParticleSpec {
            name: implementation.into(),
            implementation: implementation.into(),
            verbs: vec![],
            description: None,
            connections: vec![
                text_connection("input", Direction::In),
                text_connection("output", Direction::Out),
            ],
            slots: vec![],
        }
    }

    /// `implementation` over a `greeting` view holding `text`, writing into a new view.
    fn transform_plan(implementation: &str) -> Recipe {
        let spec = transform_spec(implementation);
        let mut recipe = Recipe::default();
        let input = recipe.add_view(ViewNode {
            id: Some("greeting".into()),
            fate: Fate::Map,
            ..ViewNode::default()
        });
        let output = recipe.add_view(ViewNode::with_fate(Fate::Create));
        recipe.particles.push(ParticleNode::from_spec(&spec));
        recipe.connect(0, 0, input);
        recipe.connect(0, 1, output);
        recipe
    }

    fn context_with_greeting(text: &str) -> Context {
        let context = Context::new(
            "local",
            Arc::new(Catalog::default()),
            Arc::new(LocalParticleFactory),
            Scheduler::new(),
        );
        context
            .add_view(StoredView {
                id: "greeting".into(),
                name: Some("greeting".into()),
                view_type: ViewType::entity("Text"),
                tags: vec![],
                value: json!(text),
            })
            .unwrap();
        context
    }

    #[test]
    fn test_create_known_particles() {
        let factory = LocalParticleFactory;
        for implementation in factory.list_available_implementations() {
            let particle = factory
                .create_particle(implementation)
                .unwrap_or_else(|e| panic!("Failed to create particle {}: {}", implementation, e));
            assert!(!particle.name().is_empty());
        }
    }

    #[test]
    fn test_create_particle_unknown_impl() {
        let result = LocalParticleFactory.create_particle("unknown_particle");
        let error_msg = result.err().unwrap();
        assert!(error_msg.contains("Unknown local particle implementation"));
    }

    #[test]
    fn test_is_implementation_available() {
        assert!(LocalParticleFactory.is_implementation_available("show_text"));
        assert!(!LocalParticleFactory.is_implementation_available("nonexistent"));
        assert!(!LocalParticleFactory.is_implementation_available(""));
    }

    #[tokio::test]
    async fn test_transform_particles_write_output_views() {
        let cases = vec![
            ("change_text_case_upper", json!("HELLO WORLD")),
            ("change_text_case_lower", json!("hello world")),
            ("reverse_text", json!("dlroW olleH")),
            (
                "token_counter",
                json!({"char_count": 11, "word_count": 2, "line_count": 1}),
            ),
        ];

        for (implementation, expected) in cases {
            let context = context_with_greeting("Hello World");
            context.instantiate(&transform_plan(implementation)).unwrap();
            let report = tokio::time::timeout(Duration::from_secs(5), context.idle())
                .await
                .unwrap()
                .unwrap();

            let output = context.recipes()[0].views[1].id.clone().unwrap();
            assert_eq!(context.view(&output).unwrap().value, expected, "{}", implementation);
            assert_eq!(report.get(implementation), Some(&vec![1.0]), "{}", implementation);
            context.stop();
        }
    }

    #[tokio::test]
    async fn test_empty_input_is_not_relevant() {
        let context = context_with_greeting("");
        context.instantiate(&transform_plan("reverse_text")).unwrap();
        let report = tokio::time::timeout(Duration::from_secs(5), context.idle())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(report.get("reverse_text"), Some(&vec![0.0]));
    }

    #[tokio::test]
    async fn test_show_text_renders_into_slot() {
        let spec = ParticleSpec {
            name: "ShowText".into(),
            implementation: "show_text".into(),
            verbs: vec![],
            description: None,
            connections: vec![text_connection("text", Direction::In)],
            slots: vec![SlotSpec { name: "root".into() }],
        };
        let mut recipe = Recipe::default();
        let view = recipe.add_view(ViewNode {
            id: Some("greeting".into()),
            fate: Fate::Use,
            ..ViewNode::default()
        });
        recipe.slots.push(SlotNode {
            name: "root".into(),
            id: Some("local:slot:root".into()),
        });
        let mut particle = ParticleNode::from_spec(&spec);
        particle.connections = vec![Connection {
            view: Some(view),
            ..Connection::unbound(&spec.connections[0])
        }];
        particle.consumed_slots = vec![SlotConnection {
            name: "root".into(),
            slot: Some(0),
        }];
        recipe.particles.push(particle);
        recipe.attach_spec(0, &spec);

        let context = context_with_greeting("hi there");
        context.instantiate(&recipe).unwrap();
        tokio::time::timeout(Duration::from_secs(5), context.idle())
            .await
            .unwrap()
            .unwrap();

        let rendered = context.rendered();
        let content = &rendered[&("ShowText".to_string(), "root".to_string())];
        assert_eq!(content["model"], json!({"text": "hi there"}));

        assert_eq!(context.stop_render("ShowText", "root").unwrap(), 1);
        tokio::time::timeout(Duration::from_secs(5), context.idle())
            .await
            .unwrap()
            .unwrap();
        assert!(context.rendered().is_empty());
        assert_eq!(context.stop_render("ShowText", "root").unwrap(), 0);
        assert_eq!(context.stop_render("ShowText", "elsewhere").unwrap(), 0);
    }
}
