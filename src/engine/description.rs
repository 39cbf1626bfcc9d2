// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::recipe::{ParticleNode, Recipe};
use crate::runtime::Context;

/// Human-readable summary of an instantiated recipe.
///
/// Each particle contributes its spec's description with `${connection}`
/// placeholders replaced by a label for the bound view: the context view's
/// name, else the recipe's local name, else its schema. Particles without a
/// description contribute their name.
pub fn describe(recipe: &Recipe, context: &Context) -> String {
    recipe
        .particles
        .iter()
        .map(|particle| describe_particle(recipe, particle, context))
        .collect::<Vec<_>>()
        .join(" and ")
}

fn describe_particle(recipe: &Recipe, particle: &ParticleNode, context: &Context) -> String {
    let Some(template) = particle.spec.as_ref().and_then(|s| s.description.as_deref()) else {
        return particle.display_name().to_string();
    };
    let mut text = template.to_string();
    for connection in &particle.connections {
        let Some(name) = connection.name.as_deref() else {
            continue;
        };
        let placeholder = format!("${{{}}}", name);
        if !text.contains(&placeholder) {
            continue;
        }
        let label = connection
            .view
            .and_then(|index| recipe.views.get(index))
            .and_then(|view| {
                view.id
                    .as_deref()
                    .and_then(|id| context.view(id))
                    .and_then(|stored| stored.name)
                    .or_else(|| view.local_name.clone())
                    .or_else(|| view.view_type.as_ref().map(|t| t.schema.clone()))
            })
            .unwrap_or_else(|| name.to_string());
        text = text.replace(&placeholder, &label);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::StubParticleFactory;
    use crate::recipe::{Catalog, ConnectionSpec, Direction, Fate, ParticleSpec, ViewNode, ViewType};
    use crate::runtime::Scheduler;
    use std::sync::Arc;

    fn spec(name: &str, description: Option<&str>) -> ParticleSpec {
        ParticleSpec {
            name: name.into(),
            implementation: "stub".into(),
            verbs: vec![],
            description: description.map(str::to_string),
            connections: vec![
                ConnectionSpec {
                    name: "input".into(),
                    direction: Direction::In,
                    view_type: ViewType::entity("Text"),
                    tags: vec![],
                },
                ConnectionSpec {
                    name: "output".into(),
                    direction: Direction::Out,
                    view_type: ViewType::entity("Text"),
                    tags: vec![],
                },
            ],
            slots: vec![],
        }
    }

    #[tokio::test]
    async fn test_describe_labels_views() {
        let context = Context::new(
            "ctx",
            Arc::new(Catalog::default()),
            Arc::new(StubParticleFactory),
            Scheduler::new(),
        );
        let greeting = context.create_view(ViewType::entity("Text"), Some("greeting".into()), vec![]);

        let mut recipe = Recipe::default();
        recipe.particles.push(ParticleNode::from_spec(&spec(
            "Upper",
            Some("Uppercase ${input} into ${output}"),
        )));
        recipe.particles.push(ParticleNode::from_spec(&spec("Quiet", None)));
        let named = recipe.add_view(ViewNode {
            id: Some(greeting),
            fate: Fate::Map,
            ..ViewNode::default()
        });
        let local = recipe.add_view(ViewNode {
            local_name: Some("shout".into()),
            ..ViewNode::with_fate(Fate::Create)
        });
        let schema_only = recipe.add_view(ViewNode::with_fate(Fate::Create));
        recipe.connect(0, 0, named);
        recipe.connect(0, 1, local);
        recipe.connect(1, 0, schema_only);

        assert_eq!(
            describe(&recipe, &context),
            "Uppercase greeting into shout and Quiet"
        );

        recipe.particles[0].connections[1].view = Some(schema_only);
        assert_eq!(
            describe(&recipe, &context),
            "Uppercase greeting into Text and Quiet"
        );
        context.stop();
    }
}
