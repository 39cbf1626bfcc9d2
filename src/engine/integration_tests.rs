// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Planner, speculator and strategies against real contexts.

use crate::backends::local::LocalParticleFactory;
use crate::backends::stub::StubParticleFactory;
use crate::config::{validate_manifest, ArcwoodConfig, Manifest};
use crate::engine::{Generation, Planner, Speculator, Strategizer, StrategizerOptions, Suggestion};
use crate::errors::SpeculationError;
use crate::recipe::{Fate, ParticleNode, Recipe, ViewNode, ViewType};
use crate::runtime::{Context, Scheduler};
use crate::strategies::CreateViews;
use crate::traits::ParticleFactory;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const UPPER_MANIFEST: &str = r#"
particles:
  - name: ChangeTextCaseUpper
    implementation: change_text_case_upper
    verbs: [shout]
    description: "Uppercase ${input}"
    connections:
      - { name: input, direction: in, type: Text }
      - { name: output, direction: out, type: Text }
views:
  - id: greeting
    name: greeting
    type: Text
    data: "hello world"
recipes:
  - name: uppercase-something
    views:
      - fate: "?"
      - fate: "?"
    particles:
      - name: ChangeTextCaseUpper
        connections:
          - { name: input, view: 0 }
          - { name: output, view: 1 }
"#;

const STUB_MANIFEST: &str = r#"
particles:
  - name: Stub
    implementation: stub
    description: "Stub on ${input}"
    connections:
      - { name: input, direction: in, type: Text }
  - name: Failing
    implementation: failing
    connections:
      - { name: input, direction: in, type: Text }
  - name: Irrelevant
    implementation: irrelevant
    connections:
      - { name: input, direction: in, type: Text }
recipes:
  - name: stub
    views: [{ local_name: scratch, fate: create }]
    particles:
      - name: Stub
        connections: [{ name: input, view: 0 }]
  - name: failing
    views: [{ fate: create }]
    particles:
      - name: Failing
        connections: [{ name: input, view: 0 }]
  - name: irrelevant
    views: [{ fate: create }]
    particles:
      - name: Irrelevant
        connections: [{ name: input, view: 0 }]
"#;

/// Appended to `STUB_MANIFEST`: a seed that needs one more generation.
const OPEN_RECIPE: &str = r#"
  - name: open
    views: [{ fate: "?" }]
    particles:
      - name: Stub
        connections: [{ name: input, view: 0 }]
"#;

fn context(yaml: &str, factory: Arc<dyn ParticleFactory>) -> Arc<Context> {
    let manifest: Manifest = serde_yaml::from_str(yaml).unwrap();
    assert!(validate_manifest(&manifest, factory.as_ref()).is_empty());
    Arc::new(Context::from_manifest("ctx", &manifest, factory, Scheduler::new()).unwrap())
}

async fn suggest(planner: &mut Planner, generations: Option<&mut Vec<Generation>>) -> Vec<Suggestion> {
    tokio::time::timeout(
        Duration::from_secs(10),
        planner.suggest(Duration::from_secs(5), generations),
    )
    .await
    .unwrap()
    .unwrap()
}

#[tokio::test]
async fn test_uppercase_suggestion_end_to_end() {
    let context = context(UPPER_MANIFEST, Arc::new(LocalParticleFactory));
    let mut planner = Planner::init(Arc::clone(&context), &ArcwoodConfig::default());
    let mut generations = Vec::new();

    let suggestions = suggest(&mut planner, Some(&mut generations)).await;

    assert_eq!(suggestions.len(), 1, "{:?}", suggestions);
    let suggestion = &suggestions[0];
    assert_eq!(suggestion.description, "Uppercase greeting");
    assert_eq!(suggestion.rank, 1.0);
    assert_eq!(suggestion.hash.len(), 4);
    assert!(suggestion.plan.digest().ends_with(&suggestion.hash));
    assert_eq!(suggestion.plan.views[0].fate, Fate::Map);
    assert_eq!(suggestion.plan.views[0].id.as_deref(), Some("greeting"));
    assert_eq!(suggestion.plan.views[1].fate, Fate::Copy);

    let described: Vec<_> = generations
        .iter()
        .flat_map(|g| &g.entries)
        .filter(|e| e.description.is_some())
        .collect();
    assert_eq!(described.len(), 1);
    assert!(generations.iter().flat_map(|g| &g.entries).all(|e| !e.active));

    // Speculation never touches the original context.
    assert!(context.recipes().is_empty());
    assert_eq!(context.view("greeting").unwrap().value, json!("hello world"));
    assert_eq!(context.views_matching(&ViewType::entity("Text"), &[]).len(), 1);
    context.stop();
}

#[tokio::test]
async fn test_active_plans_are_not_suggested_again() {
    let context = context(UPPER_MANIFEST, Arc::new(LocalParticleFactory));
    let mut planner = Planner::init(Arc::clone(&context), &ArcwoodConfig::default());
    let first = suggest(&mut planner, None).await;
    context.instantiate(&first[0].plan).unwrap();
    tokio::time::timeout(Duration::from_secs(5), context.idle())
        .await
        .unwrap()
        .unwrap();

    let mut planner = Planner::init(Arc::clone(&context), &ArcwoodConfig::default());
    let mut generations = Vec::new();
    let again = suggest(&mut planner, Some(&mut generations)).await;

    let active: Vec<_> = generations
        .iter()
        .flat_map(|g| &g.entries)
        .filter(|e| e.active)
        .collect();
    assert!(!active.is_empty());
    assert!(active.iter().any(|e| e.hash.ends_with(&first[0].hash)));
    assert!(again.iter().all(|s| s.hash != first[0].hash));
    assert!(again
        .iter()
        .all(|s| s.plan.views[0].id.as_deref() != Some("greeting")));
    context.stop();
}

#[tokio::test]
async fn test_failing_and_irrelevant_plans_are_dropped() {
    let context = context(STUB_MANIFEST, Arc::new(StubParticleFactory));
    let mut planner = Planner::init(Arc::clone(&context), &ArcwoodConfig::default());

    let suggestions = suggest(&mut planner, None).await;

    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0].plan.label(), "stub");
    assert_eq!(suggestions[0].description, "Stub on scratch");
    assert_eq!(suggestions[0].rank, 1.0);
    context.stop();
}

#[tokio::test]
async fn test_search_filters_plans_not_built_from_search() {
    let cases = [("zebra", 0), ("scratch", 1), ("STUB ON", 1)];
    for (phrase, expected) in cases {
        let yaml = format!("search: \"{}\"\n{}", phrase, STUB_MANIFEST);
        let context = context(&yaml, Arc::new(StubParticleFactory));
        let mut planner = Planner::init(Arc::clone(&context), &ArcwoodConfig::default());
        let suggestions = suggest(&mut planner, None).await;
        assert_eq!(suggestions.len(), expected, "search '{}'", phrase);
        context.stop();
    }
}

#[tokio::test]
async fn test_zero_timeout_plans_one_generation() {
    let yaml = format!("{}{}", STUB_MANIFEST, OPEN_RECIPE);

    let context_a = context(&yaml, Arc::new(StubParticleFactory));
    let mut planner = Planner::init(Arc::clone(&context_a), &ArcwoodConfig::default());
    let mut generations = Vec::new();
    let plans = planner
        .plan(Duration::ZERO, Some(&mut generations))
        .await
        .unwrap();
    assert_eq!(generations.len(), 1);
    assert_eq!(generations[0].generation, 0);
    assert_eq!(generations[0].entries.len(), 4);
    assert_eq!(plans.len(), 3);

    let context_b = context(&yaml, Arc::new(StubParticleFactory));
    let mut planner = Planner::init(Arc::clone(&context_b), &ArcwoodConfig::default());
    let plans = planner.plan(Duration::from_secs(5), None).await.unwrap();
    assert_eq!(plans.len(), 4);

    context_a.stop();
    context_b.stop();
}

#[tokio::test]
async fn test_stub_plan_settles_in_one_round() {
    let context = context(STUB_MANIFEST, Arc::new(StubParticleFactory));
    let plan = context.catalog().recipes()[0].clone();
    assert!(plan.is_resolved());

    let relevance = tokio::time::timeout(
        Duration::from_secs(5),
        Speculator::default().speculate(&context, &plan, "0000"),
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(relevance.settle_rounds, 1);
    assert_eq!(relevance.relevance_map["Stub"], vec![1.0]);
    assert_eq!(relevance.description.as_deref(), Some("Stub on scratch"));
    assert!(context.recipes().is_empty());
    assert!(context.views_matching(&ViewType::entity("Text"), &[]).is_empty());
    context.stop();
}

#[tokio::test]
async fn test_failing_setup_is_a_speculation_error() {
    let context = context(STUB_MANIFEST, Arc::new(StubParticleFactory));
    let plan = context.catalog().recipes()[1].clone();

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        Speculator::default().speculate(&context, &plan, "0001"),
    )
    .await
    .unwrap();

    assert!(matches!(
        result,
        Err(SpeculationError::Channel(_)) | Err(SpeculationError::Instantiation(_))
    ));
    assert!(!context.is_stopped());
    context.stop();
}

#[tokio::test]
async fn test_create_view_resolution_from_seed() {
    let context = context(STUB_MANIFEST, Arc::new(StubParticleFactory));
    let spec = context.catalog().spec("Stub").unwrap().clone();
    let mut seed = Recipe::default();
    seed.particles.push(ParticleNode::from_spec(&spec));
    let view = seed.add_view(ViewNode::default());
    seed.connect(0, 0, view);
    assert!(!seed.is_resolved());

    let mut strategizer = Strategizer::with_seed(
        vec![Arc::new(CreateViews)],
        StrategizerOptions::default(),
        vec![seed],
    );
    assert_eq!(strategizer.generate().await.unwrap(), 1);
    let resolved = &strategizer.generated()[0].recipe;
    assert!(resolved.is_resolved());
    assert_eq!(resolved.views[0].fate, Fate::Create);

    let relevance = Speculator::default()
        .speculate(&context, resolved, "seed")
        .await
        .unwrap();
    assert_eq!(relevance.calc_relevance_score(), 1.0);
    context.stop();
}

/// `count` seeds that differ only in their view's local name.
fn many_stub_seeds(count: usize) -> String {
    let mut yaml = String::from(
        r#"
particles:
  - name: Stub
    implementation: stub
    description: "Stub on ${input}"
    connections:
      - { name: input, direction: in, type: Text }
recipes:
"#,
    );
    for i in 0..count {
        yaml.push_str(&format!(
            r#"  - name: stub-{i}
    views: [{{ local_name: scratch{i}, fate: create }}]
    particles:
      - name: Stub
        connections: [{{ name: input, view: 0 }}]
"#
        ));
    }
    yaml
}

#[tokio::test]
async fn test_suggestions_with_colliding_short_hashes_are_kept() {
    let context = context(&many_stub_seeds(20), Arc::new(StubParticleFactory));
    let mut config = ArcwoodConfig::default();
    config.suggestions.digest_suffix_length = Some(1);
    let mut planner = Planner::init(Arc::clone(&context), &config);

    let suggestions = suggest(&mut planner, None).await;

    // Twenty digests cannot fit in sixteen one-character suffixes.
    assert_eq!(suggestions.len(), 20);
    assert!(suggestions.iter().all(|s| s.hash.len() == 1));
    let digests: std::collections::HashSet<_> = suggestions.iter().map(|s| s.plan.digest()).collect();
    assert_eq!(digests.len(), 20);
    context.stop();
}

#[tokio::test]
async fn test_upper_plan_waits_for_a_second_round() {
    let context = context(UPPER_MANIFEST, Arc::new(LocalParticleFactory));
    let mut planner = Planner::init(Arc::clone(&context), &ArcwoodConfig::default());
    let plan = suggest(&mut planner, None).await[0].plan.clone();

    let relevance = tokio::time::timeout(
        Duration::from_secs(5),
        Speculator::default().speculate(&context, &plan, "upper"),
    )
    .await
    .unwrap()
    .unwrap();

    // The particle's read and write land after the first idle round trip.
    assert!(relevance.settle_rounds > 1, "settled in {}", relevance.settle_rounds);
    assert_eq!(relevance.relevance_map["ChangeTextCaseUpper"].len(), 1);
    assert_eq!(relevance.description.as_deref(), Some("Uppercase greeting"));
    context.stop();
}

#[tokio::test]
async fn test_speculation_sends_nothing_through_the_original_context() {
    let context = context(UPPER_MANIFEST, Arc::new(LocalParticleFactory));
    let mut planner = Planner::init(Arc::clone(&context), &ArcwoodConfig::default());
    let plan = suggest(&mut planner, None).await[0].plan.clone();
    let before = context.message_count();

    for hash in ["a", "b"] {
        tokio::time::timeout(
            Duration::from_secs(5),
            Speculator::default().speculate(&context, &plan, hash),
        )
        .await
        .unwrap()
        .unwrap();
    }

    assert_eq!(context.message_count(), before);
    assert!(context.recipes().is_empty());
    assert!(!context.is_stopped());
    context.stop();
}

#[tokio::test]
async fn test_create_view_resolution_for_two_particles() {
    let context = context(STUB_MANIFEST, Arc::new(StubParticleFactory));
    let spec = context.catalog().spec("Stub").unwrap().clone();
    let mut seed = Recipe::default();
    for particle in 0..2 {
        seed.particles.push(ParticleNode::from_spec(&spec));
        let view = seed.add_view(ViewNode::default());
        seed.connect(particle, 0, view);
    }
    assert!(!seed.is_resolved());

    let mut strategizer = Strategizer::with_seed(
        vec![Arc::new(CreateViews)],
        StrategizerOptions::default(),
        vec![seed],
    );
    assert_eq!(strategizer.generate().await.unwrap(), 1);
    let resolved = &strategizer.generated()[0].recipe;
    assert!(resolved.is_resolved());
    assert!(resolved.views.iter().all(|v| v.fate == Fate::Create));
    assert_eq!(resolved.view_connections(0), vec![(0, 0)]);
    assert_eq!(resolved.view_connections(1), vec![(1, 0)]);

    let relevance = Speculator::default()
        .speculate(&context, resolved, "pair")
        .await
        .unwrap();
    assert_eq!(relevance.relevance_map["Stub"], vec![1.0, 1.0]);
    assert_eq!(relevance.calc_relevance_score(), 1.0);
    context.stop();
}
