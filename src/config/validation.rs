// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Manifest validation against the particle factory.
//!
//! Checks run in order and every problem is collected, so one pass reports
//! all of them:
//!
//! 1. **Particle specs**: names are unique and every `implementation` is one
//!    the factory can build
//! 2. **Context views**: ids are unique
//! 3. **Seed recipes**: named particles exist in the catalog, connections
//!    name connections the particle declares, and view indices are in range
//!
//! Recipes may leave particles unnamed (verb only) and views unresolved; the
//! planner fills those in, so they are not problems here.

use crate::config::manifest::{load_manifest, Manifest};
use crate::errors::{ConfigError, ValidationError};
use crate::observability::messages::validation::{
    ValidationFinished, ValidationProblem, ValidationStarted,
};
use crate::observability::messages::StructuredLog;
use crate::traits::ParticleFactory;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Every problem found in `manifest`; empty when it is usable.
pub fn validate_manifest(manifest: &Manifest, factory: &dyn ParticleFactory) -> Vec<ValidationError> {
    ValidationStarted {
        particle_count: manifest.particles.len(),
        recipe_count: manifest.recipes.len(),
    }
    .log();

    let mut errors = Vec::new();
    validate_particles(manifest, factory, &mut errors);
    validate_view_ids(manifest, &mut errors);
    validate_recipes(manifest, &mut errors);

    for error in &errors {
        ValidationProblem { problem: error }.log();
    }
    ValidationFinished {
        particle_count: manifest.particles.len(),
        error_count: errors.len(),
    }
    .log();
    errors
}

/// Load a manifest and fail with every validation problem at once.
pub fn load_and_validate_manifest<P: AsRef<Path>>(
    path: P,
    factory: &dyn ParticleFactory,
) -> Result<Manifest, ConfigError> {
    let manifest = load_manifest(path)?;
    let errors = validate_manifest(&manifest, factory);
    if errors.is_empty() {
        Ok(manifest)
    } else {
        Err(ConfigError::Invalid(errors))
    }
}

fn validate_particles(
    manifest: &Manifest,
    factory: &dyn ParticleFactory,
    errors: &mut Vec<ValidationError>,
) {
    let mut seen = HashSet::new();
    for spec in &manifest.particles {
        if !seen.insert(spec.name.as_str()) {
            errors.push(ValidationError::DuplicateParticle {
                particle: spec.name.clone(),
            });
        }
        if !factory.is_implementation_available(&spec.implementation) {
            errors.push(ValidationError::UnknownImplementation {
                particle: spec.name.clone(),
                implementation: spec.implementation.clone(),
            });
        }
    }
}

fn validate_view_ids(manifest: &Manifest, errors: &mut Vec<ValidationError>) {
    let mut seen = HashSet::new();
    for view in &manifest.views {
        if !seen.insert(view.id.as_str()) {
            errors.push(ValidationError::DuplicateViewId {
                view_id: view.id.clone(),
            });
        }
    }
}

fn validate_recipes(manifest: &Manifest, errors: &mut Vec<ValidationError>) {
    let specs: HashMap<&str, _> = manifest
        .particles
        .iter()
        .map(|spec| (spec.name.as_str(), spec))
        .collect();

    for recipe in &manifest.recipes {
        let label = recipe.label();
        for particle in &recipe.particles {
            let spec = match &particle.name {
                Some(name) => match specs.get(name.as_str()) {
                    Some(spec) => Some(*spec),
                    None => {
                        errors.push(ValidationError::UnknownParticle {
                            recipe: label.to_string(),
                            particle: name.clone(),
                        });
                        None
                    }
                },
                None => None,
            };
            for connection in &particle.connections {
                // Unnamed connections are named by the planner.
                let name = connection.name.as_deref();
                if let (Some(spec), Some(name)) = (spec, name) {
                    if spec.connection(name).is_none() {
                        errors.push(ValidationError::UnknownConnection {
                            recipe: label.to_string(),
                            particle: spec.name.clone(),
                            connection: name.to_string(),
                        });
                    }
                }
                if let Some(index) = connection.view {
                    if index >= recipe.views.len() {
                        errors.push(ValidationError::DanglingViewIndex {
                            recipe: label.to_string(),
                            particle: particle.display_name().to_string(),
                            connection: name.unwrap_or("<unnamed>").to_string(),
                            index,
                        });
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::local::LocalParticleFactory;
    use std::io::Write;

    fn manifest(yaml: &str) -> Manifest {
        serde_yaml::from_str(yaml).unwrap()
    }

    const VALID: &str = r#"
particles:
  - name: Reverse
    implementation: reverse_text
    connections:
      - { name: input, direction: in, type: Text }
      - { name: output, direction: out, type: Text }
recipes:
  - views: [{ fate: "?" }, { fate: "?" }]
    particles:
      - name: Reverse
        connections:
          - { name: input, view: 0 }
          - { name: output, view: 1 }
      - verb: display
views:
  - { id: greeting, type: Text }
"#;

    #[test]
    fn test_valid_manifest() {
        let errors = validate_manifest(&manifest(VALID), &LocalParticleFactory);
        assert!(errors.is_empty(), "{:?}", errors);
    }

    #[test]
    fn test_each_problem_is_reported() {
        let yaml = r#"
particles:
  - { name: Reverse, implementation: reverse_text }
  - { name: Reverse, implementation: reverse_text }
  - { name: Mystery, implementation: does_not_exist }
recipes:
  - name: broken
    views: [{ fate: "?" }]
    particles:
      - name: Ghost
      - name: Reverse
        connections:
          - { name: sideways, view: 0 }
          - { name: input, view: 7 }
views:
  - { id: greeting, type: Text }
  - { id: greeting, type: Text }
"#;
        let errors = validate_manifest(&manifest(yaml), &LocalParticleFactory);

        let expected = vec![
            ValidationError::DuplicateParticle { particle: "Reverse".into() },
            ValidationError::UnknownImplementation {
                particle: "Mystery".into(),
                implementation: "does_not_exist".into(),
            },
            ValidationError::DuplicateViewId { view_id: "greeting".into() },
            ValidationError::UnknownParticle { recipe: "broken".into(), particle: "Ghost".into() },
            ValidationError::UnknownConnection {
                recipe: "broken".into(),
                particle: "Reverse".into(),
                connection: "sideways".into(),
            },
            ValidationError::UnknownConnection {
                recipe: "broken".into(),
                particle: "Reverse".into(),
                connection: "input".into(),
            },
            ValidationError::DanglingViewIndex {
                recipe: "broken".into(),
                particle: "Reverse".into(),
                connection: "input".into(),
                index: 7,
            },
        ];
        assert_eq!(errors, expected);
    }

    #[test]
    fn test_load_and_validate_manifest() {
        let mut good = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        good.write_all(VALID.as_bytes()).unwrap();
        assert!(load_and_validate_manifest(good.path(), &LocalParticleFactory).is_ok());

        let mut bad = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        bad.write_all(b"particles: [{ name: X, implementation: nope }]").unwrap();
        match load_and_validate_manifest(bad.path(), &LocalParticleFactory) {
            Err(ConfigError::Invalid(errors)) => assert_eq!(errors.len(), 1),
            other => panic!("expected Invalid, got {:?}", other.map(|_| ())),
        }
    }
}
