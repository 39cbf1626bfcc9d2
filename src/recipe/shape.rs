// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Does a plan describe something already running in a context?
//!
//! A plan matches when each of its particles maps to a distinct active particle
//! with the same name, and connections with the same name land on views that
//! map consistently. Views the plan binds by id (`use`, `map`) must map to the
//! active view with that id; `create` and `copy` views get fresh ids on
//! instantiation, so only their position in the graph counts.

use crate::recipe::model::{Fate, Recipe};
use std::collections::HashMap;

pub fn matches_active(active: &Recipe, plan: &Recipe) -> bool {
    if plan.particles.is_empty() || plan.particles.len() > active.particles.len() {
        return false;
    }
    let mut used = vec![false; active.particles.len()];
    let mut views = HashMap::new();
    assign(active, plan, 0, &mut used, &mut views)
}

fn assign(
    active: &Recipe,
    plan: &Recipe,
    particle: usize,
    used: &mut [bool],
    views: &mut HashMap<usize, usize>,
) -> bool {
    let Some(wanted) = plan.particles.get(particle) else {
        return true;
    };
    for (candidate, node) in active.particles.iter().enumerate() {
        if used[candidate] || node.name != wanted.name {
            continue;
        }
        let mut trial = views.clone();
        if !bind_connections(active, plan, particle, candidate, &mut trial) {
            continue;
        }
        used[candidate] = true;
        if assign(active, plan, particle + 1, used, &mut trial) {
            *views = trial;
            return true;
        }
        used[candidate] = false;
    }
    false
}

fn bind_connections(
    active: &Recipe,
    plan: &Recipe,
    plan_particle: usize,
    active_particle: usize,
    views: &mut HashMap<usize, usize>,
) -> bool {
    let wanted = &plan.particles[plan_particle];
    let node = &active.particles[active_particle];
    for connection in &wanted.connections {
        let Some(plan_view) = connection.view else {
            continue;
        };
        let Some(active_view) = connection
            .name
            .as_deref()
            .and_then(|name| node.connection(name))
            .and_then(|c| c.view)
        else {
            return false;
        };
        if let Some(mapped) = views.get(&plan_view) {
            if *mapped != active_view {
                return false;
            }
            continue;
        }
        if views.values().any(|v| *v == active_view) {
            return false;
        }
        let plan_node = &plan.views[plan_view];
        if matches!(plan_node.fate, Fate::Use | Fate::Map)
            && plan_node.id != active.views[active_view].id
        {
            return false;
        }
        views.insert(plan_view, active_view);
    }
    true
}
