// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Recipes: graphs of particles, views and slots that may still be partially
//! unresolved.
//!
//! Edges are indices. A connection names the view it is bound to by its
//! position in [`Recipe::views`], a consumed slot names its slot by position in
//! [`Recipe::slots`]. Strategies only ever append views and slots, so indices
//! held by a descendant stay valid for its own clone.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Schema of the data a view holds, written `Text` or `[Text]` for collections.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ViewType {
    pub schema: String,
    pub collection: bool,
}

impl ViewType {
    pub fn entity(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            collection: false,
        }
    }

    pub fn collection_of(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            collection: true,
        }
    }
}

impl fmt::Display for ViewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.collection {
            write!(f, "[{}]", self.schema)
        } else {
            write!(f, "{}", self.schema)
        }
    }
}

impl TryFrom<String> for ViewType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        let (schema, collection) = match trimmed
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
        {
            Some(inner) => (inner.trim(), true),
            None => (trimmed, false),
        };
        if schema.is_empty() || schema.contains(|c: char| c.is_whitespace() || c == '[' || c == ']') {
            return Err(format!("invalid view type '{}'", value));
        }
        Ok(Self {
            schema: schema.to_string(),
            collection,
        })
    }
}

impl From<ViewType> for String {
    fn from(value: ViewType) -> Self {
        value.to_string()
    }
}

/// How a recipe view relates to data already in the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fate {
    /// A new, empty view.
    Create,
    /// An existing view, read and written.
    Use,
    /// An existing view, read only.
    Map,
    /// A new view seeded from an existing one.
    Copy,
    /// Not decided yet.
    #[default]
    #[serde(rename = "?")]
    Unresolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
    InOut,
}

impl Direction {
    pub fn reads(self) -> bool {
        matches!(self, Direction::In | Direction::InOut)
    }

    pub fn writes(self) -> bool {
        matches!(self, Direction::Out | Direction::InOut)
    }
}

/// A connection a particle declares.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionSpec {
    pub name: String,
    pub direction: Direction,
    #[serde(rename = "type")]
    pub view_type: ViewType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotSpec {
    pub name: String,
}

/// Catalog entry for a particle.
///
/// `implementation` names the factory entry that builds the particle on the
/// receiving side of the channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticleSpec {
    pub name: String,
    pub implementation: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub verbs: Vec<String>,
    /// Suggestion text with `${connection}` placeholders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub connections: Vec<ConnectionSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub slots: Vec<SlotSpec>,
}

impl ParticleSpec {
    pub fn connection(&self, name: &str) -> Option<&ConnectionSpec> {
        self.connections.iter().find(|c| c.name == name)
    }
}

/// A particle connection inside a recipe. Authored recipes may leave the
/// name out and give only a type and direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub view_type: Option<ViewType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Index into [`Recipe::views`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<usize>,
}

impl Connection {
    pub fn unbound(spec: &ConnectionSpec) -> Self {
        Self {
            name: Some(spec.name.clone()),
            direction: Some(spec.direction),
            view_type: Some(spec.view_type.clone()),
            tags: spec.tags.clone(),
            view: None,
        }
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name)
    }

    /// Whether `spec` could stand behind this connection: directions agree
    /// where known and the bound type matches the declared one.
    pub fn fits(&self, spec: &ConnectionSpec, view_type: Option<&ViewType>) -> bool {
        self.direction.map_or(true, |d| d == spec.direction)
            && self
                .view_type
                .as_ref()
                .or(view_type)
                .map_or(true, |t| *t == spec.view_type)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotConnection {
    pub name: String,
    /// Index into [`Recipe::slots`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParticleNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Set on particles that only say what they should do.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verb: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<ParticleSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub connections: Vec<Connection>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub consumed_slots: Vec<SlotConnection>,
}

impl ParticleNode {
    pub fn from_spec(spec: &ParticleSpec) -> Self {
        Self {
            name: Some(spec.name.clone()),
            verb: None,
            spec: Some(spec.clone()),
            connections: spec.connections.iter().map(Connection::unbound).collect(),
            consumed_slots: spec
                .slots
                .iter()
                .map(|slot| SlotConnection {
                    name: slot.name.clone(),
                    slot: None,
                })
                .collect(),
        }
    }

    pub fn connection(&self, name: &str) -> Option<&Connection> {
        self.connections.iter().find(|c| c.is_named(name))
    }

    pub fn connection_index(&self, name: &str) -> Option<usize> {
        self.connections.iter().position(|c| c.is_named(name))
    }

    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.verb.as_deref())
            .unwrap_or("<unnamed>")
    }

    fn is_resolved(&self) -> bool {
        self.spec.is_some()
            && self
                .connections
                .iter()
                .all(|c| c.name.is_some() && c.view.is_some() && c.direction.is_some())
            && self.consumed_slots.iter().all(|s| s.slot.is_some())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_name: Option<String>,
    /// Id of the context view this node refers to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub fate: Fate,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub view_type: Option<ViewType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl ViewNode {
    pub fn with_fate(fate: Fate) -> Self {
        Self {
            fate,
            ..Self::default()
        }
    }

    fn is_resolved(&self) -> bool {
        self.view_type.is_some()
            && match self.fate {
                Fate::Unresolved => false,
                Fate::Create => true,
                Fate::Use | Fate::Map | Fate::Copy => self.id.is_some(),
            }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// One end of a connection constraint, `particle.connection`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConstraintEnd {
    pub particle: String,
    pub connection: String,
}

/// "These two connections must share a view", with no view chosen yet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionConstraint {
    pub from: ConstraintEnd,
    pub to: ConstraintEnd,
}

/// Free-text request that strategies turn into particles token by token.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Search {
    pub phrase: String,
    #[serde(default)]
    pub unresolved_tokens: Vec<String>,
    #[serde(default)]
    pub resolved_tokens: Vec<String>,
    /// Tokens no catalog particle answered to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignored_tokens: Vec<String>,
}

impl Search {
    pub fn new(phrase: &str) -> Self {
        Self {
            phrase: phrase.to_string(),
            unresolved_tokens: phrase
                .split_whitespace()
                .map(str::to_lowercase)
                .collect(),
            resolved_tokens: Vec::new(),
            ignored_tokens: Vec::new(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.unresolved_tokens.is_empty()
    }

    /// The resolve step moved at least one token onto a particle.
    pub fn contributed(&self) -> bool {
        !self.resolved_tokens.is_empty()
    }
}

/// How many connections to a view read, write, or have no known direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DirectionCounts {
    pub reads: usize,
    pub writes: usize,
    pub unknown: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Recipe {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub particles: Vec<ParticleNode>,
    #[serde(default)]
    pub views: Vec<ViewNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub slots: Vec<SlotNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<ConnectionConstraint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<Search>,
}

impl Recipe {
    pub fn with_search(phrase: &str) -> Self {
        Self {
            search: Some(Search::new(phrase)),
            ..Self::default()
        }
    }

    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("<anonymous>")
    }

    /// A recipe is a plan when it can be instantiated as is.
    pub fn is_resolved(&self) -> bool {
        !self.particles.is_empty()
            && self.constraints.is_empty()
            && self.search.as_ref().map_or(true, Search::is_resolved)
            && self.particles.iter().all(ParticleNode::is_resolved)
            && self
                .views
                .iter()
                .enumerate()
                .all(|(index, view)| view.is_resolved() && !self.view_connections(index).is_empty())
            && self.slots.iter().all(|slot| slot.id.is_some())
    }

    /// BLAKE3 hex digest of the recipe's canonical JSON form.
    pub fn digest(&self) -> String {
        // Plain data with string keys only; serialization cannot fail.
        let canonical = serde_json::to_vec(self).unwrap_or_default();
        blake3::hash(&canonical).to_hex().to_string()
    }

    /// `(particle, connection)` index pairs bound to `view`.
    pub fn view_connections(&self, view: usize) -> Vec<(usize, usize)> {
        self.particles
            .iter()
            .enumerate()
            .flat_map(|(p, particle)| {
                particle
                    .connections
                    .iter()
                    .enumerate()
                    .filter(move |(_, c)| c.view == Some(view))
                    .map(move |(c, _)| (p, c))
            })
            .collect()
    }

    pub fn direction_counts(&self, view: usize) -> DirectionCounts {
        let mut counts = DirectionCounts::default();
        for (p, c) in self.view_connections(view) {
            match self.particles[p].connections[c].direction {
                Some(direction) => {
                    if direction.reads() {
                        counts.reads += 1;
                    }
                    if direction.writes() {
                        counts.writes += 1;
                    }
                }
                None => counts.unknown += 1,
            }
        }
        counts
    }

    pub fn add_view(&mut self, view: ViewNode) -> usize {
        self.views.push(view);
        self.views.len() - 1
    }

    /// Bind a connection to a view; an untyped view takes the connection's type.
    pub fn connect(&mut self, particle: usize, connection: usize, view: usize) {
        let Some(conn) = self
            .particles
            .get_mut(particle)
            .and_then(|p| p.connections.get_mut(connection))
        else {
            return;
        };
        conn.view = Some(view);
        let view_type = conn.view_type.clone();
        if let Some(node) = self.views.get_mut(view) {
            if node.view_type.is_none() {
                node.view_type = view_type;
            }
        }
    }

    pub fn particle_by_name(&self, name: &str) -> Option<usize> {
        self.particles
            .iter()
            .position(|p| p.name.as_deref() == Some(name))
    }

    /// Fill a particle's connections and slots from its spec. Connections the
    /// recipe already declared keep their bindings.
    pub fn attach_spec(&mut self, particle: usize, spec: &ParticleSpec) {
        let Some(node) = self.particles.get_mut(particle) else {
            return;
        };
        node.name = Some(spec.name.clone());
        node.verb = None;
        for declared in &spec.connections {
            match node.connections.iter_mut().find(|c| c.is_named(&declared.name)) {
                Some(existing) => {
                    existing.direction.get_or_insert(declared.direction);
                    existing
                        .view_type
                        .get_or_insert_with(|| declared.view_type.clone());
                    if existing.tags.is_empty() {
                        existing.tags = declared.tags.clone();
                    }
                }
                None => node.connections.push(Connection::unbound(declared)),
            }
        }
        for slot in &spec.slots {
            if !node.consumed_slots.iter().any(|s| s.name == slot.name) {
                node.consumed_slots.push(SlotConnection {
                    name: slot.name.clone(),
                    slot: None,
                });
            }
        }
        node.spec = Some(spec.clone());

        let bound: Vec<(usize, Option<ViewType>)> = node
            .connections
            .iter()
            .filter_map(|c| c.view.map(|v| (v, c.view_type.clone())))
            .collect();
        for (view, view_type) in bound {
            if let Some(node) = self.views.get_mut(view) {
                if node.view_type.is_none() {
                    node.view_type = view_type;
                }
            }
        }
    }

    /// Append `other`'s particles, views and slots, reusing views and slots
    /// that refer to the same context ids.
    pub fn merge(&mut self, other: &Recipe) {
        let view_map: Vec<usize> = other
            .views
            .iter()
            .map(|view| {
                let existing = view.id.as_ref().and_then(|id| {
                    self.views
                        .iter()
                        .position(|v| v.id.as_ref() == Some(id))
                });
                existing.unwrap_or_else(|| self.add_view(view.clone()))
            })
            .collect();
        let slot_map: Vec<usize> = other
            .slots
            .iter()
            .map(|slot| {
                let existing = slot
                    .id
                    .as_ref()
                    .and_then(|id| self.slots.iter().position(|s| s.id.as_ref() == Some(id)));
                existing.unwrap_or_else(|| {
                    self.slots.push(slot.clone());
                    self.slots.len() - 1
                })
            })
            .collect();
        for particle in &other.particles {
            let mut particle = particle.clone();
            for connection in &mut particle.connections {
                connection.view = connection.view.and_then(|v| view_map.get(v).copied());
            }
            for slot in &mut particle.consumed_slots {
                slot.slot = slot.slot.and_then(|s| slot_map.get(s).copied());
            }
            self.particles.push(particle);
        }
    }
}
