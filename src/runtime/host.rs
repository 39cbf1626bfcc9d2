// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! What a particle sees of its execution context.
//!
//! View data lives on the controller side. Reads are a `ViewGet` or
//! `ViewToList` round trip answered by a `SimpleCallback`; writes are
//! fire-and-forget calls.

use crate::channel::protocol::{message, InnerThing};
use crate::channel::{ApiPort, Args, Value};
use crate::errors::ParticleError;
use crate::recipe::{Direction, ViewType};
use crate::runtime::inner::Arena;
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde_json::Value as Json;
use std::sync::Arc;
use tokio::sync::oneshot;

/// One connection of a particle, bound to a view.
pub struct ViewHandle {
    connection: String,
    direction: Direction,
    view_type: ViewType,
    view_name: Option<String>,
    view: InnerThing,
    port: Arc<ApiPort<InnerThing>>,
    arena: Arc<Mutex<Arena>>,
}

impl ViewHandle {
    pub(crate) fn new(
        connection: String,
        direction: Direction,
        view_type: ViewType,
        view_name: Option<String>,
        view: InnerThing,
        port: Arc<ApiPort<InnerThing>>,
        arena: Arc<Mutex<Arena>>,
    ) -> Self {
        Self {
            connection,
            direction,
            view_type,
            view_name,
            view,
            port,
            arena,
        }
    }

    pub fn connection(&self) -> &str {
        &self.connection
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn view_type(&self) -> &ViewType {
        &self.view_type
    }

    pub fn view_name(&self) -> Option<&str> {
        self.view_name.as_deref()
    }

    pub async fn get(&self) -> Result<Json, ParticleError> {
        self.read(message::VIEW_GET).await
    }

    /// Entries of a collection view. An entity view lists its value, if set.
    pub async fn to_list(&self) -> Result<Vec<Json>, ParticleError> {
        match self.read(message::VIEW_TO_LIST).await? {
            Json::Array(items) => Ok(items),
            other => Err(ParticleError::Failed(format!(
                "{} replied with {} instead of a list",
                message::VIEW_TO_LIST,
                other
            ))),
        }
    }

    async fn read(&self, message_type: &str) -> Result<Json, ParticleError> {
        if !self.direction.reads() {
            return Err(ParticleError::NotReadable(self.connection.clone()));
        }
        let (reply, answer) = oneshot::channel();
        let callback = self.arena.lock().add_callback(reply);
        self.port.call(
            message_type,
            Args::new()
                .with("view", Value::Thing(self.view.clone()))
                .with("callback", Value::Thing(callback)),
        )?;
        answer.await.map_err(|_| ParticleError::Disconnected)
    }

    pub fn set(&self, data: Json) -> Result<(), ParticleError> {
        self.write(message::VIEW_SET, Some(data))
    }

    /// Append to a collection view.
    pub fn store(&self, data: Json) -> Result<(), ParticleError> {
        self.write(message::VIEW_STORE, Some(data))
    }

    /// Drop entries equal to `data`, or with the same `id` field.
    pub fn remove(&self, data: Json) -> Result<(), ParticleError> {
        self.write(message::VIEW_REMOVE, Some(data))
    }

    pub fn clear(&self) -> Result<(), ParticleError> {
        self.write(message::VIEW_CLEAR, None)
    }

    fn write(&self, message_type: &str, data: Option<Json>) -> Result<(), ParticleError> {
        if !self.direction.writes() {
            return Err(ParticleError::NotWritable(self.connection.clone()));
        }
        let mut args = Args::new().with("view", Value::Thing(self.view.clone()));
        if let Some(data) = data {
            args.insert("data", Value::Data(data));
        }
        self.port.call(message_type, args)?;
        Ok(())
    }
}

pub struct ParticleHost {
    key: u64,
    name: String,
    port: Arc<ApiPort<InnerThing>>,
    arena: Arc<Mutex<Arena>>,
    views: IndexMap<String, ViewHandle>,
}

impl ParticleHost {
    pub(crate) fn new(
        key: u64,
        name: String,
        port: Arc<ApiPort<InnerThing>>,
        arena: Arc<Mutex<Arena>>,
        views: IndexMap<String, ViewHandle>,
    ) -> Self {
        Self {
            key,
            name,
            port,
            arena,
            views,
        }
    }

    /// Name of the particle definition this instance was created from.
    pub fn particle_name(&self) -> &str {
        &self.name
    }

    pub fn view(&self, connection: &str) -> Result<&ViewHandle, ParticleError> {
        self.views
            .get(connection)
            .ok_or_else(|| ParticleError::UnknownConnection(connection.to_string()))
    }

    pub fn connections(&self) -> impl Iterator<Item = &str> {
        self.views.keys().map(String::as_str)
    }

    /// Record one relevance observation, reported with the next idle reply.
    pub fn set_relevance(&self, relevance: f64) {
        self.arena.lock().record_relevance(self.key, relevance);
    }

    /// Send rendered content for `slot_name`. Only valid after setup returned,
    /// since the particle has no identifier before that.
    pub fn render(&self, slot_name: &str, content: IndexMap<String, Json>) -> Result<(), ParticleError> {
        let content = content
            .into_iter()
            .map(|(key, value)| (key, Value::Data(value)))
            .collect();
        self.port.call(
            message::RENDER,
            Args::new()
                .with("particle", Value::Thing(InnerThing::Particle(self.key)))
                .with("slot_name", Value::data(slot_name))
                .with("content", Value::Dict(content)),
        )?;
        Ok(())
    }
}
