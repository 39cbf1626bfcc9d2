// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The isolated side of an execution context.
//!
//! [`InnerContext`] handles controller messages. Everything it owns lives in
//! an [`Arena`] of opaque keys; the channel's reference mapper links those
//! keys to the controller's identifiers. Particles are built by implementation
//! name from a [`ParticleFactory`], never from anything received on the wire.

use crate::channel::protocol::{message, InnerThing};
use crate::channel::{ApiPort, Args, MessageHandler, Outcome, Value};
use crate::errors::ChannelError;
use crate::recipe::{Direction, ParticleSpec, ViewType};
use crate::runtime::host::{ParticleHost, ViewHandle};
use crate::traits::{Particle, ParticleFactory};
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde_json::{json, Value as Json};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::oneshot;

struct InnerView {
    view_type: ViewType,
    name: Option<String>,
}

/// Keyed storage for what the inner side hands out identifiers for. Holds no
/// particle hosts, since hosts point back at the arena.
#[derive(Default)]
pub struct Arena {
    next_key: u64,
    views: HashMap<u64, InnerView>,
    relevance: HashMap<u64, Vec<f64>>,
    callbacks: HashMap<u64, oneshot::Sender<Json>>,
}

impl Arena {
    fn next_key(&mut self) -> u64 {
        let key = self.next_key;
        self.next_key += 1;
        key
    }

    pub(crate) fn add_callback(&mut self, reply: oneshot::Sender<Json>) -> InnerThing {
        let key = self.next_key();
        self.callbacks.insert(key, reply);
        InnerThing::Callback(key)
    }

    pub(crate) fn record_relevance(&mut self, particle: u64, relevance: f64) {
        self.relevance.entry(particle).or_default().push(relevance);
    }

    fn take_relevance(&mut self) -> Vec<(u64, Vec<f64>)> {
        let mut report: Vec<(u64, Vec<f64>)> = self.relevance.drain().collect();
        report.sort_by_key(|(key, _)| *key);
        report
    }
}

/// Message handler for the inner port.
pub struct InnerContext {
    factory: Arc<dyn ParticleFactory>,
    arena: Arc<Mutex<Arena>>,
    particles: HashMap<u64, (Arc<dyn Particle>, Arc<ParticleHost>)>,
    /// Spec name to implementation name, from `DefineParticle`.
    defined: HashMap<String, String>,
    awaiting_idle: Option<Json>,
    stopped: bool,
}

impl InnerContext {
    pub fn new(factory: Arc<dyn ParticleFactory>) -> Self {
        Self {
            factory,
            arena: Arc::new(Mutex::new(Arena::default())),
            particles: HashMap::new(),
            defined: HashMap::new(),
            awaiting_idle: None,
            stopped: false,
        }
    }

    fn define_particle(&mut self, args: &Args<InnerThing>) -> Result<(), ChannelError> {
        let spec: ParticleSpec = args.literal("particle_definition")?;
        let implementation = args
            .data("particle_function")?
            .get("factory")
            .and_then(Json::as_str)
            .ok_or_else(|| ChannelError::conversion("particle_function", "missing factory name"))?;
        if !self.factory.is_implementation_available(implementation) {
            return Err(ChannelError::handler_failed(
                message::DEFINE_PARTICLE,
                format!("no implementation '{}' for particle {}", implementation, spec.name),
            ));
        }
        self.defined.insert(spec.name, implementation.to_string());
        Ok(())
    }

    fn define_view(&mut self, args: &Args<InnerThing>) -> Result<Outcome<InnerThing>, ChannelError> {
        let view_type: ViewType = args.literal("view_type")?;
        let name = args.data("name")?.as_str().map(str::to_string);
        let mut arena = self.arena.lock();
        let key = arena.next_key();
        arena.views.insert(key, InnerView { view_type, name });
        Ok(Outcome::Created(InnerThing::View(key)))
    }

    fn instantiate_particle(
        &mut self,
        port: &Arc<ApiPort<InnerThing>>,
        mut args: Args<InnerThing>,
    ) -> Result<Outcome<InnerThing>, ChannelError> {
        let spec: ParticleSpec = args.literal("spec")?;
        let implementation = self.defined.get(&spec.name).ok_or_else(|| {
            ChannelError::handler_failed(
                message::INSTANTIATE_PARTICLE,
                format!("particle {} was never defined", spec.name),
            )
        })?;
        let particle = self
            .factory
            .create_particle(implementation)
            .map_err(|e| ChannelError::handler_failed(message::INSTANTIATE_PARTICLE, e))?;

        let Value::Map(bindings) = args.take("views")? else {
            return Err(ChannelError::conversion("views", "expected a map"));
        };
        let mut views = IndexMap::with_capacity(bindings.len());
        for (connection, view) in bindings {
            let connection = connection
                .as_data()
                .and_then(Json::as_str)
                .map(str::to_string)
                .ok_or_else(|| ChannelError::conversion("views", "connection names must be strings"))?;
            let view = view
                .as_thing()
                .cloned()
                .ok_or_else(|| ChannelError::conversion("views", "expected a view"))?;
            let InnerThing::View(view_key) = &view else {
                return Err(ChannelError::conversion("views", "expected a view"));
            };
            let (view_type, view_name) = {
                let arena = self.arena.lock();
                let defined = arena.views.get(view_key).ok_or_else(|| {
                    ChannelError::handler_failed(
                        message::INSTANTIATE_PARTICLE,
                        format!("view {} was never defined", view_key),
                    )
                })?;
                (defined.view_type.clone(), defined.name.clone())
            };
            let direction = spec
                .connection(&connection)
                .map(|c| c.direction)
                .unwrap_or(Direction::InOut);
            let handle = ViewHandle::new(
                connection.clone(),
                direction,
                view_type,
                view_name,
                view,
                Arc::clone(port),
                Arc::clone(&self.arena),
            );
            views.insert(connection, handle);
        }

        let key = self.arena.lock().next_key();
        let host = Arc::new(ParticleHost::new(
            key,
            spec.name.clone(),
            Arc::clone(port),
            Arc::clone(&self.arena),
            views,
        ));
        self.particles
            .insert(key, (Arc::clone(&particle), Arc::clone(&host)));

        Ok(Outcome::Creating(Box::pin(async move {
            particle
                .setup(&host)
                .await
                .map_err(|e| ChannelError::handler_failed(message::INSTANTIATE_PARTICLE, e))?;
            Ok(InnerThing::Particle(key))
        })))
    }

    /// Run `render` or `stop_render` for the particle and slot in `args`.
    fn render_work(
        &mut self,
        port: &Arc<ApiPort<InnerThing>>,
        message_type: &'static str,
        args: &Args<InnerThing>,
    ) -> Result<(), ChannelError> {
        let InnerThing::Particle(key) = args.thing("particle")? else {
            return Err(ChannelError::conversion("particle", "expected a particle"));
        };
        let slot_name = args.str("slot_name")?.to_string();
        let (particle, host) = self.particles.get(&key).cloned().ok_or_else(|| {
            ChannelError::handler_failed(message_type, format!("no particle {}", key))
        })?;
        port.spawn_work(async move {
            let result = if message_type == message::STOP_RENDER {
                particle.stop_render(&host, &slot_name).await
            } else {
                particle.render(&host, &slot_name).await
            };
            result.map_err(|e| ChannelError::handler_failed(message_type, e))
        });
        Ok(())
    }

    fn simple_callback(&mut self, args: &Args<InnerThing>) -> Result<(), ChannelError> {
        let InnerThing::Callback(key) = args.thing("callback")? else {
            return Err(ChannelError::conversion("callback", "expected a callback"));
        };
        let data = args.data("data")?.clone();
        let reply = self.arena.lock().callbacks.remove(&key).ok_or_else(|| {
            ChannelError::handler_failed(message::SIMPLE_CALLBACK, format!("callback {} already used", key))
        })?;
        // The waiting particle may have been dropped with its context.
        let _ = reply.send(data);
        Ok(())
    }
}

impl MessageHandler<InnerThing> for InnerContext {
    fn handle(
        &mut self,
        port: &Arc<ApiPort<InnerThing>>,
        message_type: &str,
        args: Args<InnerThing>,
    ) -> Result<Outcome<InnerThing>, ChannelError> {
        match message_type {
            message::STOP => {
                self.stopped = true;
                Ok(Outcome::Done)
            }
            message::DEFINE_PARTICLE => self.define_particle(&args).map(|_| Outcome::Done),
            message::DEFINE_VIEW => self.define_view(&args),
            message::INSTANTIATE_PARTICLE => self.instantiate_particle(port, args),
            message::START_RENDER => self
                .render_work(port, message::START_RENDER, &args)
                .map(|_| Outcome::Done),
            message::STOP_RENDER => self
                .render_work(port, message::STOP_RENDER, &args)
                .map(|_| Outcome::Done),
            message::SIMPLE_CALLBACK => self.simple_callback(&args).map(|_| Outcome::Done),
            message::AWAIT_IDLE => {
                self.awaiting_idle = Some(args.data("version")?.clone());
                Ok(Outcome::Done)
            }
            other => Err(ChannelError::UnknownMessage(other.to_string())),
        }
    }

    /// Answer a pending `AwaitIdle` with the relevance gathered since the last one.
    fn on_quiet(&mut self, port: &Arc<ApiPort<InnerThing>>) -> Result<(), ChannelError> {
        let Some(version) = self.awaiting_idle.take() else {
            return Ok(());
        };
        let relevance = self
            .arena
            .lock()
            .take_relevance()
            .into_iter()
            .map(|(key, values)| (Value::Thing(InnerThing::Particle(key)), Value::data(json!(values))))
            .collect();
        port.call(
            message::IDLE,
            Args::new()
                .with("version", Value::Data(version))
                .with("relevance", Value::Map(relevance)),
        )
    }

    fn is_finished(&self) -> bool {
        self.stopped
    }
}
