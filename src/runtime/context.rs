// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Execution contexts, controller side.
//!
//! A [`Context`] owns the view data, the record of instantiated plans and one
//! end of a message channel. The other end is an [`InnerContext`] served on
//! its own task, so the two sides share nothing but serialized messages.
//!
//! ```text
//!   Context ──instantiate──▶ outer port ══ JSON text ══▶ inner port ──▶ particles
//!      ▲                          │                           │
//!      └── ViewStore ◀── ViewGet/ToList/Set/Store/Remove/Clear, Render, Idle ┘
//! ```

use crate::channel::protocol::{inner_port, message, outer_port, OuterThing};
use crate::channel::transport::Endpoint;
use crate::channel::{ApiPort, Args, MessageChannel, MessageHandler, Outcome, Value};
use crate::config::manifest::Manifest;
use crate::errors::{ChannelError, ContextError};
use crate::observability::messages::channel::{PortClosed, ProtocolViolation};
use crate::observability::messages::context::{
    ContextStopped, PlanInstantiated, RenderStopped, SlotRendered,
};
use crate::observability::messages::StructuredLog;
use crate::recipe::{Catalog, Fate, Recipe, Search, SlotNode, ViewType};
use crate::runtime::inner::InnerContext;
use crate::runtime::scheduler::{Scheduler, ViewListener};
use crate::runtime::store::{StoredView, ViewStore};
use crate::traits::ParticleFactory;
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde_json::{json, Value as Json};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

/// Relevance observations per particle name, from one idle round trip.
pub type IdleReport = IndexMap<String, Vec<f64>>;

#[derive(Default)]
struct ContextState {
    store: ViewStore,
    /// Instantiated particle key to particle name.
    particles: IndexMap<u64, String>,
    next_particle: u64,
    /// Specs already sent with `DefineParticle`.
    defined: HashSet<String>,
    rendered: IndexMap<(String, String), Json>,
    /// `(particle key, slot name)` pairs sent `StartRender` and not stopped.
    rendering: Vec<(u64, String)>,
    listeners: Vec<ViewListener>,
    recipes: Vec<Recipe>,
    active: Recipe,
    next_idle_version: u64,
    idle_waiters: HashMap<u64, oneshot::Sender<IdleReport>>,
}

/// The two serve tasks of one channel. Dropping it tears both down.
struct Pec {
    port: Arc<ApiPort<OuterThing>>,
    cancel: CancellationToken,
}

impl Pec {
    fn spawn(
        id: &str,
        factory: Arc<dyn ParticleFactory>,
        state: Arc<Mutex<ContextState>>,
        scheduler: Arc<Scheduler>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let (outer, inner) = MessageChannel::pair(id);
        let Endpoint {
            transport: outer_transport,
            inbound: outer_inbound,
        } = outer;
        let Endpoint {
            transport: inner_transport,
            inbound: inner_inbound,
        } = inner;

        let outer_port = Arc::new(outer_port(&format!("{}/outer", id), outer_transport, cancel.clone()));
        let inner_port = Arc::new(inner_port(&format!("{}/inner", id), inner_transport, cancel.clone()));

        let mut inner_handler = InnerContext::new(factory);
        let inner_cancel = cancel.clone();
        let inner_serving = Arc::clone(&inner_port);
        tokio::spawn(async move {
            if let Err(error) = Arc::clone(&inner_serving).serve(inner_inbound, &mut inner_handler).await {
                ProtocolViolation {
                    port: inner_serving.name(),
                    error: &error,
                }
                .log();
                inner_cancel.cancel();
            }
        });

        let mut outer_handler = OuterHandler {
            context: id.to_string(),
            state: Arc::clone(&state),
            scheduler,
        };
        let outer_cancel = cancel.clone();
        let outer_serving = Arc::clone(&outer_port);
        tokio::spawn(async move {
            if let Err(error) = Arc::clone(&outer_serving).serve(outer_inbound, &mut outer_handler).await {
                ProtocolViolation {
                    port: outer_serving.name(),
                    error: &error,
                }
                .log();
                outer_cancel.cancel();
            }
            PortClosed {
                port: outer_serving.name(),
                message_count: outer_serving.message_count(),
            }
            .log();
            // Fails every idle() still waiting on this channel.
            state.lock().idle_waiters.clear();
        });

        Self {
            port: outer_port,
            cancel,
        }
    }
}

impl Drop for Pec {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Handles messages the inner side sends to the controller.
struct OuterHandler {
    context: String,
    state: Arc<Mutex<ContextState>>,
    scheduler: Arc<Scheduler>,
}

impl OuterHandler {
    fn view_id(args: &Args<OuterThing>) -> Result<String, ChannelError> {
        match args.thing("view")? {
            OuterThing::View(id) => Ok(id),
            other => Err(ChannelError::conversion("view", format!("expected a view, found {:?}", other))),
        }
    }

    fn particle_name(&self, thing: OuterThing) -> Result<String, ChannelError> {
        let OuterThing::Particle(key) = thing else {
            return Err(ChannelError::conversion("particle", "expected a particle"));
        };
        self.state
            .lock()
            .particles
            .get(&key)
            .cloned()
            .ok_or_else(|| ChannelError::MissingThing(format!("particle {}", key)))
    }

    fn mutate(
        &mut self,
        message_type: &str,
        args: &Args<OuterThing>,
    ) -> Result<Outcome<OuterThing>, ChannelError> {
        let view = Self::view_id(args)?;
        let (event, listeners) = {
            let mut state = self.state.lock();
            let event = match message_type {
                message::VIEW_SET => state.store.set(&view, args.data("data")?.clone()),
                message::VIEW_STORE => state.store.store(&view, args.data("data")?.clone()),
                message::VIEW_REMOVE => state.store.remove(&view, args.data("data")?.clone()),
                _ => state.store.clear(&view),
            }
            .map_err(|e| ChannelError::handler_failed(message_type, e))?;
            (event, state.listeners.clone())
        };
        self.scheduler.enqueue(listeners, event);
        Ok(Outcome::Done)
    }
}

impl MessageHandler<OuterThing> for OuterHandler {
    fn handle(
        &mut self,
        port: &Arc<ApiPort<OuterThing>>,
        message_type: &str,
        args: Args<OuterThing>,
    ) -> Result<Outcome<OuterThing>, ChannelError> {
        match message_type {
            message::VIEW_GET | message::VIEW_TO_LIST => {
                let view = Self::view_id(&args)?;
                let data = {
                    let state = self.state.lock();
                    if message_type == message::VIEW_GET {
                        state.store.get(&view).map(|v| v.value.clone()).ok_or_else(|| {
                            ChannelError::handler_failed(message_type, format!("no view {}", view))
                        })?
                    } else {
                        let items = state
                            .store
                            .list(&view)
                            .map_err(|e| ChannelError::handler_failed(message_type, e))?;
                        Json::Array(items)
                    }
                };
                port.call(
                    message::SIMPLE_CALLBACK,
                    Args::new()
                        .with("callback", args.get("callback")?.clone())
                        .with("data", Value::Data(data)),
                )?;
                Ok(Outcome::Done)
            }
            message::VIEW_SET | message::VIEW_STORE | message::VIEW_REMOVE | message::VIEW_CLEAR => {
                self.mutate(message_type, &args)
            }
            message::RENDER => {
                let thing = args.thing("particle")?;
                let particle = self.particle_name(thing.clone())?;
                let slot = args.str("slot_name")?.to_string();
                let OuterThing::Particle(key) = thing else {
                    return Err(ChannelError::conversion("particle", "expected a particle"));
                };
                // Content arriving after StopRender is dropped.
                if !self
                    .state
                    .lock()
                    .rendering
                    .iter()
                    .any(|(k, s)| *k == key && *s == slot)
                {
                    return Ok(Outcome::Done);
                }
                let Value::Dict(content) = args.get("content")? else {
                    return Err(ChannelError::conversion("content", "expected a dictionary"));
                };
                let content: serde_json::Map<String, Json> = content
                    .iter()
                    .filter_map(|(key, value)| value.as_data().map(|data| (key.clone(), data.clone())))
                    .collect();
                SlotRendered {
                    context: &self.context,
                    particle: &particle,
                    slot: &slot,
                }
                .log();
                self.state
                    .lock()
                    .rendered
                    .insert((particle, slot), Json::Object(content));
                Ok(Outcome::Done)
            }
            message::IDLE => {
                let version = args
                    .data("version")?
                    .as_u64()
                    .ok_or_else(|| ChannelError::conversion("version", "expected an integer"))?;
                let Value::Map(pairs) = args.get("relevance")? else {
                    return Err(ChannelError::conversion("relevance", "expected a map"));
                };
                let mut report = IdleReport::new();
                for (particle, values) in pairs {
                    let particle = particle
                        .as_thing()
                        .cloned()
                        .ok_or_else(|| ChannelError::conversion("relevance", "expected a particle key"))?;
                    let name = self.particle_name(particle)?;
                    let values: Vec<f64> = values
                        .as_data()
                        .and_then(|data| serde_json::from_value(data.clone()).ok())
                        .ok_or_else(|| ChannelError::conversion("relevance", "expected a list of numbers"))?;
                    report.entry(name).or_default().extend(values);
                }
                if let Some(waiter) = self.state.lock().idle_waiters.remove(&version) {
                    let _ = waiter.send(report);
                }
                Ok(Outcome::Done)
            }
            other => Err(ChannelError::UnknownMessage(other.to_string())),
        }
    }
}

pub struct Context {
    id: String,
    catalog: Arc<Catalog>,
    factory: Arc<dyn ParticleFactory>,
    scheduler: Arc<Scheduler>,
    state: Arc<Mutex<ContextState>>,
    search: Mutex<Option<Search>>,
    slots: Vec<SlotNode>,
    speculative_clones: Arc<AtomicU64>,
    pec: Pec,
}

impl Context {
    /// Start an empty context. Must be called inside a tokio runtime.
    pub fn new(
        id: impl Into<String>,
        catalog: Arc<Catalog>,
        factory: Arc<dyn ParticleFactory>,
        scheduler: Arc<Scheduler>,
    ) -> Self {
        let id = id.into();
        let state = Arc::new(Mutex::new(ContextState::default()));
        let pec = Pec::spawn(&id, Arc::clone(&factory), Arc::clone(&state), Arc::clone(&scheduler));
        Self {
            id,
            catalog,
            factory,
            scheduler,
            state,
            search: Mutex::new(None),
            slots: Vec::new(),
            speculative_clones: Arc::new(AtomicU64::new(0)),
            pec,
        }
    }

    /// Context seeded with a manifest's catalog, views, slots and search.
    pub fn from_manifest(
        id: impl Into<String>,
        manifest: &Manifest,
        factory: Arc<dyn ParticleFactory>,
        scheduler: Arc<Scheduler>,
    ) -> Result<Self, ContextError> {
        let catalog = Arc::new(Catalog::new(manifest.particles.clone(), manifest.recipes.clone()));
        let mut context = Self::new(id, catalog, factory, scheduler);
        for view in &manifest.views {
            context.add_view(StoredView {
                id: view.id.clone(),
                name: view.name.clone(),
                view_type: view.view_type.clone(),
                tags: view.tags.clone(),
                value: view.data.clone().unwrap_or(if view.view_type.collection {
                    json!([])
                } else {
                    Json::Null
                }),
            })?;
        }
        context.slots = manifest
            .slots
            .iter()
            .map(|name| SlotNode {
                name: name.clone(),
                id: Some(format!("{}:slot:{}", context.id, name)),
            })
            .collect();
        if let Some(phrase) = &manifest.search {
            context.set_search(Some(Search::new(phrase)));
        }
        Ok(context)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }

    pub fn add_view(&self, view: StoredView) -> Result<(), ContextError> {
        self.state.lock().store.insert(view)
    }

    /// Empty view owned by this context.
    pub fn create_view(&self, view_type: ViewType, name: Option<String>, tags: Vec<String>) -> String {
        self.state.lock().store.create(&self.id, view_type, name, tags)
    }

    pub fn view(&self, id: &str) -> Option<StoredView> {
        self.state.lock().store.get(id).cloned()
    }

    /// Context views of `view_type` that carry every tag in `tags`.
    pub fn views_matching(&self, view_type: &ViewType, tags: &[String]) -> Vec<StoredView> {
        self.state
            .lock()
            .store
            .find(view_type, tags)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn slots(&self) -> &[SlotNode] {
        &self.slots
    }

    pub fn search(&self) -> Option<Search> {
        self.search.lock().clone()
    }

    pub fn set_search(&self, search: Option<Search>) {
        *self.search.lock() = search;
    }

    /// Called for every view change, after it is applied.
    pub fn on_view_change(&self, listener: ViewListener) {
        self.state.lock().listeners.push(listener);
    }

    /// Everything instantiated so far, merged into one recipe.
    pub fn active_recipe(&self) -> Recipe {
        self.state.lock().active.clone()
    }

    /// Plans in instantiation order, with context view ids filled in.
    pub fn recipes(&self) -> Vec<Recipe> {
        self.state.lock().recipes.clone()
    }

    pub fn last_recipe(&self) -> Option<Recipe> {
        self.state.lock().recipes.last().cloned()
    }

    /// Latest content per `(particle, slot)`.
    pub fn rendered(&self) -> IndexMap<(String, String), Json> {
        self.state.lock().rendered.clone()
    }

    /// Inbound messages the controller side has dispatched.
    pub fn message_count(&self) -> u64 {
        self.pec.port.message_count()
    }

    /// Instantiate a resolved plan: bind its views to context views, then
    /// send the particles across the channel. A plan this context cannot run
    /// is rejected before any view is created or any message is sent.
    pub fn instantiate(&self, plan: &Recipe) -> Result<(), ContextError> {
        if !plan.is_resolved() {
            return Err(ContextError::UnresolvedPlan(plan.label().to_string()));
        }
        self.check_particles(plan)?;
        let mut plan = plan.clone();
        let port = &self.pec.port;

        {
            let mut state = self.state.lock();
            check_views(&state.store, &plan)?;
            for view in plan.views.iter_mut() {
                let Some(view_type) = view.view_type.clone() else {
                    continue;
                };
                match view.fate {
                    Fate::Create => {
                        let id = state
                            .store
                            .create(&self.id, view_type, view.local_name.clone(), view.tags.clone());
                        view.id = Some(id);
                    }
                    Fate::Copy => {
                        let source_id = view.id.as_deref().unwrap_or_default();
                        let source = state
                            .store
                            .get(source_id)
                            .cloned()
                            .ok_or_else(|| ContextError::UnknownView(source_id.to_string()))?;
                        let id = state
                            .store
                            .create(&self.id, view_type, source.name.clone(), source.tags.clone());
                        state.store.set(&id, source.value)?;
                        view.id = Some(id);
                    }
                    Fate::Use | Fate::Map | Fate::Unresolved => {}
                }
            }
        }

        for view in &plan.views {
            let Some(id) = view.id.clone() else { continue };
            let Some(stored) = self.view(&id) else {
                return Err(ContextError::UnknownView(id));
            };
            port.initialize(
                message::DEFINE_VIEW,
                OuterThing::View(id),
                Args::new()
                    .with("view_type", Value::literal(&stored.view_type)?)
                    .with("name", Value::data(stored.name.map_or(Json::Null, Json::String))),
            )?;
        }

        for particle in &plan.particles {
            let spec = particle
                .spec
                .as_ref()
                .ok_or_else(|| ContextError::MissingSpec(particle.display_name().to_string()))?;
            let first_definition = self.state.lock().defined.insert(spec.name.clone());
            if first_definition {
                port.call(
                    message::DEFINE_PARTICLE,
                    Args::new()
                        .with("particle_definition", Value::literal(spec)?)
                        .with("particle_function", Value::data(json!({ "factory": spec.implementation }))),
                )?;
            }

            let mut bindings = Vec::with_capacity(particle.connections.len());
            for connection in &particle.connections {
                let name = connection.name.clone().unwrap_or_default();
                let id = connection
                    .view
                    .and_then(|v| plan.views.get(v))
                    .and_then(|v| v.id.clone())
                    .ok_or_else(|| ContextError::UnknownView(name.clone()))?;
                bindings.push((Value::data(name), Value::Thing(OuterThing::View(id))));
            }

            let key = {
                let mut state = self.state.lock();
                let key = state.next_particle;
                state.next_particle += 1;
                state.particles.insert(key, spec.name.clone());
                key
            };
            port.initialize(
                message::INSTANTIATE_PARTICLE,
                OuterThing::Particle(key),
                Args::new()
                    .with("spec", Value::literal(spec)?)
                    .with("views", Value::Map(bindings)),
            )?;

            for consumed in &particle.consumed_slots {
                let Some(slot) = consumed.slot.and_then(|s| plan.slots.get(s)) else {
                    continue;
                };
                self.state.lock().rendering.push((key, slot.name.clone()));
                port.call(
                    message::START_RENDER,
                    Args::new()
                        .with("particle", Value::Thing(OuterThing::Particle(key)))
                        .with("slot_name", Value::data(slot.name.as_str()))
                        .with("content_types", Value::List(vec![Value::data("template"), Value::data("model")])),
                )?;
            }
        }

        PlanInstantiated {
            context: &self.id,
            particle_count: plan.particles.len(),
            view_count: plan.views.len(),
        }
        .log();
        let mut state = self.state.lock();
        state.active.merge(&plan);
        state.recipes.push(plan);
        Ok(())
    }

    /// Tell every instance of `particle` rendering into `slot` to stop, and
    /// forget what it rendered there. Returns how many were stopped.
    pub fn stop_render(&self, particle: &str, slot: &str) -> Result<usize, ContextError> {
        let stopped: Vec<u64> = {
            let mut state = self.state.lock();
            let keys: Vec<u64> = state
                .rendering
                .iter()
                .filter(|(key, s)| s == slot && state.particles.get(key).is_some_and(|n| n == particle))
                .map(|(key, _)| *key)
                .collect();
            state
                .rendering
                .retain(|(key, s)| !(s == slot && keys.contains(key)));
            if !keys.is_empty() {
                state.rendered.shift_remove(&(particle.to_string(), slot.to_string()));
            }
            keys
        };
        for key in &stopped {
            self.pec.port.call(
                message::STOP_RENDER,
                Args::new()
                    .with("particle", Value::Thing(OuterThing::Particle(*key)))
                    .with("slot_name", Value::data(slot)),
            )?;
            RenderStopped {
                context: &self.id,
                particle,
                slot,
            }
            .log();
        }
        Ok(stopped.len())
    }

    fn check_particles(&self, plan: &Recipe) -> Result<(), ContextError> {
        for particle in &plan.particles {
            let spec = particle
                .spec
                .as_ref()
                .ok_or_else(|| ContextError::MissingSpec(particle.display_name().to_string()))?;
            if !self.factory.is_implementation_available(&spec.implementation) {
                return Err(ContextError::MissingImplementation {
                    particle: spec.name.clone(),
                    implementation: spec.implementation.clone(),
                });
            }
        }
        Ok(())
    }

    /// Fresh context with this one's data snapshot, its own channel and inner
    /// side. Nothing done to the clone is visible here.
    pub fn clone_for_speculative_execution(&self) -> Context {
        let n = self.speculative_clones.fetch_add(1, Ordering::SeqCst);
        let id = format!("{}-speculative{}", self.id, n);
        let state = {
            let original = self.state.lock();
            ContextState {
                store: original.store.clone(),
                recipes: original.recipes.clone(),
                active: original.active.clone(),
                ..ContextState::default()
            }
        };
        let state = Arc::new(Mutex::new(state));
        let pec = Pec::spawn(
            &id,
            Arc::clone(&self.factory),
            Arc::clone(&state),
            Arc::clone(&self.scheduler),
        );
        Context {
            id,
            catalog: Arc::clone(&self.catalog),
            factory: Arc::clone(&self.factory),
            scheduler: Arc::clone(&self.scheduler),
            state,
            search: Mutex::new(self.search()),
            slots: self.slots.clone(),
            speculative_clones: Arc::clone(&self.speculative_clones),
            pec,
        }
    }

    /// Resolves once the inner side has nothing queued or running, with the
    /// relevance its particles reported since the previous call.
    pub async fn idle(&self) -> Result<IdleReport, ContextError> {
        if self.is_stopped() {
            return Err(ContextError::Channel(ChannelError::Closed(self.id.clone())));
        }
        let (waiter, report) = oneshot::channel();
        let version = {
            let mut state = self.state.lock();
            let version = state.next_idle_version;
            state.next_idle_version += 1;
            state.idle_waiters.insert(version, waiter);
            version
        };
        self.pec
            .port
            .call(message::AWAIT_IDLE, Args::new().with("version", Value::data(version)))?;
        report
            .await
            .map_err(|_| ContextError::Channel(ChannelError::Closed(self.id.clone())))
    }

    pub fn stop(&self) {
        // The inner side may already be gone after a protocol violation.
        let _ = self.pec.port.call(message::STOP, Args::new());
        ContextStopped {
            context: &self.id,
            message_count: self.message_count(),
        }
        .log();
        self.pec.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.pec.cancel.is_cancelled()
    }
}

/// Every view is typed and every view taken from the context exists.
fn check_views(store: &ViewStore, plan: &Recipe) -> Result<(), ContextError> {
    for view in &plan.views {
        if view.view_type.is_none() {
            return Err(ContextError::UnknownView(format!("{:?} has no type", view.local_name)));
        }
        match view.fate {
            Fate::Create => {}
            Fate::Use | Fate::Map | Fate::Copy => {
                let id = view.id.as_deref().unwrap_or_default();
                if store.get(id).is_none() {
                    return Err(ContextError::UnknownView(id.to_string()));
                }
            }
            Fate::Unresolved => return Err(ContextError::UnresolvedPlan(plan.label().to_string())),
        }
    }
    Ok(())
}
