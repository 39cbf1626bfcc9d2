// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The execution context protocol.
//!
//! The controller side (outer) and the isolated execution context (inner)
//! register mirror images of the same message set. Calls on one side are
//! handlers on the other with identical schemas.

use crate::channel::converter::Converter;
use crate::channel::port::{schema, ApiPort};
use crate::channel::transport::Transport;
use crate::recipe::{ParticleSpec, ViewType};
use tokio_util::sync::CancellationToken;

pub const OUTER_PREFIX: &str = "o";
pub const INNER_PREFIX: &str = "i";

/// Message type names.
pub mod message {
    pub const STOP: &str = "Stop";
    pub const DEFINE_PARTICLE: &str = "DefineParticle";
    pub const DEFINE_VIEW: &str = "DefineView";
    pub const INSTANTIATE_PARTICLE: &str = "InstantiateParticle";
    pub const START_RENDER: &str = "StartRender";
    pub const STOP_RENDER: &str = "StopRender";
    pub const SIMPLE_CALLBACK: &str = "SimpleCallback";
    pub const AWAIT_IDLE: &str = "AwaitIdle";

    pub const VIEW_GET: &str = "ViewGet";
    pub const VIEW_TO_LIST: &str = "ViewToList";
    pub const VIEW_SET: &str = "ViewSet";
    pub const VIEW_STORE: &str = "ViewStore";
    pub const VIEW_REMOVE: &str = "ViewRemove";
    pub const VIEW_CLEAR: &str = "ViewClear";
    pub const RENDER: &str = "Render";
    pub const IDLE: &str = "Idle";
}

/// Objects the controller side refers to across the channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OuterThing {
    /// A context view, by view id.
    View(String),
    /// An instantiated particle, by context-local key.
    Particle(u64),
}

/// Objects inside the execution context, by arena key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InnerThing {
    View(u64),
    Particle(u64),
    Callback(u64),
}

pub fn outer_port(
    name: &str,
    transport: impl Transport + 'static,
    cancel: CancellationToken,
) -> ApiPort<OuterThing> {
    use message::*;
    let mut port = ApiPort::new(name, OUTER_PREFIX, transport, cancel);

    port.register_call(STOP, schema([]));
    port.register_call(
        DEFINE_PARTICLE,
        schema([
            ("particle_definition", Converter::by_representation::<ParticleSpec>()),
            ("particle_function", Converter::Stringified),
        ]),
    );
    port.register_redundant_initializer(
        DEFINE_VIEW,
        schema([
            ("view_type", Converter::by_representation::<ViewType>()),
            ("name", Converter::Direct),
        ]),
    );
    port.register_initializer(
        INSTANTIATE_PARTICLE,
        schema([
            ("spec", Converter::by_representation::<ParticleSpec>()),
            ("views", Converter::keyed_map(Converter::Direct, Converter::Mapped)),
        ]),
    );
    port.register_call(
        START_RENDER,
        schema([
            ("particle", Converter::Mapped),
            ("slot_name", Converter::Direct),
            ("content_types", Converter::list(Converter::Direct)),
        ]),
    );
    port.register_call(
        STOP_RENDER,
        schema([("particle", Converter::Mapped), ("slot_name", Converter::Direct)]),
    );
    port.register_call(
        SIMPLE_CALLBACK,
        schema([("callback", Converter::Direct), ("data", Converter::Direct)]),
    );
    port.register_call(AWAIT_IDLE, schema([("version", Converter::Direct)]));

    port.register_handler(
        VIEW_GET,
        schema([("view", Converter::Mapped), ("callback", Converter::Direct)]),
    );
    port.register_handler(
        VIEW_TO_LIST,
        schema([("view", Converter::Mapped), ("callback", Converter::Direct)]),
    );
    port.register_handler(
        VIEW_SET,
        schema([("view", Converter::Mapped), ("data", Converter::Direct)]),
    );
    port.register_handler(
        VIEW_STORE,
        schema([("view", Converter::Mapped), ("data", Converter::Direct)]),
    );
    port.register_handler(
        VIEW_REMOVE,
        schema([("view", Converter::Mapped), ("data", Converter::Direct)]),
    );
    port.register_handler(VIEW_CLEAR, schema([("view", Converter::Mapped)]));
    port.register_handler(
        RENDER,
        schema([
            ("particle", Converter::Mapped),
            ("slot_name", Converter::Direct),
            ("content", Converter::dictionary(Converter::Direct)),
        ]),
    );
    port.register_handler(
        IDLE,
        schema([
            ("version", Converter::Direct),
            ("relevance", Converter::keyed_map(Converter::Mapped, Converter::Direct)),
        ]),
    );
    port
}

pub fn inner_port(
    name: &str,
    transport: impl Transport + 'static,
    cancel: CancellationToken,
) -> ApiPort<InnerThing> {
    use message::*;
    let mut port = ApiPort::new(name, INNER_PREFIX, transport, cancel);

    port.register_handler(STOP, schema([]));
    port.register_handler(
        DEFINE_PARTICLE,
        schema([
            ("particle_definition", Converter::by_representation::<ParticleSpec>()),
            ("particle_function", Converter::Stringified),
        ]),
    );
    port.register_initializer_handler(
        DEFINE_VIEW,
        schema([
            ("view_type", Converter::by_representation::<ViewType>()),
            ("name", Converter::Direct),
        ]),
    );
    port.register_initializer_handler(
        INSTANTIATE_PARTICLE,
        schema([
            ("spec", Converter::by_representation::<ParticleSpec>()),
            ("views", Converter::keyed_map(Converter::Direct, Converter::Mapped)),
        ]),
    );
    port.register_handler(
        START_RENDER,
        schema([
            ("particle", Converter::Mapped),
            ("slot_name", Converter::Direct),
            ("content_types", Converter::list(Converter::Direct)),
        ]),
    );
    port.register_handler(
        STOP_RENDER,
        schema([("particle", Converter::Mapped), ("slot_name", Converter::Direct)]),
    );
    port.register_handler(
        SIMPLE_CALLBACK,
        schema([("callback", Converter::LocallyMapped), ("data", Converter::Direct)]),
    );
    port.register_handler(AWAIT_IDLE, schema([("version", Converter::Direct)]));

    port.register_call(
        VIEW_GET,
        schema([("view", Converter::Mapped), ("callback", Converter::LocallyMapped)]),
    );
    port.register_call(
        VIEW_TO_LIST,
        schema([("view", Converter::Mapped), ("callback", Converter::LocallyMapped)]),
    );
    port.register_call(
        VIEW_SET,
        schema([("view", Converter::Mapped), ("data", Converter::Direct)]),
    );
    port.register_call(
        VIEW_STORE,
        schema([("view", Converter::Mapped), ("data", Converter::Direct)]),
    );
    port.register_call(
        VIEW_REMOVE,
        schema([("view", Converter::Mapped), ("data", Converter::Direct)]),
    );
    port.register_call(VIEW_CLEAR, schema([("view", Converter::Mapped)]));
    port.register_call(
        RENDER,
        schema([
            ("particle", Converter::Mapped),
            ("slot_name", Converter::Direct),
            ("content", Converter::dictionary(Converter::Direct)),
        ]),
    );
    port.register_call(
        IDLE,
        schema([
            ("version", Converter::Direct),
            ("relevance", Converter::keyed_map(Converter::Mapped, Converter::Direct)),
        ]),
    );
    port
}
