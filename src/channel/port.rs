// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Typed message endpoint with argument marshaling.
//!
//! An [`ApiPort`] is one side of a channel. Outbound message types are
//! registered as calls, inbound ones as handlers; the two endpoints of a channel
//! register mirror images of the same schemas. Inbound messages are dispatched
//! by [`ApiPort::serve`] to a [`MessageHandler`].
//!
//! ## Deferred dispatch
//!
//! A handler may answer an initializer with a thing that is still being
//! produced ([`Outcome::Creating`]). Its identifier stays pending until the
//! future resolves. Any message that refers to a pending identifier is parked
//! and retried when that identifier settles, so a deferred message may finish
//! after messages that arrived later.
//!
//! ## Quiescence
//!
//! After each event the loop checks whether it is quiet: no queued inbound
//! messages, no in-flight work and nothing parked. When quiet it calls
//! [`MessageHandler::on_quiet`].

use crate::channel::converter::Converter;
use crate::channel::mapper::ReferenceMapper;
use crate::channel::transport::{Envelope, Transport};
use crate::channel::value::Args;
use crate::channel::Thing;
use crate::errors::ChannelError;
use crate::observability::messages::channel::{MessageDeferred, MessageDispatched};
use crate::observability::messages::StructuredLog;
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde_json::{Map, Value as Json};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Field name to converter, in declaration order.
pub type Schema = IndexMap<String, Converter>;

/// A thing still being produced by an initializer handler.
pub type PendingThing<T> = Pin<Box<dyn Future<Output = Result<T, ChannelError>> + Send>>;

const IDENTIFIER_FIELD: &str = "identifier";

/// Build a schema from `(field, converter)` pairs.
pub fn schema<const N: usize>(fields: [(&str, Converter); N]) -> Schema {
    fields
        .into_iter()
        .map(|(name, converter)| (name.to_string(), converter))
        .collect()
}

/// What a handler produced for one message.
pub enum Outcome<T> {
    Done,
    /// The local object behind an initializer's identifier.
    Created(T),
    /// The local object will exist once the future resolves.
    Creating(PendingThing<T>),
}

/// Receives decoded inbound messages for one port.
pub trait MessageHandler<T: Thing>: Send {
    fn handle(
        &mut self,
        port: &Arc<ApiPort<T>>,
        message_type: &str,
        args: Args<T>,
    ) -> Result<Outcome<T>, ChannelError>;

    /// Called whenever the port has nothing queued, parked or in flight.
    fn on_quiet(&mut self, _port: &Arc<ApiPort<T>>) -> Result<(), ChannelError> {
        Ok(())
    }

    /// Ends the serve loop after the current message.
    fn is_finished(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallKind {
    Plain,
    Initializer,
    RedundantInitializer,
}

struct CallSpec {
    kind: CallKind,
    schema: Schema,
}

struct HandlerSpec {
    initializer: bool,
    schema: Schema,
}

enum WorkEvent<T> {
    Settled { identifier: String, thing: T },
    Finished,
    Failed(ChannelError),
}

pub struct ApiPort<T: Thing> {
    name: String,
    transport: Box<dyn Transport>,
    mapper: Mutex<ReferenceMapper<T>>,
    calls: HashMap<String, CallSpec>,
    handlers: HashMap<String, HandlerSpec>,
    message_count: AtomicU64,
    in_flight: AtomicUsize,
    parked: Mutex<Vec<(String, Envelope)>>,
    work_tx: mpsc::UnboundedSender<WorkEvent<T>>,
    work_rx: Mutex<Option<mpsc::UnboundedReceiver<WorkEvent<T>>>>,
    cancel: CancellationToken,
}

impl<T: Thing> ApiPort<T> {
    /// `prefix` is prepended to every identifier this side mints.
    pub fn new(
        name: impl Into<String>,
        prefix: &str,
        transport: impl Transport + 'static,
        cancel: CancellationToken,
    ) -> Self {
        let (work_tx, work_rx) = mpsc::unbounded_channel();
        Self {
            name: name.into(),
            transport: Box::new(transport),
            mapper: Mutex::new(ReferenceMapper::new(prefix)),
            calls: HashMap::new(),
            handlers: HashMap::new(),
            message_count: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
            parked: Mutex::new(Vec::new()),
            work_tx,
            work_rx: Mutex::new(Some(work_rx)),
            cancel,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn register_call(&mut self, name: &str, schema: Schema) {
        self.calls.insert(
            name.to_string(),
            CallSpec {
                kind: CallKind::Plain,
                schema,
            },
        );
    }

    pub fn register_initializer(&mut self, name: &str, schema: Schema) {
        self.calls.insert(
            name.to_string(),
            CallSpec {
                kind: CallKind::Initializer,
                schema,
            },
        );
    }

    /// Like an initializer, but a no-op when the thing is already mapped.
    pub fn register_redundant_initializer(&mut self, name: &str, schema: Schema) {
        self.calls.insert(
            name.to_string(),
            CallSpec {
                kind: CallKind::RedundantInitializer,
                schema,
            },
        );
    }

    pub fn register_handler(&mut self, name: &str, schema: Schema) {
        self.handlers.insert(
            name.to_string(),
            HandlerSpec {
                initializer: false,
                schema,
            },
        );
    }

    /// The handler's result is published under the message's `identifier` field.
    pub fn register_initializer_handler(&mut self, name: &str, mut schema: Schema) {
        schema.insert(IDENTIFIER_FIELD.to_string(), Converter::Direct);
        self.handlers.insert(
            name.to_string(),
            HandlerSpec {
                initializer: true,
                schema,
            },
        );
    }

    /// Number of inbound messages dispatched so far. Retries of parked
    /// messages are not counted again.
    pub fn message_count(&self) -> u64 {
        self.message_count.load(Ordering::SeqCst)
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// Read access to this side's identifier table.
    pub fn with_mapper<R>(&self, f: impl FnOnce(&ReferenceMapper<T>) -> R) -> R {
        f(&self.mapper.lock())
    }

    /// Fire-and-forget send of a plain call.
    pub fn call(&self, name: &str, args: Args<T>) -> Result<(), ChannelError> {
        let spec = self.call_spec(name)?;
        if spec.kind != CallKind::Plain {
            return Err(ChannelError::WrongKind {
                message_type: name.to_string(),
                expected: "a plain call",
            });
        }
        let body = {
            let mut mapper = self.mapper.lock();
            encode(&spec.schema, &args, &mut mapper)?
        };
        self.send(name, body)
    }

    /// Send an initializer for `thing`, minting its identifier.
    ///
    /// Returns the identifier, or `None` when a redundant initializer found the
    /// thing already mapped and sent nothing.
    pub fn initialize(
        &self,
        name: &str,
        thing: T,
        args: Args<T>,
    ) -> Result<Option<String>, ChannelError> {
        let spec = self.call_spec(name)?;
        if spec.kind == CallKind::Plain {
            return Err(ChannelError::WrongKind {
                message_type: name.to_string(),
                expected: "an initializer",
            });
        }
        let (body, identifier) = {
            let mut mapper = self.mapper.lock();
            if spec.kind == CallKind::RedundantInitializer && mapper.has_mapping_for_thing(&thing) {
                return Ok(None);
            }
            let mut body = encode(&spec.schema, &args, &mut mapper)?;
            let identifier = mapper.create_mapping(thing)?;
            body.insert(IDENTIFIER_FIELD.to_string(), Json::String(identifier.clone()));
            (body, identifier)
        };
        self.send(name, body)?;
        Ok(Some(identifier))
    }

    /// Run `work` in the background; the port is not quiet until it finishes.
    /// An error from `work` ends the serve loop.
    pub fn spawn_work<F>(&self, work: F)
    where
        F: Future<Output = Result<(), ChannelError>> + Send + 'static,
    {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let events = self.work_tx.clone();
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                result = work => {
                    let event = match result {
                        Ok(()) => WorkEvent::Finished,
                        Err(error) => WorkEvent::Failed(error),
                    };
                    let _ = events.send(event);
                }
            }
        });
    }

    fn spawn_settlement(&self, identifier: String, pending: PendingThing<T>) {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let events = self.work_tx.clone();
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                result = pending => {
                    let event = match result {
                        Ok(thing) => WorkEvent::Settled { identifier, thing },
                        Err(error) => WorkEvent::Failed(error),
                    };
                    let _ = events.send(event);
                }
            }
        });
    }

    /// Drive inbound messages into `handler` until the inbound side closes, the
    /// port is cancelled or the handler reports it is finished.
    ///
    /// A protocol violation ends the loop with the error.
    pub async fn serve<H: MessageHandler<T>>(
        self: Arc<Self>,
        mut inbound: mpsc::UnboundedReceiver<String>,
        handler: &mut H,
    ) -> Result<(), ChannelError> {
        let mut work = self
            .work_rx
            .lock()
            .take()
            .ok_or_else(|| ChannelError::Closed(format!("{} is already serving", self.name)))?;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return Ok(()),
                message = inbound.recv() => match message {
                    Some(text) => {
                        let envelope = Envelope::from_text(&text)?;
                        self.dispatch(envelope, handler, true)?;
                    }
                    None => return Ok(()),
                },
                Some(event) = work.recv() => {
                    self.in_flight.fetch_sub(1, Ordering::SeqCst);
                    match event {
                        WorkEvent::Settled { identifier, thing } => {
                            self.mapper.lock().settle(&identifier, thing)?;
                            self.retry_parked(&identifier, handler)?;
                        }
                        WorkEvent::Finished => {}
                        WorkEvent::Failed(error) => return Err(error),
                    }
                },
            }

            if handler.is_finished() {
                return Ok(());
            }
            if self.is_quiet(&inbound) {
                handler.on_quiet(&self)?;
            }
        }
    }

    fn is_quiet(&self, inbound: &mpsc::UnboundedReceiver<String>) -> bool {
        inbound.is_empty()
            && self.in_flight.load(Ordering::SeqCst) == 0
            && self.parked.lock().is_empty()
    }

    fn dispatch<H: MessageHandler<T>>(
        self: &Arc<Self>,
        envelope: Envelope,
        handler: &mut H,
        count: bool,
    ) -> Result<(), ChannelError> {
        let spec = self
            .handlers
            .get(&envelope.message_type)
            .ok_or_else(|| ChannelError::UnknownMessage(envelope.message_type.clone()))?;
        if count {
            self.message_count.fetch_add(1, Ordering::SeqCst);
        }

        let (args, pending) = {
            let mapper = self.mapper.lock();
            decode(&spec.schema, &envelope.message_body, &mapper)?
        };
        if let Some(identifier) = pending.into_iter().next() {
            MessageDeferred {
                port: &self.name,
                message_type: &envelope.message_type,
                identifier: &identifier,
            }
            .log();
            self.parked.lock().push((identifier, envelope));
            return Ok(());
        }

        MessageDispatched {
            port: &self.name,
            message_type: &envelope.message_type,
            message_count: self.message_count(),
        }
        .log();

        let identifier = if spec.initializer {
            Some(args.identifier()?)
        } else {
            None
        };
        let outcome = handler.handle(self, &envelope.message_type, args)?;
        match (identifier, outcome) {
            (Some(identifier), Outcome::Created(thing)) => {
                self.mapper.lock().establish_mapping(identifier, thing)?
            }
            (Some(identifier), Outcome::Creating(pending)) => {
                self.mapper.lock().establish_pending(identifier.clone(), None)?;
                self.spawn_settlement(identifier, pending);
            }
            (Some(_), Outcome::Done) => {
                return Err(ChannelError::handler_failed(
                    &envelope.message_type,
                    "initializer handler produced no thing",
                ))
            }
            (None, Outcome::Done) => {}
            (None, _) => {
                return Err(ChannelError::handler_failed(
                    &envelope.message_type,
                    "plain handler produced a thing",
                ))
            }
        }
        Ok(())
    }

    fn retry_parked<H: MessageHandler<T>>(
        self: &Arc<Self>,
        identifier: &str,
        handler: &mut H,
    ) -> Result<(), ChannelError> {
        let ready: Vec<Envelope> = {
            let mut parked = self.parked.lock();
            let (ready, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut *parked)
                .into_iter()
                .partition(|(waiting_on, _)| waiting_on == identifier);
            *parked = waiting;
            ready.into_iter().map(|(_, envelope)| envelope).collect()
        };
        for envelope in ready {
            self.dispatch(envelope, handler, false)?;
        }
        Ok(())
    }

    fn call_spec(&self, name: &str) -> Result<&CallSpec, ChannelError> {
        self.calls
            .get(name)
            .ok_or_else(|| ChannelError::UnknownMessage(name.to_string()))
    }

    fn send(&self, name: &str, body: Map<String, Json>) -> Result<(), ChannelError> {
        let envelope = Envelope {
            message_type: name.to_string(),
            message_body: body,
        };
        self.transport.send(envelope.to_text()?)
    }
}

fn encode<T: Thing>(
    schema: &Schema,
    args: &Args<T>,
    mapper: &mut ReferenceMapper<T>,
) -> Result<Map<String, Json>, ChannelError> {
    let mut body = Map::with_capacity(schema.len());
    for (field, converter) in schema {
        let value = args.get(field)?;
        body.insert(field.clone(), converter.encode(field, value, mapper)?);
    }
    Ok(body)
}

fn decode<T: Thing>(
    schema: &Schema,
    body: &Map<String, Json>,
    mapper: &ReferenceMapper<T>,
) -> Result<(Args<T>, Vec<String>), ChannelError> {
    let mut args = Args::new();
    let mut pending = Vec::new();
    for (field, converter) in schema {
        let wire = body
            .get(field)
            .cloned()
            .ok_or_else(|| ChannelError::MissingArgument(field.clone()))?;
        args.insert(field.clone(), converter.decode(field, wire, mapper, &mut pending)?);
    }
    Ok((args, pending))
}
