// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Field converters: how one argument travels across the channel.
//!
//! | Converter            | Local value        | Wire value                          |
//! |----------------------|--------------------|-------------------------------------|
//! | `Direct`             | data               | the same JSON                       |
//! | `Stringified`        | data               | JSON text in a string               |
//! | `Mapped`             | thing              | identifier (must already be mapped) |
//! | `LocallyMapped`      | thing              | identifier (minted on first use)    |
//! | `Dictionary(v)`      | string-keyed dict  | JSON object                         |
//! | `KeyedMap(k, v)`     | pairs              | array of `[key, value]` arrays      |
//! | `List(v)`            | list               | JSON array                          |
//! | `ByRepresentation`   | data               | canonical serde form of a type      |
//!
//! `Stringified` only ever carries plain-data descriptors. Behavior is selected by
//! name on the receiving side, never shipped as code.

use crate::channel::mapper::{ReferenceMapper, Resolution};
use crate::channel::value::Value;
use crate::channel::Thing;
use crate::errors::ChannelError;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as Json;

/// Canonicalization for a serde type, used by [`Converter::ByRepresentation`].
#[derive(Debug, Clone, Copy)]
pub struct Representation {
    class: &'static str,
    canonicalize: fn(Json) -> Result<Json, serde_json::Error>,
}

impl Representation {
    pub fn of<C: Serialize + DeserializeOwned>() -> Self {
        Self {
            class: std::any::type_name::<C>(),
            canonicalize: canonicalize::<C>,
        }
    }

    pub fn class(&self) -> &'static str {
        self.class
    }
}

fn canonicalize<C: Serialize + DeserializeOwned>(value: Json) -> Result<Json, serde_json::Error> {
    let typed: C = serde_json::from_value(value)?;
    serde_json::to_value(typed)
}

#[derive(Debug, Clone)]
pub enum Converter {
    Direct,
    Stringified,
    Mapped,
    LocallyMapped,
    Dictionary(Box<Converter>),
    KeyedMap(Box<Converter>, Box<Converter>),
    List(Box<Converter>),
    ByRepresentation(Representation),
}

impl Converter {
    pub fn dictionary(values: Converter) -> Self {
        Converter::Dictionary(Box::new(values))
    }

    pub fn keyed_map(keys: Converter, values: Converter) -> Self {
        Converter::KeyedMap(Box::new(keys), Box::new(values))
    }

    pub fn list(items: Converter) -> Self {
        Converter::List(Box::new(items))
    }

    pub fn by_representation<C: Serialize + DeserializeOwned>() -> Self {
        Converter::ByRepresentation(Representation::of::<C>())
    }

    fn kind(&self) -> &'static str {
        match self {
            Converter::Direct => "Direct",
            Converter::Stringified => "Stringified",
            Converter::Mapped => "Mapped",
            Converter::LocallyMapped => "LocallyMapped",
            Converter::Dictionary(_) => "Dictionary",
            Converter::KeyedMap(_, _) => "KeyedMap",
            Converter::List(_) => "List",
            Converter::ByRepresentation(_) => "ByRepresentation",
        }
    }

    /// Local value to wire value. `LocallyMapped` may mint identifiers, so the
    /// mapper is borrowed mutably.
    pub fn encode<T: Thing>(
        &self,
        field: &str,
        value: &Value<T>,
        mapper: &mut ReferenceMapper<T>,
    ) -> Result<Json, ChannelError> {
        match (self, value) {
            (Converter::Direct, Value::Data(data)) => Ok(data.clone()),
            (Converter::Stringified, Value::Data(data)) => Ok(Json::String(data.to_string())),
            (Converter::Mapped, Value::Thing(thing)) => {
                mapper.identifier_for(thing).map(Json::String)
            }
            (Converter::LocallyMapped, Value::Thing(thing)) => {
                mapper.maybe_create_mapping(thing.clone()).map(Json::String)
            }
            (Converter::Dictionary(values), Value::Dict(entries)) => {
                let mut object = serde_json::Map::with_capacity(entries.len());
                for (key, entry) in entries {
                    object.insert(key.clone(), values.encode(field, entry, mapper)?);
                }
                Ok(Json::Object(object))
            }
            (Converter::KeyedMap(keys, values), Value::Map(pairs)) => {
                let mut encoded = Vec::with_capacity(pairs.len());
                for (key, entry) in pairs {
                    encoded.push(Json::Array(vec![
                        keys.encode(field, key, mapper)?,
                        values.encode(field, entry, mapper)?,
                    ]));
                }
                Ok(Json::Array(encoded))
            }
            (Converter::List(items), Value::List(list)) => list
                .iter()
                .map(|item| items.encode(field, item, mapper))
                .collect::<Result<Vec<_>, _>>()
                .map(Json::Array),
            (Converter::ByRepresentation(representation), Value::Data(data)) => {
                (representation.canonicalize)(data.clone()).map_err(|e| {
                    ChannelError::conversion(field, format!("not a {}: {}", representation.class, e))
                })
            }
            (converter, value) => Err(ChannelError::conversion(
                field,
                format!("{} cannot encode a {}", converter.kind(), value.kind()),
            )),
        }
    }

    /// Wire value to local value.
    ///
    /// Identifiers that are still pending on this side are pushed onto `pending`
    /// and decode as `null`; the caller defers the message until they settle.
    pub fn decode<T: Thing>(
        &self,
        field: &str,
        wire: Json,
        mapper: &ReferenceMapper<T>,
        pending: &mut Vec<String>,
    ) -> Result<Value<T>, ChannelError> {
        match self {
            Converter::Direct => Ok(Value::Data(wire)),
            Converter::Stringified => match wire {
                Json::String(text) => serde_json::from_str(&text)
                    .map(Value::Data)
                    .map_err(|e| ChannelError::conversion(field, e)),
                other => Err(ChannelError::conversion(
                    field,
                    format!("expected stringified data, found {}", other),
                )),
            },
            Converter::Mapped | Converter::LocallyMapped => {
                let identifier = wire.as_str().ok_or_else(|| {
                    ChannelError::conversion(field, format!("expected an identifier, found {}", wire))
                })?;
                match mapper.thing_for(identifier)? {
                    Resolution::Settled(thing) => Ok(Value::Thing(thing.clone())),
                    Resolution::Pending => {
                        pending.push(identifier.to_string());
                        Ok(Value::Data(Json::Null))
                    }
                }
            }
            Converter::Dictionary(values) => match wire {
                Json::Object(object) => {
                    let mut entries = IndexMap::with_capacity(object.len());
                    for (key, entry) in object {
                        let decoded = values.decode(field, entry, mapper, pending)?;
                        entries.insert(key, decoded);
                    }
                    Ok(Value::Dict(entries))
                }
                other => Err(ChannelError::conversion(
                    field,
                    format!("expected an object, found {}", other),
                )),
            },
            Converter::KeyedMap(keys, values) => match wire {
                Json::Array(pairs) => {
                    let mut decoded = Vec::with_capacity(pairs.len());
                    for pair in pairs {
                        let (key, entry) = match pair {
                            Json::Array(mut kv) if kv.len() == 2 => {
                                let entry = kv.pop().unwrap_or(Json::Null);
                                let key = kv.pop().unwrap_or(Json::Null);
                                (key, entry)
                            }
                            other => {
                                return Err(ChannelError::conversion(
                                    field,
                                    format!("expected a [key, value] pair, found {}", other),
                                ))
                            }
                        };
                        decoded.push((
                            keys.decode(field, key, mapper, pending)?,
                            values.decode(field, entry, mapper, pending)?,
                        ));
                    }
                    Ok(Value::Map(decoded))
                }
                other => Err(ChannelError::conversion(
                    field,
                    format!("expected an array of pairs, found {}", other),
                )),
            },
            Converter::List(items) => match wire {
                Json::Array(list) => list
                    .into_iter()
                    .map(|item| items.decode(field, item, mapper, pending))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::List),
                other => Err(ChannelError::conversion(
                    field,
                    format!("expected an array, found {}", other),
                )),
            },
            Converter::ByRepresentation(representation) => (representation.canonicalize)(wire)
                .map(Value::Data)
                .map_err(|e| {
                    ChannelError::conversion(field, format!("not a {}: {}", representation.class, e))
                }),
        }
    }
}
