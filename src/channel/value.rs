// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Local, decoded form of message arguments.

use crate::channel::Thing;
use crate::errors::ChannelError;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as Json;

/// One argument as seen by the local side of a channel.
///
/// `Thing` holds a local object that crosses the boundary as an identifier.
/// Everything else is plain data or a container of values.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<T> {
    Data(Json),
    Thing(T),
    List(Vec<Value<T>>),
    Dict(IndexMap<String, Value<T>>),
    /// Ordered key/value pairs whose keys may themselves be things.
    Map(Vec<(Value<T>, Value<T>)>),
}

impl<T> Value<T> {
    pub fn data(value: impl Into<Json>) -> Self {
        Value::Data(value.into())
    }

    /// Serialize any plain-data value, e.g. a particle spec.
    pub fn literal<C: Serialize>(value: &C) -> Result<Self, ChannelError> {
        serde_json::to_value(value)
            .map(Value::Data)
            .map_err(|e| ChannelError::conversion("literal", e))
    }

    pub fn as_data(&self) -> Option<&Json> {
        match self {
            Value::Data(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_thing(&self) -> Option<&T> {
        match self {
            Value::Thing(thing) => Some(thing),
            _ => None,
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Value::Data(_) => "data",
            Value::Thing(_) => "thing",
            Value::List(_) => "list",
            Value::Dict(_) => "dictionary",
            Value::Map(_) => "map",
        }
    }
}

/// Named arguments of one message.
#[derive(Debug, Clone, PartialEq)]
pub struct Args<T> {
    fields: IndexMap<String, Value<T>>,
}

impl<T> Default for Args<T> {
    fn default() -> Self {
        Self {
            fields: IndexMap::new(),
        }
    }
}

impl<T: Thing> Args<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: Value<T>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value<T>) {
        self.fields.insert(name.into(), value);
    }

    pub fn fields(&self) -> &IndexMap<String, Value<T>> {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Result<&Value<T>, ChannelError> {
        self.fields
            .get(name)
            .ok_or_else(|| ChannelError::MissingArgument(name.to_string()))
    }

    pub fn take(&mut self, name: &str) -> Result<Value<T>, ChannelError> {
        self.fields
            .shift_remove(name)
            .ok_or_else(|| ChannelError::MissingArgument(name.to_string()))
    }

    pub fn data(&self, name: &str) -> Result<&Json, ChannelError> {
        let value = self.get(name)?;
        value
            .as_data()
            .ok_or_else(|| ChannelError::conversion(name, format!("expected data, found {}", value.kind())))
    }

    pub fn str(&self, name: &str) -> Result<&str, ChannelError> {
        self.data(name)?
            .as_str()
            .ok_or_else(|| ChannelError::conversion(name, "expected a string"))
    }

    pub fn thing(&self, name: &str) -> Result<T, ChannelError> {
        let value = self.get(name)?;
        value
            .as_thing()
            .cloned()
            .ok_or_else(|| ChannelError::conversion(name, format!("expected a thing, found {}", value.kind())))
    }

    /// Deserialize a plain-data argument into a typed value.
    pub fn literal<C: DeserializeOwned>(&self, name: &str) -> Result<C, ChannelError> {
        serde_json::from_value(self.data(name)?.clone())
            .map_err(|e| ChannelError::conversion(name, e))
    }

    /// The identifier an initializer call attached to its message.
    pub fn identifier(&self) -> Result<String, ChannelError> {
        self.str("identifier").map(str::to_string)
    }
}
