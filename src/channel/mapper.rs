// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Bidirectional identifier table scoped to one channel endpoint.
//!
//! Each endpoint owns one `ReferenceMapper`. Identifiers it mints carry the
//! endpoint's prefix (`o` for the controller side, `i` for the execution context
//! side) so the two sides never hand out the same string. Identifiers minted by
//! the other side are recorded with [`ReferenceMapper::establish_mapping`], or with
//! [`ReferenceMapper::establish_pending`] when the local object is still being
//! produced.
//!
//! Once every pending mapping has settled, `id -> thing` and `thing -> id` are
//! mutual inverses. A pending identifier never appears in the reverse table.

use crate::channel::Thing;
use crate::errors::ChannelError;
use std::collections::HashMap;

/// Callback run once a pending identifier settles.
pub type Continuation = Box<dyn FnOnce() + Send>;

enum Mapping<T> {
    Pending(Vec<Continuation>),
    Settled(T),
}

/// Result of a forward lookup.
#[derive(Debug, PartialEq)]
pub enum Resolution<'a, T> {
    Settled(&'a T),
    Pending,
}

pub struct ReferenceMapper<T: Thing> {
    prefix: String,
    next_identifier: u64,
    id_map: HashMap<String, Mapping<T>>,
    reverse_id_map: HashMap<T, String>,
}

impl<T: Thing> ReferenceMapper<T> {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next_identifier: 0,
            id_map: HashMap::new(),
            reverse_id_map: HashMap::new(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn new_identifier(&mut self) -> String {
        let identifier = format!("{}{}", self.prefix, self.next_identifier);
        self.next_identifier += 1;
        identifier
    }

    /// Mint a fresh identifier for `thing`. Fails if `thing` is already mapped.
    pub fn create_mapping(&mut self, thing: T) -> Result<String, ChannelError> {
        if let Some(identifier) = self.reverse_id_map.get(&thing) {
            return Err(ChannelError::AlreadyMapped {
                thing: format!("{:?}", thing),
                identifier: identifier.clone(),
            });
        }
        let identifier = self.new_identifier();
        self.establish_mapping(identifier.clone(), thing)?;
        Ok(identifier)
    }

    /// Identifier for `thing`, minting one on first use.
    pub fn maybe_create_mapping(&mut self, thing: T) -> Result<String, ChannelError> {
        match self.reverse_id_map.get(&thing) {
            Some(identifier) => Ok(identifier.clone()),
            None => self.create_mapping(thing),
        }
    }

    /// Record an identifier chosen elsewhere, usually by the remote endpoint.
    pub fn establish_mapping(
        &mut self,
        identifier: impl Into<String>,
        thing: T,
    ) -> Result<(), ChannelError> {
        let identifier = identifier.into();
        if self.id_map.contains_key(&identifier) {
            return Err(ChannelError::DuplicateIdentifier(identifier));
        }
        if let Some(existing) = self.reverse_id_map.get(&thing) {
            return Err(ChannelError::AlreadyMapped {
                thing: format!("{:?}", thing),
                identifier: existing.clone(),
            });
        }
        self.reverse_id_map.insert(thing.clone(), identifier.clone());
        self.id_map.insert(identifier, Mapping::Settled(thing));
        Ok(())
    }

    /// `establish_mapping` followed immediately by `continuation`.
    pub fn establish_mapping_with(
        &mut self,
        identifier: impl Into<String>,
        thing: T,
        continuation: impl FnOnce() + Send + 'static,
    ) -> Result<(), ChannelError> {
        self.establish_mapping(identifier, thing)?;
        continuation();
        Ok(())
    }

    /// Reserve `identifier` for a thing that does not exist yet.
    ///
    /// The optional continuation runs when [`ReferenceMapper::settle`] delivers
    /// the thing.
    pub fn establish_pending(
        &mut self,
        identifier: impl Into<String>,
        continuation: Option<Continuation>,
    ) -> Result<(), ChannelError> {
        let identifier = identifier.into();
        if self.id_map.contains_key(&identifier) {
            return Err(ChannelError::DuplicateIdentifier(identifier));
        }
        let continuations = continuation.into_iter().collect();
        self.id_map.insert(identifier, Mapping::Pending(continuations));
        Ok(())
    }

    /// Queue `continuation` behind a pending identifier, or run it now if the
    /// identifier has already settled.
    pub fn on_settled(
        &mut self,
        identifier: &str,
        continuation: impl FnOnce() + Send + 'static,
    ) -> Result<(), ChannelError> {
        match self.id_map.get_mut(identifier) {
            Some(Mapping::Pending(continuations)) => {
                continuations.push(Box::new(continuation));
                Ok(())
            }
            Some(Mapping::Settled(_)) => {
                continuation();
                Ok(())
            }
            None => Err(ChannelError::MissingIdentifier(identifier.to_string())),
        }
    }

    /// Resolve a pending identifier exactly once and run its queued continuations.
    pub fn settle(&mut self, identifier: &str, thing: T) -> Result<(), ChannelError> {
        if let Some(existing) = self.reverse_id_map.get(&thing) {
            return Err(ChannelError::AlreadyMapped {
                thing: format!("{:?}", thing),
                identifier: existing.clone(),
            });
        }
        let mapping = self
            .id_map
            .get_mut(identifier)
            .ok_or_else(|| ChannelError::MissingIdentifier(identifier.to_string()))?;
        if matches!(mapping, Mapping::Settled(_)) {
            return Err(ChannelError::NotPending(identifier.to_string()));
        }
        let continuations = match std::mem::replace(mapping, Mapping::Settled(thing.clone())) {
            Mapping::Pending(continuations) => continuations,
            Mapping::Settled(_) => Vec::new(),
        };
        self.reverse_id_map.insert(thing, identifier.to_string());
        for continuation in continuations {
            continuation();
        }
        Ok(())
    }

    pub fn has_mapping_for_thing(&self, thing: &T) -> bool {
        self.reverse_id_map.contains_key(thing)
    }

    pub fn has_identifier(&self, identifier: &str) -> bool {
        self.id_map.contains_key(identifier)
    }

    pub fn is_pending(&self, identifier: &str) -> bool {
        matches!(self.id_map.get(identifier), Some(Mapping::Pending(_)))
    }

    pub fn identifier_for(&self, thing: &T) -> Result<String, ChannelError> {
        self.reverse_id_map
            .get(thing)
            .cloned()
            .ok_or_else(|| ChannelError::MissingThing(format!("{:?}", thing)))
    }

    pub fn thing_for(&self, identifier: &str) -> Result<Resolution<'_, T>, ChannelError> {
        match self.id_map.get(identifier) {
            Some(Mapping::Settled(thing)) => Ok(Resolution::Settled(thing)),
            Some(Mapping::Pending(_)) => Ok(Resolution::Pending),
            None => Err(ChannelError::MissingIdentifier(identifier.to_string())),
        }
    }

    pub fn len(&self) -> usize {
        self.id_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_create_mapping_uses_prefix_and_counter() {
        let mut mapper = ReferenceMapper::new("o");
        assert_eq!(mapper.create_mapping("a".to_string()).unwrap(), "o0");
        assert_eq!(mapper.create_mapping("b".to_string()).unwrap(), "o1");
        assert_eq!(mapper.prefix(), "o");
    }

    #[test]
    fn test_create_mapping_rejects_mapped_thing() {
        let mut mapper = ReferenceMapper::new("o");
        mapper.create_mapping("a".to_string()).unwrap();
        let err = mapper.create_mapping("a".to_string()).unwrap_err();
        assert!(matches!(err, ChannelError::AlreadyMapped { identifier, .. } if identifier == "o0"));
    }

    #[test]
    fn test_maybe_create_mapping_is_idempotent() {
        let mut mapper = ReferenceMapper::new("i");
        let first = mapper.maybe_create_mapping(7u64).unwrap();
        let second = mapper.maybe_create_mapping(7u64).unwrap();
        assert_eq!(first, second);
        assert_eq!(mapper.len(), 1);
    }

    #[test]
    fn test_tables_are_inverses() {
        let mut mapper = ReferenceMapper::new("o");
        let things = ["x", "y", "z"];
        for thing in things {
            mapper.create_mapping(thing.to_string()).unwrap();
        }
        mapper.establish_mapping("i4", "remote".to_string()).unwrap();

        for thing in ["x", "y", "z", "remote"] {
            let identifier = mapper.identifier_for(&thing.to_string()).unwrap();
            assert_eq!(
                mapper.thing_for(&identifier).unwrap(),
                Resolution::Settled(&thing.to_string())
            );
        }
    }

    #[test]
    fn test_establish_rejects_duplicates() {
        let mut mapper = ReferenceMapper::new("o");
        mapper.establish_mapping("i0", 1u64).unwrap();
        assert_eq!(
            mapper.establish_mapping("i0", 2u64),
            Err(ChannelError::DuplicateIdentifier("i0".into()))
        );
        assert!(matches!(
            mapper.establish_mapping("i1", 1u64),
            Err(ChannelError::AlreadyMapped { .. })
        ));
        assert_eq!(
            mapper.establish_pending("i0", None),
            Err(ChannelError::DuplicateIdentifier("i0".into()))
        );
    }

    #[test]
    fn test_establish_mapping_with_runs_continuation() {
        let mut mapper = ReferenceMapper::new("o");
        let ran = Arc::new(AtomicUsize::new(0));
        let counter = ran.clone();
        mapper
            .establish_mapping_with("i0", 1u64, move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_pending_identifier_is_not_reverse_resolvable() {
        let mut mapper = ReferenceMapper::new("i");
        mapper.establish_pending("o3", None).unwrap();

        assert!(mapper.is_pending("o3"));
        assert_eq!(mapper.thing_for("o3").unwrap(), Resolution::Pending);
        assert!(!mapper.has_mapping_for_thing(&"later".to_string()));
        assert!(mapper.identifier_for(&"later".to_string()).is_err());
    }

    #[test]
    fn test_settle_runs_continuations_once() {
        let mut mapper = ReferenceMapper::new("i");
        let ran = Arc::new(AtomicUsize::new(0));

        let first = ran.clone();
        mapper
            .establish_pending(
                "o0",
                Some(Box::new(move || {
                    first.fetch_add(1, Ordering::SeqCst);
                })),
            )
            .unwrap();
        let second = ran.clone();
        mapper
            .on_settled("o0", move || {
                second.fetch_add(10, Ordering::SeqCst);
            })
            .unwrap();
        assert_eq!(ran.load(Ordering::SeqCst), 0);

        mapper.settle("o0", "particle".to_string()).unwrap();
        assert_eq!(ran.load(Ordering::SeqCst), 11);
        assert_eq!(mapper.identifier_for(&"particle".to_string()).unwrap(), "o0");

        assert_eq!(
            mapper.settle("o0", "other".to_string()),
            Err(ChannelError::NotPending("o0".into()))
        );
        assert_eq!(ran.load(Ordering::SeqCst), 11);
    }

    #[test]
    fn test_on_settled_after_settlement_runs_immediately() {
        let mut mapper = ReferenceMapper::new("i");
        mapper.establish_mapping("o0", 5u64).unwrap();
        let ran = Arc::new(AtomicUsize::new(0));
        let counter = ran.clone();
        mapper
            .on_settled("o0", move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_missing_lookups_are_errors() {
        let mapper: ReferenceMapper<u64> = ReferenceMapper::new("o");
        assert_eq!(
            mapper.thing_for("o9"),
            Err(ChannelError::MissingIdentifier("o9".into()))
        );
        assert!(matches!(
            mapper.identifier_for(&9),
            Err(ChannelError::MissingThing(_))
        ));
        assert!(mapper.is_empty());
    }
}
