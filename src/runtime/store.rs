// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! View data held by an execution context.

use crate::errors::ContextError;
use crate::recipe::ViewType;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredView {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub view_type: ViewType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// `null` for an empty entity view, an array for a collection.
    #[serde(default)]
    pub value: Json,
}

impl StoredView {
    fn empty_value(view_type: &ViewType) -> Json {
        if view_type.collection {
            Json::Array(Vec::new())
        } else {
            Json::Null
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewChange {
    Set,
    Store,
    Remove,
    Clear,
}

/// One mutation, as seen by view change listeners.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewEvent {
    pub view_id: String,
    pub change: ViewChange,
    pub value: Json,
}

#[derive(Debug, Clone, Default)]
pub struct ViewStore {
    views: IndexMap<String, StoredView>,
    next_id: u64,
}

impl ViewStore {
    /// New empty view with an id derived from `prefix`.
    pub fn create(
        &mut self,
        prefix: &str,
        view_type: ViewType,
        name: Option<String>,
        tags: Vec<String>,
    ) -> String {
        let id = loop {
            let candidate = format!("{}:view{}", prefix, self.next_id);
            self.next_id += 1;
            if !self.views.contains_key(&candidate) {
                break candidate;
            }
        };
        let value = StoredView::empty_value(&view_type);
        self.views.insert(
            id.clone(),
            StoredView {
                id: id.clone(),
                name,
                view_type,
                tags,
                value,
            },
        );
        id
    }

    pub fn insert(&mut self, view: StoredView) -> Result<(), ContextError> {
        if self.views.contains_key(&view.id) {
            return Err(ContextError::UnknownView(format!("{} already exists", view.id)));
        }
        self.views.insert(view.id.clone(), view);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&StoredView> {
        self.views.get(id)
    }

    pub fn views(&self) -> impl Iterator<Item = &StoredView> {
        self.views.values()
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Views of `view_type` carrying every tag in `tags`.
    pub fn find(&self, view_type: &ViewType, tags: &[String]) -> Vec<&StoredView> {
        self.views
            .values()
            .filter(|v| &v.view_type == view_type && tags.iter().all(|t| v.tags.contains(t)))
            .collect()
    }

    fn view_mut(&mut self, id: &str) -> Result<&mut StoredView, ContextError> {
        self.views
            .get_mut(id)
            .ok_or_else(|| ContextError::UnknownView(id.to_string()))
    }

    pub fn set(&mut self, id: &str, value: Json) -> Result<ViewEvent, ContextError> {
        let view = self.view_mut(id)?;
        view.value = value.clone();
        Ok(ViewEvent {
            view_id: id.to_string(),
            change: ViewChange::Set,
            value,
        })
    }

    /// Append to a collection; on an entity view this replaces the value.
    pub fn store(&mut self, id: &str, value: Json) -> Result<ViewEvent, ContextError> {
        let view = self.view_mut(id)?;
        match &mut view.value {
            Json::Array(items) if view.view_type.collection => items.push(value.clone()),
            slot => *slot = value.clone(),
        }
        Ok(ViewEvent {
            view_id: id.to_string(),
            change: ViewChange::Store,
            value,
        })
    }

    /// Drop collection entries equal to `value`, or sharing its `id` field
    /// when it has one. An entity view holding such a value is emptied.
    pub fn remove(&mut self, id: &str, value: Json) -> Result<ViewEvent, ContextError> {
        let view = self.view_mut(id)?;
        let matches = |item: &Json| {
            item == &value
                || value
                    .get("id")
                    .is_some_and(|key| item.get("id") == Some(key))
        };
        match &mut view.value {
            Json::Array(items) if view.view_type.collection => items.retain(|item| !matches(item)),
            slot => {
                if matches(slot) {
                    *slot = Json::Null;
                }
            }
        }
        Ok(ViewEvent {
            view_id: id.to_string(),
            change: ViewChange::Remove,
            value,
        })
    }

    /// Entries of a collection view; an entity view lists its value unless
    /// it is empty.
    pub fn list(&self, id: &str) -> Result<Vec<Json>, ContextError> {
        let view = self
            .views
            .get(id)
            .ok_or_else(|| ContextError::UnknownView(id.to_string()))?;
        Ok(match &view.value {
            Json::Array(items) if view.view_type.collection => items.clone(),
            Json::Null => Vec::new(),
            value => vec![value.clone()],
        })
    }

    pub fn clear(&mut self, id: &str) -> Result<ViewEvent, ContextError> {
        let view = self.view_mut(id)?;
        view.value = StoredView::empty_value(&view.view_type);
        Ok(ViewEvent {
            view_id: id.to_string(),
            change: ViewChange::Clear,
            value: Json::Null,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_assigns_prefixed_ids_and_empty_values() {
        let mut store = ViewStore::default();
        let text = store.create("ctx", ViewType::entity("Text"), None, vec![]);
        let list = store.create("ctx", ViewType::collection_of("Text"), Some("notes".into()), vec![]);

        assert_eq!(text, "ctx:view0");
        assert_eq!(list, "ctx:view1");
        assert_eq!(store.get(&text).unwrap().value, Json::Null);
        assert_eq!(store.get(&list).unwrap().value, json!([]));
    }

    #[test]
    fn test_create_skips_ids_taken_by_inserted_views() {
        let mut store = ViewStore::default();
        store
            .insert(StoredView {
                id: "ctx:view0".into(),
                name: None,
                view_type: ViewType::entity("Text"),
                tags: vec![],
                value: json!("hi"),
            })
            .unwrap();
        assert_eq!(store.create("ctx", ViewType::entity("Text"), None, vec![]), "ctx:view1");
    }

    #[test]
    fn test_mutations() {
        let mut store = ViewStore::default();
        let list = store.create("ctx", ViewType::collection_of("Text"), None, vec![]);
        let text = store.create("ctx", ViewType::entity("Text"), None, vec![]);

        store.store(&list, json!("a")).unwrap();
        store.store(&list, json!("b")).unwrap();
        assert_eq!(store.get(&list).unwrap().value, json!(["a", "b"]));

        let event = store.set(&text, json!("hello")).unwrap();
        assert_eq!(event.change, ViewChange::Set);
        assert_eq!(store.get(&text).unwrap().value, json!("hello"));

        store.clear(&list).unwrap();
        assert_eq!(store.get(&list).unwrap().value, json!([]));

        assert!(matches!(
            store.set("ctx:missing", json!(1)),
            Err(ContextError::UnknownView(_))
        ));
    }

    #[test]
    fn test_remove_and_list() {
        let mut store = ViewStore::default();
        let list = store.create("ctx", ViewType::collection_of("Text"), None, vec![]);
        let text = store.create("ctx", ViewType::entity("Text"), None, vec![]);
        for item in [json!("a"), json!({"id": "x", "v": 1}), json!("a"), json!("b")] {
            store.store(&list, item).unwrap();
        }

        let event = store.remove(&list, json!("a")).unwrap();
        assert_eq!(event.change, ViewChange::Remove);
        assert_eq!(store.list(&list).unwrap(), vec![json!({"id": "x", "v": 1}), json!("b")]);

        store.remove(&list, json!({"id": "x"})).unwrap();
        assert_eq!(store.list(&list).unwrap(), vec![json!("b")]);
        store.remove(&list, json!("zzz")).unwrap();
        assert_eq!(store.list(&list).unwrap(), vec![json!("b")]);

        assert!(store.list(&text).unwrap().is_empty());
        store.set(&text, json!("hello")).unwrap();
        assert_eq!(store.list(&text).unwrap(), vec![json!("hello")]);
        store.remove(&text, json!("other")).unwrap();
        assert_eq!(store.get(&text).unwrap().value, json!("hello"));
        store.remove(&text, json!("hello")).unwrap();
        assert_eq!(store.get(&text).unwrap().value, Json::Null);

        assert!(matches!(store.list("ctx:missing"), Err(ContextError::UnknownView(_))));
        assert!(matches!(
            store.remove("ctx:missing", json!(1)),
            Err(ContextError::UnknownView(_))
        ));
    }

    #[test]
    fn test_find_by_type_and_tags() {
        let mut store = ViewStore::default();
        store.create("ctx", ViewType::entity("Text"), None, vec!["greeting".into()]);
        store.create("ctx", ViewType::entity("Text"), None, vec![]);
        store.create("ctx", ViewType::entity("Number"), None, vec![]);

        assert_eq!(store.find(&ViewType::entity("Text"), &[]).len(), 2);
        assert_eq!(store.find(&ViewType::entity("Text"), &["greeting".into()]).len(), 1);
        assert!(store.find(&ViewType::collection_of("Text"), &[]).is_empty());
    }
}
