//! Master and project repositories over a [`KeyValueStore`].
//!
//! Each repository keeps its whole collection as one JSON object under a
//! single key. Unreadable payloads are logged and read as empty; writes
//! report failures to the caller.

use std::collections::BTreeMap;
use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::config::{EditorConfig, MASTERS_KEY, PROJECTS_KEY};
use crate::error::StoreError;
use crate::store::KeyValueStore;
use crate::template::MasterBlockData;

fn read_map<S: KeyValueStore, T: DeserializeOwned>(store: &S, key: &str) -> BTreeMap<String, T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return BTreeMap::new(),
        Err(e) => {
            log::warn!("cannot read `{key}`: {e}");
            return BTreeMap::new();
        }
    };
    serde_json::from_str(&raw).unwrap_or_else(|e| {
        log::warn!("ignoring unreadable `{key}` payload: {e}");
        BTreeMap::new()
    })
}

fn write_map<S: KeyValueStore, T: Serialize>(
    store: &mut S,
    key: &str,
    map: &BTreeMap<String, T>,
) -> Result<(), StoreError> {
    store.set(key, serde_json::to_string(map)?)
}

/// Named master blocks.
#[derive(Debug)]
pub struct MasterRepository<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> MasterRepository<S> {
    pub fn new(store: S) -> Self {
        Self::with_key(store, MASTERS_KEY)
    }

    pub fn from_config(store: S, config: &EditorConfig) -> Self {
        Self::with_key(store, &config.masters_key)
    }

    pub fn with_key(store: S, key: &str) -> Self {
        MasterRepository {
            store,
            key: key.to_string(),
        }
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    fn read_all(&self) -> BTreeMap<String, MasterBlockData> {
        read_map(&self.store, &self.key)
    }

    /// Stored ids in sorted order.
    pub fn list(&self) -> Vec<String> {
        self.read_all().into_keys().collect()
    }

    pub fn load(&self, id: &str) -> Option<MasterBlockData> {
        self.read_all().remove(id)
    }

    /// Store `data` under `id`, overwriting any previous entry.
    pub fn save(&mut self, id: &str, data: &MasterBlockData) -> Result<(), StoreError> {
        let mut all = self.read_all();
        all.insert(id.to_string(), data.clone());
        write_map(&mut self.store, &self.key, &all)?;
        log::info!("saved master block `{id}`");
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Result<(), StoreError> {
        let mut all = self.read_all();
        if all.remove(id).is_some() {
            write_map(&mut self.store, &self.key, &all)?;
            log::info!("removed master block `{id}`");
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectMeta {
    pub name: String,
    pub date: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProjectSummary {
    pub id: String,
    pub name: String,
    pub date: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectEntry<T> {
    pub meta: ProjectMeta,
    pub data: T,
}

/// Named projects carrying a document of type `T`, each stamped with the
/// time it was last saved.
#[derive(Debug)]
pub struct ProjectRepository<S, T> {
    store: S,
    key: String,
    _data: PhantomData<fn() -> T>,
}

impl<S: KeyValueStore, T: Serialize + DeserializeOwned> ProjectRepository<S, T> {
    pub fn new(store: S) -> Self {
        Self::with_key(store, PROJECTS_KEY)
    }

    pub fn from_config(store: S, config: &EditorConfig) -> Self {
        Self::with_key(store, &config.projects_key)
    }

    pub fn with_key(store: S, key: &str) -> Self {
        ProjectRepository {
            store,
            key: key.to_string(),
            _data: PhantomData,
        }
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    // entries stay untyped so one bad document does not hide the others
    fn read_all(&self) -> BTreeMap<String, ProjectEntry<Value>> {
        read_map(&self.store, &self.key)
    }

    /// Projects, most recently saved first.
    pub fn list(&self) -> Vec<ProjectSummary> {
        let mut list: Vec<ProjectSummary> = self
            .read_all()
            .into_iter()
            .map(|(id, entry)| ProjectSummary {
                id,
                name: entry.meta.name,
                date: entry.meta.date,
            })
            .collect();
        list.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));
        list
    }

    pub fn load(&self, id: &str) -> Option<ProjectEntry<T>> {
        let entry = self.read_all().remove(id)?;
        match serde_json::from_value(entry.data) {
            Ok(data) => Some(ProjectEntry {
                meta: entry.meta,
                data,
            }),
            Err(e) => {
                log::warn!("project `{id}` is unreadable: {e}");
                None
            }
        }
    }

    /// Store `data` under `id` with the current time as its date.
    pub fn save(&mut self, id: &str, name: &str, data: &T) -> Result<(), StoreError> {
        let mut all = self.read_all();
        let entry = ProjectEntry {
            meta: ProjectMeta {
                name: name.to_string(),
                date: Utc::now(),
            },
            data: serde_json::to_value(data)?,
        };
        all.insert(id.to_string(), entry);
        write_map(&mut self.store, &self.key, &all)?;
        log::info!("saved project `{name}` ({id})");
        Ok(())
    }

    /// Save under a freshly generated id, which is returned.
    pub fn create(&mut self, name: &str, data: &T) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        self.save(&id, name, data)?;
        Ok(id)
    }

    pub fn remove(&mut self, id: &str) -> Result<(), StoreError> {
        let mut all = self.read_all();
        if all.remove(id).is_some() {
            write_map(&mut self.store, &self.key, &all)?;
            log::info!("removed project {id}");
        }
        Ok(())
    }
}
