//! One resource type's records inside one project.

use std::collections::{BTreeMap, HashMap};

use crate::error::{Result, StoreError};
use crate::resource::Resource;

struct Slot {
    seq: u64,
    resource: Resource,
}

/// Insertion-ordered records with an id index and a key index.
///
/// Overwriting an existing id keeps its original position.
#[derive(Default)]
pub(crate) struct Collection {
    next_seq: u64,
    records: HashMap<String, Slot>,
    order: BTreeMap<u64, String>,
    keys: HashMap<String, String>,
}

impl Collection {
    pub(crate) fn insert(&mut self, resource: Resource) -> Result<()> {
        if let Some(key) = resource.key() {
            if let Some(owner) = self.keys.get(key) {
                if owner != resource.id() {
                    return Err(StoreError::DuplicateKey {
                        type_id: resource.type_id().to_string(),
                        key: key.to_string(),
                        owner: owner.clone(),
                    });
                }
            }
        }

        let id = resource.id().to_string();
        let seq = match self.records.get(&id) {
            Some(slot) => {
                if let Some(old_key) = slot.resource.key() {
                    if Some(old_key) != resource.key() {
                        self.keys.remove(old_key);
                    }
                }
                slot.seq
            }
            None => {
                let seq = self.next_seq;
                self.next_seq += 1;
                self.order.insert(seq, id.clone());
                seq
            }
        };

        if let Some(key) = resource.key() {
            self.keys.insert(key.to_string(), id.clone());
        }
        self.records.insert(id, Slot { seq, resource });
        Ok(())
    }

    pub(crate) fn get(&self, id: &str) -> Option<&Resource> {
        self.records.get(id).map(|slot| &slot.resource)
    }

    pub(crate) fn get_by_key(&self, key: &str) -> Option<&Resource> {
        self.keys.get(key).and_then(|id| self.get(id))
    }

    pub(crate) fn remove(&mut self, id: &str) -> Option<Resource> {
        let slot = self.records.remove(id)?;
        self.order.remove(&slot.seq);
        if let Some(key) = slot.resource.key() {
            self.keys.remove(key);
        }
        Some(slot.resource)
    }

    /// Records in insertion order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Resource> + '_ {
        self.order.values().filter_map(|id| self.get(id))
    }
}
