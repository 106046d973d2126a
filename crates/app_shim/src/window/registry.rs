//! Window registry
//!
//! Records live in a slot-map arena, which is their only owner. Two index
//! maps point into the arena: one by public [`WindowId`], one by
//! [`NativeHandle`]. Every addressable record appears exactly once in each
//! index; a record created after the handle space ran out has no id and is
//! reachable through the native index only.
//!
//! The registry itself is not synchronized. The framework keeps it behind a
//! single mutex, and only the router thread mutates it.

use slotmap::{new_key_type, SlotMap};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

use super::{WindowId, WindowRecord};
use crate::platform::NativeHandle;

new_key_type! {
    /// Arena slot of a window record
    pub struct RecordKey;
}

/// Registry errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// All 32767 window handles have been issued
    #[error("Window handle space exhausted")]
    HandleSpaceExhausted,

    /// A record with this id is already registered
    #[error("Duplicate window id: {0}")]
    DuplicateId(WindowId),

    /// A record with this native handle is already registered
    #[error("Duplicate native handle: {0}")]
    DuplicateNative(NativeHandle),
}

/// Monotonic window id source
///
/// Hands out 1, 2, ... 32767 and then fails forever. Ids are never reused,
/// so a stale id can never name a newer window.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: Option<WindowId>,
}

impl IdAllocator {
    /// Start at [`WindowId::MIN`]
    pub fn new() -> Self {
        Self {
            next: Some(WindowId::MIN),
        }
    }

    /// Take the next id
    pub fn allocate(&mut self) -> Result<WindowId, RegistryError> {
        let id = self.next.ok_or(RegistryError::HandleSpaceExhausted)?;
        self.next = id.raw().checked_add(1).and_then(WindowId::from_raw);
        Ok(id)
    }

    /// Number of ids still available
    pub fn remaining(&self) -> usize {
        self.next
            .map_or(0, |next| (i32::from(i16::MAX) - i32::from(next.raw()) + 1) as usize)
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Arena of window records with id and native-handle indexes
#[derive(Debug, Default)]
pub struct Registry {
    records: SlotMap<RecordKey, WindowRecord>,
    by_id: BTreeMap<WindowId, RecordKey>,
    by_native: HashMap<NativeHandle, RecordKey>,
    ids: IdAllocator,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the next window id
    pub fn allocate_id(&mut self) -> Result<WindowId, RegistryError> {
        self.ids.allocate()
    }

    /// Add a record to the arena and both indexes
    ///
    /// A record with [`WindowId::NONE`] is indexed by native handle only.
    pub fn insert(&mut self, record: WindowRecord) -> Result<RecordKey, RegistryError> {
        let id = record.id();
        let native = record.native();

        if self.by_native.contains_key(&native) {
            return Err(RegistryError::DuplicateNative(native));
        }
        if record.is_addressable() && self.by_id.contains_key(&id) {
            return Err(RegistryError::DuplicateId(id));
        }

        let key = self.records.insert(record);
        self.by_native.insert(native, key);
        if id.is_some() {
            self.by_id.insert(id, key);
        }
        Ok(key)
    }

    /// Find a record by public handle
    pub fn lookup(&self, id: WindowId) -> Option<&WindowRecord> {
        self.by_id.get(&id).and_then(|&key| self.records.get(key))
    }

    /// Find a record by public handle, mutably
    pub fn lookup_mut(&mut self, id: WindowId) -> Option<&mut WindowRecord> {
        let key = *self.by_id.get(&id)?;
        self.records.get_mut(key)
    }

    /// Find a record by native handle
    pub fn lookup_native(&self, native: NativeHandle) -> Option<&WindowRecord> {
        self.by_native.get(&native).and_then(|&key| self.records.get(key))
    }

    /// Find a record by native handle, mutably
    pub fn lookup_native_mut(&mut self, native: NativeHandle) -> Option<&mut WindowRecord> {
        let key = *self.by_native.get(&native)?;
        self.records.get_mut(key)
    }

    /// Remove a record from both indexes and the arena, returning it
    ///
    /// This is the only way a record leaves the registry. The handle is also
    /// dropped from every remaining dependent list, since the window system
    /// may hand it out again to an unrelated window.
    pub fn erase(&mut self, native: NativeHandle) -> Option<WindowRecord> {
        let key = self.by_native.remove(&native)?;
        let record = self.records.remove(key)?;
        if record.is_addressable() {
            self.by_id.remove(&record.id());
        }
        for other in self.records.values_mut() {
            other.dependents.retain(|&dependent| dependent != native);
        }
        Some(record)
    }

    /// Number of live records, addressable or not
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no records are live
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Live window ids in ascending order
    pub fn ids(&self) -> Vec<WindowId> {
        self.by_id.keys().copied().collect()
    }

    /// Native handles of every live record
    pub fn native_handles(&self) -> Vec<NativeHandle> {
        self.records.values().map(WindowRecord::native).collect()
    }

    /// Iterate over live records
    pub fn iter(&self) -> impl Iterator<Item = &WindowRecord> {
        self.records.values()
    }

    /// Iterate mutably over live records
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut WindowRecord> {
        self.records.values_mut()
    }

    /// Number of ids still available
    pub fn remaining_ids(&self) -> usize {
        self.ids.remaining()
    }
}
