//! Handle table
//!
//! Generic registration of open objects so a handle can be type-checked
//! before a comm operation is dispatched on it.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashMap;

use crate::device::CommDevice;
use crate::error::CommError;

/// Opaque handle value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HandleId(pub u64);

impl HandleId {
    /// `NULL`
    pub const NULL: HandleId = HandleId(0);
    /// `INVALID_HANDLE_VALUE`
    pub const INVALID: HandleId = HandleId(u64::MAX);

    /// Neither `NULL` nor `INVALID_HANDLE_VALUE`
    pub fn is_valid(&self) -> bool {
        *self != Self::NULL && *self != Self::INVALID
    }
}

/// Kind of object behind a handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandleKind {
    /// Serial or parallel comm device
    Comm,
    /// Regular file
    File,
    /// Named or anonymous pipe
    Pipe,
    /// Synchronization event
    Event,
}

/// An object that can be registered in a [`HandleTable`]
pub trait HandleObject: Any + Send {
    /// Kind used for type checks
    fn kind(&self) -> HandleKind;

    /// Upcast for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Upcast for downcasting
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl HandleObject for CommDevice {
    fn kind(&self) -> HandleKind {
        HandleKind::Comm
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Open handles of a process
pub struct HandleTable {
    next_id: u64,
    handles: HashMap<HandleId, Box<dyn HandleObject>>,
}

impl HandleTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            next_id: 1,
            handles: HashMap::new(),
        }
    }

    /// Register an object and return its handle
    pub fn insert(&mut self, object: Box<dyn HandleObject>) -> HandleId {
        let id = HandleId(self.next_id);
        self.next_id += 1;
        self.handles.insert(id, object);
        id
    }

    /// Kind of the object behind `id`
    pub fn kind(&self, id: HandleId) -> Option<HandleKind> {
        self.handles.get(&id).map(|object| object.kind())
    }

    /// The comm device behind `id`, or `InvalidHandle`
    pub fn comm(&self, id: HandleId) -> Result<&CommDevice, CommError> {
        self.handles
            .get(&id)
            .filter(|object| object.kind() == HandleKind::Comm)
            .and_then(|object| object.as_any().downcast_ref::<CommDevice>())
            .ok_or(CommError::InvalidHandle)
    }

    /// The comm device behind `id`, or `InvalidHandle`
    pub fn comm_mut(&mut self, id: HandleId) -> Result<&mut CommDevice, CommError> {
        self.handles
            .get_mut(&id)
            .filter(|object| object.kind() == HandleKind::Comm)
            .and_then(|object| object.as_any_mut().downcast_mut::<CommDevice>())
            .ok_or(CommError::InvalidHandle)
    }

    /// Unregister and drop the object behind `id`
    pub fn close(&mut self, id: HandleId) -> Result<(), CommError> {
        self.handles
            .remove(&id)
            .map(drop)
            .ok_or(CommError::InvalidHandle)
    }

    /// Number of open handles
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Whether no handle is open
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl Default for HandleTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Event;

    impl HandleObject for Event {
        fn kind(&self) -> HandleKind {
            HandleKind::Event
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[test]
    fn test_wrong_kind_is_invalid_handle() {
        let mut table = HandleTable::new();
        let id = table.insert(Box::new(Event));

        assert_eq!(table.kind(id), Some(HandleKind::Event));
        assert!(matches!(table.comm(id), Err(CommError::InvalidHandle)));
        assert!(matches!(table.comm_mut(id), Err(CommError::InvalidHandle)));
    }

    #[test]
    fn test_null_and_unknown_handles() {
        let table = HandleTable::new();
        assert!(!HandleId::NULL.is_valid());
        assert!(!HandleId::INVALID.is_valid());
        assert!(matches!(table.comm(HandleId::NULL), Err(CommError::InvalidHandle)));
        assert!(matches!(table.comm(HandleId(42)), Err(CommError::InvalidHandle)));
    }

    #[test]
    fn test_close_once() {
        let mut table = HandleTable::new();
        let id = table.insert(Box::new(Event));
        assert!(id.is_valid());
        assert_eq!(table.len(), 1);

        table.close(id).unwrap();
        assert!(table.is_empty());
        assert!(matches!(table.close(id), Err(CommError::InvalidHandle)));
    }
}
