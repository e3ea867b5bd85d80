//! Append-only registry of parsed entities, addressable by wire handle.

use crate::constants::BASE_WIRE_HANDLE;
use crate::value::Value;

/// The handle table.
///
/// Every newly encountered class descriptor, string, array record, object,
/// and enum appends exactly one entry; Reference tags resolve against it by
/// `wire_id - 0x7E0000`.
#[derive(Debug, Default)]
pub struct HandleTable {
    entries: Vec<Value>,
}

/// A reserved table slot, to be completed with [`HandleTable::fill`].
///
/// Reservation fixes the index: appends made between reserve and fill (by
/// nested parsing) land after it, so the completed value keeps the wire id
/// the stream assigned.
#[derive(Debug)]
pub struct DeferredHandle {
    index: usize,
}

impl HandleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends a parsed value and hands it back.
    pub fn register(&mut self, value: Value) -> Value {
        self.entries.push(value.clone());
        value
    }

    /// Reserves the next index with a null placeholder.
    pub fn reserve(&mut self) -> DeferredHandle {
        let index = self.entries.len();
        self.entries.push(Value::Null);
        DeferredHandle { index }
    }

    /// Writes a reserved slot and hands the value back.
    pub fn fill(&mut self, handle: DeferredHandle, value: Value) -> Value {
        self.entries[handle.index] = value.clone();
        value
    }

    /// Resolves a wire-level handle id.
    ///
    /// Out-of-range ids yield `None`; the caller surfaces null rather than
    /// an error, the one tolerant case in the protocol.
    pub fn lookup(&self, wire_id: i32) -> Option<Value> {
        let index = i64::from(wire_id) - i64::from(BASE_WIRE_HANDLE);
        if index >= 0 && (index as usize) < self.entries.len() {
            Some(self.entries[index as usize].clone())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_assigns_sequential_wire_ids() {
        let mut handles = HandleTable::new();
        handles.register(Value::Str("a".into()));
        handles.register(Value::Str("b".into()));
        assert_eq!(handles.lookup(BASE_WIRE_HANDLE), Some(Value::Str("a".into())));
        assert_eq!(
            handles.lookup(BASE_WIRE_HANDLE + 1),
            Some(Value::Str("b".into()))
        );
    }

    #[test]
    fn lookup_out_of_range_is_none() {
        let mut handles = HandleTable::new();
        handles.register(Value::Null);
        assert_eq!(handles.lookup(BASE_WIRE_HANDLE + 1), None);
        assert_eq!(handles.lookup(BASE_WIRE_HANDLE - 1), None);
        assert_eq!(handles.lookup(0), None);
    }

    #[test]
    fn reserve_holds_index_across_later_appends() {
        let mut handles = HandleTable::new();
        let slot = handles.reserve();
        handles.register(Value::Str("nested".into()));
        handles.fill(slot, Value::Str("outer".into()));
        assert_eq!(
            handles.lookup(BASE_WIRE_HANDLE),
            Some(Value::Str("outer".into()))
        );
        assert_eq!(
            handles.lookup(BASE_WIRE_HANDLE + 1),
            Some(Value::Str("nested".into()))
        );
    }

    #[test]
    fn reserved_slot_reads_null_until_filled() {
        let mut handles = HandleTable::new();
        let _slot = handles.reserve();
        assert_eq!(handles.lookup(BASE_WIRE_HANDLE), Some(Value::Null));
    }
}
