//! Specialized collection types

pub use slotmap::{Key, SlotMap};

slotmap::new_key_type! {
    /// Generation-counted key of a process slot inside its group
    ///
    /// A reclaimed slot bumps its generation, so keys held by callers after
    /// the process was reaped never resolve to the slot's next occupant.
    pub struct ProcessKey;
}

/// Handle-based map using slot map for stable references
pub type HandleMap<T> = SlotMap<ProcessKey, T>;

/// Stable 64-bit encoding of a key (slot index plus generation)
pub fn key_bits<K: Key>(key: K) -> u64 {
    key.data().as_ffi()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reused_slot_gets_new_key() {
        let mut map: HandleMap<&str> = HandleMap::with_key();
        let first = map.insert("first");
        map.remove(first);
        let second = map.insert("second");

        assert_ne!(key_bits(first), key_bits(second));
        assert!(map.get(first).is_none());
        assert_eq!(map.get(second), Some(&"second"));
    }
}
