use std::sync::atomic::{AtomicU32, Ordering};

/// Entity identifier written to the picking attachment.
///
/// `0` is reserved for "no entity".
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

impl EntityId {
    pub const NONE: EntityId = EntityId(0);

    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for EntityId {
    #[inline]
    fn from(v: u32) -> Self {
        EntityId(v)
    }
}

impl core::fmt::Display for EntityId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic id source starting at 1.
///
/// Ids handed out by one generator never repeat. [`IdGenerator::global`] is
/// the process-wide instance.
#[derive(Debug)]
pub struct IdGenerator {
    next: AtomicU32,
}

static GLOBAL: IdGenerator = IdGenerator::new();

impl IdGenerator {
    pub const fn new() -> Self {
        Self { next: AtomicU32::new(1) }
    }

    #[inline]
    pub fn global() -> &'static IdGenerator {
        &GLOBAL
    }

    pub fn next_id(&self) -> EntityId {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        if id == 0 {
            // Wrapped past u32::MAX; skip the reserved value.
            log::warn!("entity ids wrapped around");
            return EntityId(self.next.fetch_add(1, Ordering::Relaxed));
        }
        EntityId(id)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_start_at_one_and_increase() {
        let ids = IdGenerator::new();
        assert_eq!(ids.next_id(), EntityId(1));
        assert_eq!(ids.next_id(), EntityId(2));
        assert_eq!(ids.next_id(), EntityId(3));
    }

    #[test]
    fn global_never_hands_out_none() {
        let a = IdGenerator::global().next_id();
        let b = IdGenerator::global().next_id();
        assert!(!a.is_none());
        assert!(b > a);
    }
}
