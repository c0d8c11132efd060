/// Inclusive range of selection track keys. `0..=0` means the node has none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TrackRange {
    pub start: u64,
    pub end: u64,
}

impl TrackRange {
    pub const NONE: TrackRange = TrackRange { start: 0, end: 0 };

    pub fn new(start: u64, end: u64) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    pub fn is_none(&self) -> bool {
        self.start == 0
    }

    /// Number of keys covered.
    pub fn len(&self) -> u64 {
        if self.is_none() {
            0
        } else {
            self.end - self.start + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn intersects(&self, other: TrackRange) -> bool {
        !self.is_none() && !other.is_none() && self.start <= other.end && other.start <= self.end
    }

    /// Smallest range covering both; ranges without keys are ignored.
    pub fn union(self, other: TrackRange) -> TrackRange {
        match (self.is_none(), other.is_none()) {
            (true, _) => other,
            (_, true) => self,
            _ => TrackRange::new(self.start.min(other.start), self.end.max(other.end)),
        }
    }
}

/// Hands out fresh, strictly increasing track keys.
#[derive(Debug)]
pub(crate) struct TrackAllocator {
    next: u64,
}

impl Default for TrackAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl TrackAllocator {
    pub(crate) fn allocate(&mut self, count: u64) -> TrackRange {
        if count == 0 {
            return TrackRange::NONE;
        }
        let range = TrackRange::new(self.next, self.next + count - 1);
        self.next += count;
        range
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocations_never_overlap() {
        let mut keys = TrackAllocator::default();
        let a = keys.allocate(3);
        let b = keys.allocate(1);
        assert_eq!(a, TrackRange::new(1, 3));
        assert_eq!(b, TrackRange::new(4, 4));
        assert!(!a.intersects(b));
        assert_eq!(keys.allocate(0), TrackRange::NONE);
    }

    #[test]
    fn union_skips_empty_ranges() {
        let a = TrackRange::new(5, 7);
        assert_eq!(a.union(TrackRange::NONE), a);
        assert_eq!(TrackRange::NONE.union(a), a);
        assert_eq!(a.union(TrackRange::new(2, 2)), TrackRange::new(2, 7));
        assert_eq!(TrackRange::NONE.len(), 0);
        assert_eq!(a.len(), 3);
    }
}
