use std::cmp::Ordering;

/// Insertion-ordered list whose removals leave holes until the next [`clean`].
///
/// Removing an entry while iterating by index never shifts the entries that
/// have not been visited yet. Holes are compacted at explicit sync points
/// (`clean`, `sort_if_unsorted`).
///
/// [`clean`]: ObjectList::clean
#[derive(Debug, Clone)]
pub struct ObjectList<T> {
    slots: Vec<Option<T>>,
    live: usize,
    unsorted: bool,
}

impl<T> Default for ObjectList<T> {
    fn default() -> Self {
        Self { slots: Vec::new(), live: 0, unsorted: false }
    }
}

impl<T> ObjectList<T> {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `item` and marks the list unsorted.
    pub fn push(&mut self, item: T) {
        self.slots.push(Some(item));
        self.live += 1;
        self.unsorted = true;
    }

    /// Tombstones the slot at `index`.
    pub fn remove_at(&mut self, index: usize) -> Option<T> {
        let item = self.slots.get_mut(index)?.take()?;
        self.live -= 1;
        Some(item)
    }

    /// Number of slots, holes included. Index-based iteration must use this bound.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Number of live entries.
    #[inline]
    pub fn live_len(&self) -> usize {
        self.live
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index)?.as_ref()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.slots.iter().flatten()
    }

    /// Drops every hole, keeping live entries in order.
    pub fn clean(&mut self) {
        if self.live != self.slots.len() {
            self.slots.retain(Option::is_some);
        }
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.live = 0;
        self.unsorted = false;
    }

    #[inline]
    pub fn mark_unsorted(&mut self) {
        self.unsorted = true;
    }

    #[inline]
    pub fn is_unsorted(&self) -> bool {
        self.unsorted
    }

    /// Cleans, then insertion-sorts by `cmp` if the list was marked unsorted.
    ///
    /// The sort is stable; entries comparing equal keep their insertion order.
    /// Returns `true` if a sort ran.
    pub fn sort_if_unsorted(&mut self, mut cmp: impl FnMut(&T, &T) -> Ordering) -> bool {
        self.clean();
        if !self.unsorted {
            return false;
        }

        for i in 1..self.slots.len() {
            let mut j = i;
            while j > 0 {
                let ord = match (&self.slots[j - 1], &self.slots[j]) {
                    (Some(a), Some(b)) => cmp(a, b),
                    _ => Ordering::Equal,
                };
                if ord != Ordering::Greater {
                    break;
                }
                self.slots.swap(j - 1, j);
                j -= 1;
            }
        }

        self.unsorted = false;
        true
    }
}

impl<T: PartialEq> ObjectList<T> {
    /// Tombstones the first slot holding `item`.
    pub fn remove(&mut self, item: &T) -> bool {
        match self.position(item) {
            Some(i) => self.remove_at(i).is_some(),
            None => false,
        }
    }

    pub fn position(&self, item: &T) -> Option<usize> {
        self.slots.iter().position(|slot| slot.as_ref() == Some(item))
    }

    #[inline]
    pub fn contains(&self, item: &T) -> bool {
        self.position(item).is_some()
    }
}
