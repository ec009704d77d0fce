//! Selection state scoped to one collection.

use std::collections::HashSet;
use std::hash::Hash;

/// Tracks which records of a collection the user has selected.
///
/// The owner is responsible for calling [`SelectionController::retain_present`]
/// whenever its collection changes, so that no id outlives its record.
#[derive(Debug, Clone)]
pub struct SelectionController<K> {
    selected: HashSet<K>,
}

impl<K> Default for SelectionController<K> {
    fn default() -> Self {
        Self {
            selected: HashSet::new(),
        }
    }
}

impl<K: Eq + Hash + Clone> SelectionController<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip membership of `id`. Returns whether it is now selected.
    pub fn toggle(&mut self, id: K) -> bool {
        if self.selected.remove(&id) {
            false
        } else {
            self.selected.insert(id);
            true
        }
    }

    /// Replace the selection with every id of the current collection.
    pub fn select_all<I: IntoIterator<Item = K>>(&mut self, ids: I) {
        self.selected = ids.into_iter().collect();
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn count(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn contains(&self, id: &K) -> bool {
        self.selected.contains(id)
    }

    pub fn ids(&self) -> &HashSet<K> {
        &self.selected
    }

    /// Drop every id `present` rejects. Returns how many were dropped.
    pub fn retain_present(&mut self, present: impl Fn(&K) -> bool) -> usize {
        let before = self.selected.len();
        self.selected.retain(|id| present(id));
        before - self.selected.len()
    }

    /// Bulk actions are unavailable with nothing selected or while busy.
    pub fn bulk_disabled(&self, loading: bool) -> bool {
        self.selected.is_empty() || loading
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_flips_membership() {
        let mut selection = SelectionController::new();
        assert!(selection.toggle(4));
        assert!(selection.contains(&4));
        assert!(!selection.toggle(4));
        assert!(selection.is_empty());
    }

    #[test]
    fn test_select_all_replaces() {
        let mut selection = SelectionController::new();
        selection.toggle(99);
        selection.select_all([1, 2, 3]);
        assert_eq!(selection.count(), 3);
        assert!(!selection.contains(&99));
        selection.clear();
        assert_eq!(selection.count(), 0);
    }

    #[test]
    fn test_retain_present_drops_missing() {
        let mut selection = SelectionController::new();
        selection.select_all([1, 2, 3]);
        let dropped = selection.retain_present(|id| *id != 2);
        assert_eq!(dropped, 1);
        assert_eq!(selection.ids(), &HashSet::from([1, 3]));
    }

    #[test]
    fn test_bulk_disabled() {
        let mut selection = SelectionController::new();
        assert!(selection.bulk_disabled(false));
        selection.toggle("w1".to_string());
        assert!(!selection.bulk_disabled(false));
        assert!(selection.bulk_disabled(true));
    }
}
