//! Growable list builder.
//!
//! The builder owns a sentinel cell: its tail is the first cell of the list
//! under construction, and its head is the last cell (the sentinel itself
//! while the list is empty). Appending is constant time.

use super::{Pair, Ptr, Storage};

pub struct StretchyList<'a> {
    store: &'a Storage,
    sentinel: Ptr<'a>,
}

impl<'a> StretchyList<'a> {
    pub fn new(store: &'a Storage) -> Self {
        let sentinel = store.put(Pair::cons(Ptr::nil(), Ptr::nil()));
        store.update_pair(sentinel.raw, |p| p.head = sentinel.raw);
        StretchyList { store, sentinel }
    }

    /// Append an untagged element; returns the new cell.
    pub fn append(&mut self, value: Ptr<'a>) -> Ptr<'a> {
        self.append_tagged(value, Ptr::nil())
    }

    /// Append an element with a tag (an argument or formal name).
    pub fn append_tagged(&mut self, value: Ptr<'a>, tag: Ptr<'a>) -> Ptr<'a> {
        let cell = self.store.put(Pair::tagged(value, Ptr::nil(), tag));
        let last = self.last();
        self.store.update_pair(last.raw, |p| p.tail = cell.raw);
        self.store.update_pair(self.sentinel.raw, |p| p.head = cell.raw);
        cell
    }

    fn last(&self) -> Ptr<'a> {
        // The sentinel is always a cell.
        self.sentinel.head().unwrap_or(self.sentinel)
    }

    pub fn is_empty(&self) -> bool {
        self.last() == self.sentinel
    }

    /// The finished list: its first cell, or `nil` if nothing was appended.
    pub fn finalize(self) -> Ptr<'a> {
        self.sentinel.tail().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::StretchyList;
    use crate::data::{Ptr, Storage};

    #[test]
    fn empty_is_nil() {
        let store = Storage::default();
        let list = StretchyList::new(&store);
        assert!(list.is_empty());
        assert!(list.finalize().is_nil());
    }

    #[test]
    fn appends_in_order() {
        let store = Storage::default();
        let mut list = StretchyList::new(&store);
        let values: Vec<Ptr> = (0..4).map(|i| store.scalar_integer(Some(i))).collect();
        let mut cells = Vec::new();
        for v in &values {
            cells.push(list.append(*v));
        }
        let name = store.make_symbol("n");
        let tagged = list.append_tagged(store.missing_arg(), name);
        assert!(!list.is_empty());
        let head = list.finalize();

        assert_eq!(head, cells[0]);
        assert_eq!(head.len(), 5);
        let got: Vec<Ptr> = head.iter().map(|c| c.head).take(4).collect();
        assert_eq!(got, values);
        assert_eq!(head.last_cell(), tagged);
        assert_eq!(tagged.tag(), Some(name));
        assert!(tagged.tail().unwrap().is_nil());
    }
}
