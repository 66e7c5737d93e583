//! Owning storage for one category of power entries

use alloc::vec::Vec;

use crate::{params::PmParameters, Error};

/// An entry that can be stored in an [`EntryList`]
pub trait ListEntry {
    /// The entry's sub-type
    type Kind: Copy + Eq;

    /// Identifier assigned by NDIS, unique within the entry's category
    fn id(&self) -> u32;

    fn kind(&self) -> Self::Kind;

    /// Recomputes the enabled flag from the power management parameters
    fn refresh_enabled(&mut self, parameters: &PmParameters);
}

/// A list of power entries that keeps track of its length.
///
/// Enumeration goes from the most recently inserted entry to the oldest one,
/// though callers shouldn't depend on any particular order.
#[derive(Debug)]
pub struct EntryList<T> {
    entries: Vec<T>,
    count: usize,
}

impl<T> Default for EntryList<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            count: 0,
        }
    }
}

impl<T: ListEntry> EntryList<T> {
    /// Creates a new empty [`EntryList`]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Makes sure that the next [`EntryList::insert`] won't need to allocate
    pub fn reserve_one(&mut self) -> Result<(), Error> {
        self.entries.try_reserve(1)?;
        Ok(())
    }

    /// Adds an entry to the list.
    ///
    /// Doesn't fail if [`EntryList::reserve_one`] was called beforehand.
    pub fn insert(&mut self, entry: T) {
        debug_assert!(
            self.find(entry.id()).is_none(),
            "entry ids must be unique within a list"
        );

        self.entries.push(entry);
        self.count += 1;

        self.assert_valid();
    }

    /// Unlinks the first entry with the identifier `id`, if there is one
    pub fn remove_by_id(&mut self, id: u32) -> Option<T> {
        debug_assert!(self.count > 0, "removing from an empty entry list");

        let position = self.entries.iter().rposition(|entry| entry.id() == id)?;
        let entry = self.entries.remove(position);
        self.count -= 1;

        self.assert_valid();

        Some(entry)
    }

    /// Gets the `index`-th entry in enumeration order
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.count {
            return None;
        }

        self.entries.get(self.count - 1 - index)
    }

    /// Finds the first entry with the identifier `id`
    pub fn find(&self, id: u32) -> Option<&T> {
        self.iter().find(|entry| entry.id() == id)
    }

    /// Creates an iterator over all of the entries, in enumeration order
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator + '_ {
        self.entries.iter().rev()
    }

    /// Creates a mutable iterator over all of the entries
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> + '_ {
        self.entries.iter_mut()
    }

    /// Counts the entries that `predicate` accepts
    pub fn count_matching(&self, mut predicate: impl FnMut(&T) -> bool) -> usize {
        self.iter().filter(|entry| predicate(entry)).count()
    }

    /// Counts the entries of a particular sub-type
    pub fn count_by_kind(&self, kind: T::Kind) -> usize {
        self.count_matching(|entry| entry.kind() == kind)
    }

    /// Recomputes every entry's enabled flag
    pub fn refresh_enabled(&mut self, parameters: &PmParameters) {
        for entry in self.iter_mut() {
            entry.refresh_enabled(parameters);
        }
    }

    /// Removes every entry from the list
    pub fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        self.count = 0;
        self.entries.drain(..).rev()
    }

    /// Ensures that the list is valid
    fn assert_valid(&self) {
        if cfg!(debug_assertions) {
            debug_assert_eq!(
                self.count,
                self.entries.len(),
                "mismatch in entry list length"
            );

            for (index, entry) in self.entries.iter().enumerate() {
                debug_assert!(
                    self.entries[..index].iter().all(|it| it.id() != entry.id()),
                    "duplicate entry id {:#x}",
                    entry.id()
                );
            }
        }
    }
}
