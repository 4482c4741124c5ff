//! Ordered collections of uniquely identified elements
//!
//! [`IdentifiedVec`] keeps insertion order like a `Vec` while guaranteeing that no
//! two elements share an id. Element reducers address elements by id (see
//! [`for_each`](crate::composition::for_each)), so positions can shift between an
//! action being created and being processed without touching the wrong element.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::hash::Hash;

/// Types with a stable identity
pub trait Identifiable {
    /// The identifier type
    type Id: Eq + Hash + Clone;

    /// The identity of this value. Must not change over the value's lifetime.
    fn id(&self) -> Self::Id;
}

/// An ordered collection with unique element ids
///
/// Lookups by id are linear; the collection is meant for screen-sized lists.
///
/// # Examples
///
/// ```
/// use composable_core::{Identifiable, IdentifiedVec};
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct Item {
///     id: u8,
///     label: &'static str,
/// }
///
/// impl Identifiable for Item {
///     type Id = u8;
///     fn id(&self) -> u8 {
///         self.id
///     }
/// }
///
/// let mut items = IdentifiedVec::new();
/// assert!(items.push(Item { id: 1, label: "one" }));
/// assert!(items.insert(0, Item { id: 2, label: "two" }));
/// assert!(!items.push(Item { id: 1, label: "duplicate" }));
///
/// assert_eq!(items.ids(), vec![2, 1]);
/// assert_eq!(items.get(&1).map(|item| item.label), Some("one"));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct IdentifiedVec<T> {
    elements: Vec<T>,
}

impl<T> Default for IdentifiedVec<T> {
    fn default() -> Self {
        Self {
            elements: Vec::new(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for IdentifiedVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.elements).finish()
    }
}

impl<T> IdentifiedVec<T> {
    /// An empty collection
    #[must_use]
    pub const fn new() -> Self {
        Self {
            elements: Vec::new(),
        }
    }

    /// Number of elements
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the collection has no elements
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Iterate in order
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.elements.iter()
    }

    /// The elements as a slice
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.elements
    }

    /// Keep only the elements matching `keep`, preserving order
    pub fn retain(&mut self, keep: impl FnMut(&T) -> bool) {
        self.elements.retain(keep);
    }

    /// Remove the elements at the given positions
    ///
    /// Out-of-range positions are ignored.
    pub fn remove_at_offsets(&mut self, offsets: &BTreeSet<usize>) {
        let mut index = 0;
        self.elements.retain(|_| {
            let keep = !offsets.contains(&index);
            index += 1;
            keep
        });
    }

    /// Move the elements at `offsets` so they sit just before the element that was
    /// at position `destination` before the move.
    ///
    /// `destination` is expressed in the positions of the collection *before* the
    /// move and may equal `len()` to move to the end. Moved elements keep their
    /// relative order; every other element keeps its relative order too.
    /// Out-of-range offsets are ignored and `destination` is clamped to `len()`.
    ///
    /// ```
    /// use composable_core::{Identifiable, IdentifiedVec};
    /// use std::collections::BTreeSet;
    ///
    /// #[derive(Clone, Debug, PartialEq)]
    /// struct N(char);
    /// impl Identifiable for N {
    ///     type Id = char;
    ///     fn id(&self) -> char { self.0 }
    /// }
    ///
    /// let mut v: IdentifiedVec<N> = "abcde".chars().map(N).collect();
    /// v.move_items(&BTreeSet::from([0, 1]), 4);
    /// assert_eq!(v.ids().into_iter().collect::<String>(), "cdabe");
    /// ```
    pub fn move_items(&mut self, offsets: &BTreeSet<usize>, destination: usize) {
        let len = self.elements.len();
        let destination = destination.min(len);
        let offsets: BTreeSet<usize> = offsets.iter().copied().filter(|&i| i < len).collect();
        if offsets.is_empty() {
            return;
        }

        let shift = offsets.range(..destination).count();
        let mut moved = Vec::with_capacity(offsets.len());
        let mut rest = Vec::with_capacity(len - offsets.len());
        for (index, element) in self.elements.drain(..).enumerate() {
            if offsets.contains(&index) {
                moved.push(element);
            } else {
                rest.push(element);
            }
        }

        let at = destination - shift;
        rest.splice(at..at, moved);
        self.elements = rest;
    }

    /// Stable sort by a derived key
    pub fn sort_by_key<K: Ord>(&mut self, key: impl FnMut(&T) -> K) {
        self.elements.sort_by_key(key);
    }

    /// Swap two positions
    ///
    /// # Panics
    ///
    /// Panics if either position is out of range, like [`slice::swap`].
    pub fn swap(&mut self, a: usize, b: usize) {
        self.elements.swap(a, b);
    }
}

impl<T: Identifiable> IdentifiedVec<T> {
    /// Insert at `index` (clamped to `len()`)
    ///
    /// Returns `false`, leaving the collection untouched, when an element with
    /// the same id is already present.
    #[must_use = "a duplicate id leaves the collection unchanged"]
    pub fn insert(&mut self, index: usize, element: T) -> bool {
        if self.contains(&element.id()) {
            return false;
        }
        let index = index.min(self.elements.len());
        self.elements.insert(index, element);
        true
    }

    /// Append at the end; returns `false` on a duplicate id
    #[must_use = "a duplicate id leaves the collection unchanged"]
    pub fn push(&mut self, element: T) -> bool {
        let len = self.elements.len();
        self.insert(len, element)
    }

    /// Position of the element with `id`
    #[must_use]
    pub fn index_of(&self, id: &T::Id) -> Option<usize> {
        self.elements.iter().position(|element| element.id() == *id)
    }

    /// Whether an element with `id` exists
    #[must_use]
    pub fn contains(&self, id: &T::Id) -> bool {
        self.index_of(id).is_some()
    }

    /// The element with `id`
    #[must_use]
    pub fn get(&self, id: &T::Id) -> Option<&T> {
        self.elements.iter().find(|element| element.id() == *id)
    }

    /// The element with `id`, mutably
    ///
    /// Changing the element's identity through this reference breaks uniqueness.
    pub fn get_mut(&mut self, id: &T::Id) -> Option<&mut T> {
        self.elements.iter_mut().find(|element| element.id() == *id)
    }

    /// Remove and return the element with `id`
    pub fn remove(&mut self, id: &T::Id) -> Option<T> {
        let index = self.index_of(id)?;
        Some(self.elements.remove(index))
    }

    /// All ids in order
    #[must_use]
    pub fn ids(&self) -> Vec<T::Id> {
        self.elements.iter().map(Identifiable::id).collect()
    }
}

impl<T: Identifiable> FromIterator<T> for IdentifiedVec<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut seen = HashSet::new();
        let elements = iter
            .into_iter()
            .filter(|element| seen.insert(element.id()))
            .collect();
        Self { elements }
    }
}

impl<T> IntoIterator for IdentifiedVec<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a IdentifiedVec<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl<T: Serialize> Serialize for IdentifiedVec<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.elements)
    }
}

impl<'de, T> Deserialize<'de> for IdentifiedVec<T>
where
    T: Identifiable + Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<T>::deserialize(deserializer).map(|elements| elements.into_iter().collect())
    }
}
