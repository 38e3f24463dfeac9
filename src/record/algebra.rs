//! Set algebra over key-sorted slices.
//!
//! Every binary operation here is a single two-pointer walk over two inputs
//! that are already sorted by key with no duplicates. Nothing is hashed and
//! nothing is re-sorted, so each operation is O(n + m). The same walk backs
//! both levels of a record: [`Schema`](super::Schema) (names and kinds) and
//! [`Record`](super::Record) (names and values), so the produced shape is
//! always computed alongside the produced value.

use crate::fixed_str::FieldName;
use std::cmp::Ordering;

/// Anything that carries a field name to order by.
pub trait Keyed {
    fn key(&self) -> &str;
}

impl Keyed for FieldName {
    fn key(&self) -> &str {
        self.as_str()
    }
}

impl<V> Keyed for (FieldName, V) {
    fn key(&self) -> &str {
        self.0.as_str()
    }
}

impl<T: Keyed + ?Sized> Keyed for &T {
    fn key(&self) -> &str {
        (**self).key()
    }
}

/// One step of a [`MergeJoin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Joined<'a, A, B> {
    /// Key present only on the left side.
    Left(&'a A),
    /// Key present only on the right side.
    Right(&'a B),
    /// Key present on both sides.
    Both(&'a A, &'a B),
}

impl<'a, A: Keyed, B: Keyed> Joined<'a, A, B> {
    #[must_use]
    pub fn key(&self) -> &'a str {
        match *self {
            Joined::Left(a) | Joined::Both(a, _) => a.key(),
            Joined::Right(b) => b.key(),
        }
    }
}

/// Ordered full outer join of two key-sorted slices.
///
/// The two sides may hold different element types as long as both are
/// keyed, which is how a [`Schema`](super::Schema) is joined against a
/// [`Record`](super::Record) during conversion.
#[derive(Debug, Clone)]
pub struct MergeJoin<'a, A, B> {
    left: &'a [A],
    right: &'a [B],
}

impl<'a, A: Keyed, B: Keyed> MergeJoin<'a, A, B> {
    #[must_use]
    pub fn new(left: &'a [A], right: &'a [B]) -> Self {
        debug_assert!(is_sorted_unique(left), "left input must be key-sorted");
        debug_assert!(is_sorted_unique(right), "right input must be key-sorted");
        Self { left, right }
    }
}

impl<'a, A: Keyed, B: Keyed> Iterator for MergeJoin<'a, A, B> {
    type Item = Joined<'a, A, B>;

    fn next(&mut self) -> Option<Self::Item> {
        match (self.left.split_first(), self.right.split_first()) {
            (None, None) => None,
            (Some((a, rest)), None) => {
                self.left = rest;
                Some(Joined::Left(a))
            }
            (None, Some((b, rest))) => {
                self.right = rest;
                Some(Joined::Right(b))
            }
            (Some((a, a_rest)), Some((b, b_rest))) => match a.key().cmp(b.key()) {
                Ordering::Less => {
                    self.left = a_rest;
                    Some(Joined::Left(a))
                }
                Ordering::Greater => {
                    self.right = b_rest;
                    Some(Joined::Right(b))
                }
                Ordering::Equal => {
                    self.left = a_rest;
                    self.right = b_rest;
                    Some(Joined::Both(a, b))
                }
            },
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let lo = self.left.len().max(self.right.len());
        (lo, Some(self.left.len() + self.right.len()))
    }
}

/// `true` when keys are strictly increasing (sorted, no duplicates).
#[must_use]
pub fn is_sorted_unique<T: Keyed>(items: &[T]) -> bool {
    items.windows(2).all(|w| w[0].key() < w[1].key())
}

/// Sort by key and reject duplicate keys.
///
/// On a duplicate, the offending key is returned as the error.
pub fn sort<T: Keyed>(mut items: Vec<T>) -> Result<Vec<T>, FieldName> {
    // stable merge sort
    items.sort_by(|a, b| a.key().cmp(b.key()));
    if let Some(w) = items.windows(2).find(|w| w[0].key() == w[1].key()) {
        return Err(FieldName::from(w[0].key().to_string()));
    }
    Ok(items)
}

/// All keys from both sides. On a shared key the `newer` entry wins.
pub fn union<T, C>(older: &[T], newer: &[T]) -> C
where
    T: Keyed + Clone,
    C: FromIterator<T>,
{
    MergeJoin::new(older, newer)
        .map(|j| match j {
            Joined::Left(a) => a.clone(),
            Joined::Right(b) | Joined::Both(_, b) => b.clone(),
        })
        .collect()
}

/// Keys present on both sides; entries are taken from `left`.
pub fn intersection<T, U, C>(left: &[T], right: &[U]) -> C
where
    T: Keyed + Clone,
    U: Keyed,
    C: FromIterator<T>,
{
    MergeJoin::new(left, right)
        .filter_map(|j| match j {
            Joined::Both(a, _) => Some(a.clone()),
            _ => None,
        })
        .collect()
}

/// Keys present on exactly one side, each taken from the side that has it.
pub fn difference<T, C>(left: &[T], right: &[T]) -> C
where
    T: Keyed + Clone,
    C: FromIterator<T>,
{
    MergeJoin::new(left, right)
        .filter_map(|j| match j {
            Joined::Left(a) => Some(a.clone()),
            Joined::Right(b) => Some(b.clone()),
            Joined::Both(..) => None,
        })
        .collect()
}

/// Keys of `left` that are absent from `right`.
pub fn subtract<T, U, C>(left: &[T], right: &[U]) -> C
where
    T: Keyed + Clone,
    U: Keyed,
    C: FromIterator<T>,
{
    MergeJoin::new(left, right)
        .filter_map(|j| match j {
            Joined::Left(a) => Some(a.clone()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(keys: &[&'static str]) -> Vec<FieldName> {
        keys.iter().copied().map(FieldName::from_static).collect()
    }

    fn strs(v: &[FieldName]) -> Vec<&str> {
        v.iter().map(FieldName::as_str).collect()
    }

    #[test]
    fn join_walks_both_sides_in_order() {
        let a = names(&["a", "c", "e"]);
        let b = names(&["b", "c", "f"]);
        let keys: Vec<&str> = MergeJoin::new(&a, &b).map(|j| j.key()).collect();
        assert_eq!(keys, vec!["a", "b", "c", "e", "f"]);
    }

    #[test]
    fn union_prefers_newer_entry() {
        let older = vec![(FieldName::from("id"), 1), (FieldName::from("x"), 2)];
        let newer = vec![(FieldName::from("id"), 9), (FieldName::from("y"), 3)];
        let merged: Vec<(FieldName, i32)> = union(&older, &newer);
        assert_eq!(
            merged,
            vec![
                (FieldName::from("id"), 9),
                (FieldName::from("x"), 2),
                (FieldName::from("y"), 3)
            ]
        );
    }

    #[test]
    fn intersection_difference_subtract() {
        let a = names(&["a", "b", "c"]);
        let b = names(&["b", "c", "d"]);
        let i: Vec<FieldName> = intersection(&a, &b);
        let d: Vec<FieldName> = difference(&a, &b);
        let s: Vec<FieldName> = subtract(&a, &b);
        assert_eq!(strs(&i), vec!["b", "c"]);
        assert_eq!(strs(&d), vec!["a", "d"]);
        assert_eq!(strs(&s), vec!["a"]);
    }

    #[test]
    fn sort_rejects_duplicates() {
        let sorted = sort(names(&["c", "a", "b"])).unwrap();
        assert_eq!(strs(&sorted), vec!["a", "b", "c"]);
        let dup = sort(names(&["x", "y", "x"])).unwrap_err();
        assert_eq!(dup, "x");
    }

    #[test]
    fn empty_inputs() {
        let empty: Vec<FieldName> = Vec::new();
        let a = names(&["a"]);
        let u: Vec<FieldName> = union(&empty, &a);
        let i: Vec<FieldName> = intersection(&a, &empty);
        assert_eq!(strs(&u), vec!["a"]);
        assert!(i.is_empty());
    }
}
