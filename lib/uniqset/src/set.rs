//! Deduplication set with a pinned text rendering.
//!
//! A rendered set is `[` + members joined by `", "` + `]`, so the empty set is `[]`
//! and a singleton is `[a]`. Members are listed in ascending byte order and are
//! written verbatim, without escaping. Downstream consumers that split on `", "`
//! must therefore not rely on values that themselves contain that separator.

use std::collections::BTreeSet;
use std::fmt;

pub const SET_OPEN: char = '[';
pub const SET_CLOSE: char = ']';
pub const SET_SEPARATOR: &str = ", ";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValueSet {
    members: BTreeSet<String>,
}

impl ValueSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `value` was not already present.
    pub fn insert(&mut self, value: impl Into<String>) -> bool {
        self.members.insert(value.into())
    }

    pub fn contains(&self, value: &str) -> bool {
        self.members.contains(value)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(String::as_str)
    }

    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ValueSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", SET_OPEN)?;
        for (i, member) in self.members.iter().enumerate() {
            if i > 0 {
                f.write_str(SET_SEPARATOR)?;
            }
            f.write_str(member)?;
        }
        write!(f, "{}", SET_CLOSE)
    }
}

impl<S: Into<String>> FromIterator<S> for ValueSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        let mut set = ValueSet::new();
        set.extend(iter);
        set
    }
}

impl<S: Into<String>> Extend<S> for ValueSet {
    fn extend<T: IntoIterator<Item = S>>(&mut self, iter: T) {
        for value in iter {
            self.insert(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_empty_set_as_brackets() {
        assert_eq!(ValueSet::new().render(), "[]");
    }

    #[test]
    fn renders_singleton_without_separator() {
        let set: ValueSet = ["a"].into_iter().collect();
        assert_eq!(set.render(), "[a]");
    }

    #[test]
    fn insert_reports_new_members_only() {
        let mut set = ValueSet::new();
        assert!(set.insert("meow"));
        assert!(!set.insert("meow"));
        assert!(set.insert("purr"));
        assert_eq!(set.len(), 2);
        assert!(set.contains("purr"));
        assert!(!set.contains("hiss"));
    }

    #[test]
    fn members_render_in_byte_order() {
        let set: ValueSet = ["b", "a", "C", "b"].into_iter().collect();
        assert_eq!(set.render(), "[C, a, b]");
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["C", "a", "b"]);
    }

    #[test]
    fn values_are_written_verbatim() {
        let set: ValueSet = ["x, y", " "].into_iter().collect();
        assert_eq!(set.render(), "[ , x, y]");
    }
}
