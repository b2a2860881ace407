use std::hash::{Hash, Hasher};
use std::ops::Index;

use super::value::PropertyValue;

/// Mutable property bag, filled while its owning entry loads.
///
/// Consumed by [`freeze`](PropertyBagBuilder::freeze) into an immutable [`Properties`].
/// Keys keep their insertion order; setting an existing key replaces it in place. Builders
/// have no equality; compare the frozen bags instead.
#[derive(Debug, Clone, Default)]
pub struct PropertyBagBuilder {
    entries: Vec<(String, PropertyValue)>,
}

impl PropertyBagBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace `key`, returning the previous value.
    pub fn set(
        &mut self,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Option<PropertyValue> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<PropertyValue> {
        let index = self.entries.iter().position(|(existing, _)| existing == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Copy every entry of `other` in, `other` winning on conflicts.
    pub fn merge<'a>(&mut self, other: impl IntoIterator<Item = (&'a str, &'a PropertyValue)>) {
        for (key, value) in other {
            self.set(key, value.clone());
        }
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn freeze(self) -> Properties {
        Properties {
            entries: self.entries,
        }
    }
}

/// Frozen property bag.
///
/// Equality ignores key order; hashing is consistent with it.
#[derive(Debug, Clone, Default)]
pub struct Properties {
    entries: Vec<(String, PropertyValue)>,
}

impl Properties {
    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy into a fresh builder, e.g. to derive a modified bag.
    pub fn thaw(&self) -> PropertyBagBuilder {
        PropertyBagBuilder {
            entries: self.entries.clone(),
        }
    }
}

impl PartialEq for Properties {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, value)| other.get(key) == Some(value))
    }
}

impl Eq for Properties {}

impl Hash for Properties {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mut sorted: Vec<_> = self.entries.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));
        sorted.len().hash(state);
        for (key, value) in sorted {
            key.hash(state);
            value.hash(state);
        }
    }
}

impl Index<&str> for Properties {
    type Output = PropertyValue;

    /// # Panics
    ///
    /// Panics if `key` is not present.
    fn index(&self, key: &str) -> &PropertyValue {
        match self.get(key) {
            Some(value) => value,
            None => panic!("no property named '{key}'"),
        }
    }
}

impl<'a> IntoIterator for &'a Properties {
    type Item = (&'a str, &'a PropertyValue);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a PropertyValue)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_set_replaces_in_place() {
        let mut bag = PropertyBagBuilder::new();
        bag.set("a", 1i64);
        bag.set("b", 2i64);
        assert_eq!(bag.set("a", 3i64), Some(PropertyValue::Int(1)));

        let frozen = bag.freeze();
        assert_eq!(frozen.keys().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(frozen["a"], PropertyValue::Int(3));
    }

    #[test]
    fn test_remove_clear_merge() {
        let mut other = PropertyBagBuilder::new();
        other.set("speed", 2.5);
        let other = other.freeze();

        let mut bag = PropertyBagBuilder::new();
        bag.set("name", "door");
        assert_eq!(bag.remove("name"), Some(PropertyValue::from("door")));
        assert!(bag.remove("name").is_none());

        bag.set("speed", 1.0);
        bag.merge(&other);
        assert_eq!(bag.get("speed"), Some(&PropertyValue::Float(2.5)));

        bag.clear();
        assert!(bag.is_empty());
    }

    #[test]
    fn test_frozen_equality_ignores_order() {
        let mut a = PropertyBagBuilder::new();
        a.set("x", 1i64);
        a.set("y", true);
        let mut b = PropertyBagBuilder::new();
        b.set("y", true);
        b.set("x", 1i64);

        let (a, b) = (a.freeze(), b.freeze());
        assert_eq!(a, b);

        let set: HashSet<Properties> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_thaw_copies() {
        let mut bag = PropertyBagBuilder::new();
        bag.set("hp", 3i64);
        let frozen = bag.freeze();

        let mut thawed = frozen.thaw();
        thawed.set("hp", 4i64);
        assert_eq!(frozen["hp"], PropertyValue::Int(3));
        assert_eq!(thawed.get("hp"), Some(&PropertyValue::Int(4)));
    }
}
