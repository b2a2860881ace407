//! Field values stored on document entries.

use std::any::Any;
use std::collections::BTreeMap;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::document::EntryId;
use crate::error::{LoadError, LoadResult};
use crate::grid::GridData;
use crate::properties::{Properties, PropertyBagBuilder, PropertyValue};
use crate::tiles::TileCollection;

/// Opaque handle returned by resource callbacks (images, fonts).
///
/// Two handles are equal when they share the same allocation. Inside a [`Value`] only the
/// presence of a handle is compared, so two loads of one file stay equal.
#[derive(Clone)]
pub struct AssetHandle(Arc<dyn Any + Send + Sync>);

impl AssetHandle {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }

    fn address(&self) -> usize {
        Arc::as_ptr(&self.0).cast::<()>() as usize
    }
}

impl PartialEq for AssetHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for AssetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetHandle({:#x})", self.address())
    }
}

/// A field value.
///
/// Scalars come from attributes and text, [`Value::Entry`] and [`Value::List`] from child
/// selection, the remaining variants from computed fields.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Absent optional field
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Entry(EntryId),
    List(Vec<Value>),
    Points(Vec<(f64, f64)>),
    Grid(GridData),
    Tiles(TileCollection),
    /// Explicit tiles of a tileset, by local id
    TileIds(BTreeMap<u32, EntryId>),
    Property(PropertyValue),
    /// Bag still being filled; replaced by [`Value::Properties`] when finalized
    PropertyBuilder(PropertyBagBuilder),
    Properties(Properties),
    Handle(Option<AssetHandle>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric value; integers widen to `f64`.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_entry(&self) -> Option<EntryId> {
        match self {
            Value::Entry(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Entry ids of a child list (or a single child).
    pub fn entries(&self) -> Vec<EntryId> {
        match self {
            Value::Entry(id) => vec![*id],
            Value::List(items) => items.iter().filter_map(Value::as_entry).collect(),
            _ => Vec::new(),
        }
    }

    pub fn as_grid(&self) -> Option<&GridData> {
        match self {
            Value::Grid(grid) => Some(grid),
            _ => None,
        }
    }

    pub fn as_tiles(&self) -> Option<&TileCollection> {
        match self {
            Value::Tiles(tiles) => Some(tiles),
            _ => None,
        }
    }

    pub fn as_properties(&self) -> Option<&Properties> {
        match self {
            Value::Properties(properties) => Some(properties),
            _ => None,
        }
    }

    pub fn as_property(&self) -> Option<&PropertyValue> {
        match self {
            Value::Property(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_handle(&self) -> Option<&AssetHandle> {
        match self {
            Value::Handle(handle) => handle.as_ref(),
            _ => None,
        }
    }

    /// Structural equality.
    ///
    /// Fails with [`LoadError::UnhashedPropertyBag`] if either side is, or contains, a property
    /// bag that has not been frozen yet.
    pub fn try_eq(&self, other: &Self) -> LoadResult<bool> {
        let equal = match (self, other) {
            (Value::PropertyBuilder(_), _) | (_, Value::PropertyBuilder(_)) => {
                return Err(LoadError::UnhashedPropertyBag);
            }
            (Value::List(a), Value::List(b)) => {
                if a.len() != b.len() {
                    return Ok(false);
                }
                for (a, b) in a.iter().zip(b) {
                    if !a.try_eq(b)? {
                        return Ok(false);
                    }
                }
                true
            }
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Entry(a), Value::Entry(b)) => a == b,
            (Value::Points(a), Value::Points(b)) => a == b,
            (Value::Grid(a), Value::Grid(b)) => a == b,
            (Value::Tiles(a), Value::Tiles(b)) => a == b,
            (Value::TileIds(a), Value::TileIds(b)) => a == b,
            (Value::Property(a), Value::Property(b)) => a == b,
            (Value::Properties(a), Value::Properties(b)) => a == b,
            (Value::Handle(a), Value::Handle(b)) => a.is_some() == b.is_some(),
            _ => false,
        };
        Ok(equal)
    }

    /// Feed this value into `state`.
    ///
    /// Fails with [`LoadError::UnhashedPropertyBag`] if the value is, or contains, a property
    /// bag that has not been frozen yet.
    pub fn try_hash<H: Hasher>(&self, state: &mut H) -> LoadResult<()> {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Str(s) => s.hash(state),
            Value::Entry(id) => id.hash(state),
            Value::List(items) => {
                items.len().hash(state);
                for item in items {
                    item.try_hash(state)?;
                }
            }
            Value::Points(points) => {
                for (x, y) in points {
                    x.to_bits().hash(state);
                    y.to_bits().hash(state);
                }
            }
            Value::Grid(grid) => grid.hash(state),
            Value::Tiles(tiles) => tiles.hash(state),
            Value::TileIds(ids) => ids.hash(state),
            Value::Property(value) => value.hash(state),
            Value::PropertyBuilder(_) => return Err(LoadError::UnhashedPropertyBag),
            Value::Properties(properties) => properties.hash(state),
            Value::Handle(handle) => handle.is_some().hash(state),
        }
        Ok(())
    }

    /// Hash with the standard library's default hasher.
    pub fn stable_hash(&self) -> LoadResult<u64> {
        let mut hasher = DefaultHasher::new();
        self.try_hash(&mut hasher)?;
        Ok(hasher.finish())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.try_eq(other).unwrap_or(false)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<EntryId> for Value {
    fn from(value: EntryId) -> Self {
        Value::Entry(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_requires_frozen_bag() {
        let mut bag = PropertyBagBuilder::new();
        bag.set("visible", false);

        let open = Value::PropertyBuilder(bag.clone());
        assert!(matches!(
            open.stable_hash(),
            Err(LoadError::UnhashedPropertyBag)
        ));

        let nested = Value::List(vec![Value::Int(1), open]);
        assert!(nested.stable_hash().is_err());

        let frozen = Value::Properties(bag.freeze());
        assert!(frozen.stable_hash().is_ok());
    }

    #[test]
    fn test_unfrozen_bag_has_no_equality() {
        let mut bag = PropertyBagBuilder::new();
        bag.set("visible", false);

        let open = Value::PropertyBuilder(bag.clone());
        assert!(matches!(
            open.try_eq(&open.clone()),
            Err(LoadError::UnhashedPropertyBag)
        ));
        assert_ne!(open, open.clone());

        let nested = Value::List(vec![open]);
        assert!(nested.try_eq(&nested.clone()).is_err());

        let frozen = Value::Properties(bag.freeze());
        assert!(frozen.try_eq(&frozen.clone()).unwrap());
        assert_eq!(frozen, frozen.clone());
    }

    #[test]
    fn test_handles_compare_by_presence() {
        let a = Value::Handle(Some(AssetHandle::new(String::from("img"))));
        let b = Value::Handle(Some(AssetHandle::new(String::from("img"))));
        assert_eq!(a, b);
        assert_eq!(a.stable_hash().unwrap(), b.stable_hash().unwrap());
        assert_ne!(a, Value::Handle(None));
    }

    #[test]
    fn test_equal_values_hash_equal() {
        let a = Value::List(vec![Value::from("a"), Value::Float(1.5)]);
        let b = a.clone();
        assert_eq!(a.stable_hash().unwrap(), b.stable_hash().unwrap());
    }

    #[test]
    fn test_handle_identity() {
        let a = AssetHandle::new(String::from("img"));
        let b = AssetHandle::new(String::from("img"));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_eq!(a.downcast_ref::<String>().map(String::as_str), Some("img"));
    }

    #[test]
    fn test_entries_of_list() {
        let list = Value::List(vec![
            Value::Entry(EntryId::new(1)),
            Value::Entry(EntryId::new(4)),
        ]);
        assert_eq!(list.entries(), vec![EntryId::new(1), EntryId::new(4)]);
        assert!(Value::Null.entries().is_empty());
    }
}
