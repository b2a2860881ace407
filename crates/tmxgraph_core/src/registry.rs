//! Type registry for entity types.
//!
//! Built-in types are registered by [`TypeRegistry::with_defaults`]. Applications add their own
//! (usually specialized subtypes) at runtime with [`TypeRegistry::register`], or at compile time
//! with `inventory`:
//!
//! ```rust,no_run
//! use tmxgraph_core::entities::OBJECT_GROUP;
//! use tmxgraph_core::registry::{EntityRegistration, TypeRegistry};
//! use tmxgraph_core::schema::EntityType;
//!
//! fn spawn_group(registry: &TypeRegistry) -> Option<EntityType> {
//!     let base = registry.get(OBJECT_GROUP)?;
//!     Some(EntityType::specialize(base, "SpawnGroup", "spawn"))
//! }
//!
//! inventory::submit! {
//!     EntityRegistration { build: spawn_group }
//! }
//!
//! let registry = TypeRegistry::build();
//! assert!(registry.get("SpawnGroup").is_some());
//! ```

use std::collections::HashMap;

use tmxgraph_assets::prelude::RawNode;
use tracing::{info, warn};

use crate::entities;
use crate::schema::EntityType;

/// An entity type submitted through `inventory::submit!`.
///
/// `build` receives the registry populated so far (built-ins included) so subtypes can
/// extend registered bases. Returning `None` skips the registration.
pub struct EntityRegistration {
    pub build: fn(&TypeRegistry) -> Option<EntityType>,
}

// Collect all EntityRegistration submissions at compile time
inventory::collect!(EntityRegistration);

/// Every entity type the loader can build, indexed by name, XML tag and specialization.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: HashMap<&'static str, EntityType>,
    tags: HashMap<&'static str, &'static str>,
    /// base type -> discriminant -> subtype
    specializations: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

impl TypeRegistry {
    /// An empty registry. Most callers want [`TypeRegistry::with_defaults`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in Tiled entity catalogue.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        entities::register_builtins(&mut registry);
        registry
    }

    /// Built-in catalogue plus every `inventory`-submitted [`EntityRegistration`].
    pub fn build() -> Self {
        let mut registry = Self::with_defaults();
        let builtin = registry.len();

        for registration in inventory::iter::<EntityRegistration> {
            if let Some(ty) = (registration.build)(&registry) {
                registry.register(ty);
            }
        }

        info!(
            "Built TypeRegistry with {} types ({} submitted, {} specializations)",
            registry.len(),
            registry.len() - builtin,
            registry.specializations.values().map(HashMap::len).sum::<usize>()
        );
        registry
    }

    /// Add or replace an entity type.
    ///
    /// Its tag (if any) is bound to it, and a subtype carrying a discriminant is added to its
    /// base's specialization table.
    pub fn register(&mut self, ty: EntityType) -> &mut Self {
        if let Some(tag) = ty.xml_tag()
            && let Some(previous) = self.tags.insert(tag, ty.name())
            && previous != ty.name()
        {
            warn!("Tag <{tag}> rebound from {previous} to {}", ty.name());
        }

        if let Some(discriminant) = ty.discriminant() {
            match ty.base() {
                Some(base) => {
                    if !self
                        .types
                        .get(base)
                        .is_some_and(|base| base.specialization().is_some())
                    {
                        warn!(
                            "{} specializes {base}, which has no specialization key",
                            ty.name()
                        );
                    }
                    self.specializations
                        .entry(base)
                        .or_default()
                        .insert(discriminant, ty.name());
                }
                None => warn!("{} has a discriminant but no base type", ty.name()),
            }
        }

        self.types.insert(ty.name(), ty);
        self
    }

    pub fn get(&self, name: &str) -> Option<&EntityType> {
        self.types.get(name)
    }

    pub fn by_tag(&self, tag: &str) -> Option<&EntityType> {
        self.tags.get(tag).and_then(|name| self.types.get(name))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityType> {
        self.types.values()
    }

    /// Whether `name` is `ancestor` or (transitively) extends it.
    pub fn is_subtype(&self, name: &str, ancestor: &str) -> bool {
        let mut current = Some(name);
        while let Some(name) = current {
            if name == ancestor {
                return true;
            }
            current = self.types.get(name).and_then(EntityType::base);
        }
        false
    }

    /// Subtype registered for `base` under `discriminant`.
    pub fn specialization_of(&self, base: &str, discriminant: &str) -> Option<&EntityType> {
        let name = self.specializations.get(base)?.get(discriminant)?;
        self.types.get(name)
    }

    /// Resolve the concrete type for `raw` when `ty` is specializable.
    ///
    /// Falls back to `ty` itself when the node has no discriminant or none is registered.
    pub fn specialize<'a>(&'a self, ty: &'a EntityType, raw: &RawNode) -> &'a EntityType {
        ty.discriminant_of(raw)
            .and_then(|discriminant| self.specialization_of(ty.name(), &discriminant))
            .unwrap_or(ty)
    }

    /// Tag-registered types that can stand in for `target`, sorted by name.
    ///
    /// These are the candidates for a JSON child, which carries no tag.
    pub fn candidates(&self, target: &str) -> Vec<&EntityType> {
        let mut candidates: Vec<_> = self
            .types
            .values()
            .filter(|ty| ty.xml_tag().is_some() && self.is_subtype(ty.name(), target))
            .collect();
        candidates.sort_by_key(|ty| ty.name());
        candidates
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tmxgraph_assets::raw::XmlElement;

    use super::*;
    use crate::entities::{IMAGE_LAYER, LAYER, OBJECT_GROUP, TILE_LAYER};

    fn with_spawn() -> TypeRegistry {
        let mut registry = TypeRegistry::with_defaults();
        let base = registry.get(OBJECT_GROUP).unwrap().clone();
        registry.register(EntityType::specialize(&base, "SpawnGroup", "spawn"));
        registry
    }

    #[test]
    fn test_builtin_tags() {
        let registry = TypeRegistry::with_defaults();
        assert_eq!(registry.by_tag("layer").map(EntityType::name), Some(TILE_LAYER));
        assert_eq!(registry.by_tag("objectgroup").map(EntityType::name), Some(OBJECT_GROUP));
        assert!(registry.by_tag("nonsense").is_none());
    }

    #[test]
    fn test_is_subtype_chain() {
        let registry = with_spawn();
        assert!(registry.is_subtype("SpawnGroup", OBJECT_GROUP));
        assert!(registry.is_subtype("SpawnGroup", LAYER));
        assert!(registry.is_subtype(TILE_LAYER, TILE_LAYER));
        assert!(!registry.is_subtype(TILE_LAYER, OBJECT_GROUP));
    }

    #[test]
    fn test_specialize_known_and_unknown() {
        let registry = with_spawn();
        let base = registry.get(OBJECT_GROUP).unwrap();

        let spawn = RawNode::Xml(XmlElement::new("objectgroup").with_attr("class", "spawn"));
        assert_eq!(registry.specialize(base, &spawn).name(), "SpawnGroup");

        let other = RawNode::Json(json!({ "class": "decor", "type": "objectgroup" }));
        assert_eq!(registry.specialize(base, &other).name(), OBJECT_GROUP);

        let plain = RawNode::Xml(XmlElement::new("objectgroup"));
        assert_eq!(registry.specialize(base, &plain).name(), OBJECT_GROUP);
    }

    #[test]
    fn test_specializations_are_per_base() {
        let mut registry = with_spawn();
        let image_layer = registry.get(IMAGE_LAYER).unwrap().clone();
        registry.register(EntityType::specialize(&image_layer, "SpawnBackdrop", "spawn"));

        let name = |base, discriminant| {
            registry
                .specialization_of(base, discriminant)
                .map(EntityType::name)
        };
        assert_eq!(name(OBJECT_GROUP, "spawn"), Some("SpawnGroup"));
        assert_eq!(name(IMAGE_LAYER, "spawn"), Some("SpawnBackdrop"));
        assert_eq!(name(TILE_LAYER, "spawn"), None);
        assert_eq!(name(OBJECT_GROUP, "decor"), None);
    }

    #[test]
    fn test_candidates_skip_specializations() {
        let registry = with_spawn();
        let names: Vec<_> = registry
            .candidates(LAYER)
            .into_iter()
            .map(EntityType::name)
            .collect();

        assert!(names.contains(&IMAGE_LAYER));
        assert!(names.contains(&OBJECT_GROUP));
        assert!(names.contains(&TILE_LAYER));
        assert!(!names.contains(&"SpawnGroup"));
        assert!(!names.contains(&LAYER));
    }
}
