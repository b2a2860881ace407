//! Document loading.
//!
//! A [`Loader`] owns the configuration, the type registry and the resource callbacks. Each
//! call to [`Loader::load`] runs with a fresh [`LoaderContext`](crate::context::LoaderContext),
//! so repeated loads of the same file produce equal documents.

mod build;
mod remote;
mod scope;

pub use scope::FieldScope;

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tmxgraph_assets::prelude::{DocumentFormat, RawNode, load_raw_document, parse_raw_document};
use tracing::info;

use crate::config::LoaderConfig;
use crate::document::Document;
use crate::error::{LoadError, LoadResult};
use crate::registry::TypeRegistry;
use crate::schema::EntityType;
use crate::value::AssetHandle;
use build::DocumentBuild;

/// Hooks for loading the resources a document refers to.
///
/// Both default to returning `None`, leaving the corresponding fields empty.
///
/// ```rust
/// use std::path::Path;
/// use tmxgraph_core::prelude::*;
///
/// struct PathsOnly;
///
/// impl ResourceCallbacks for PathsOnly {
///     fn load_image(&self, path: &Path) -> Option<AssetHandle> {
///         Some(AssetHandle::new(path.to_path_buf()))
///     }
/// }
///
/// let loader = Loader::default().with_callbacks(PathsOnly);
/// ```
pub trait ResourceCallbacks: Send + Sync {
    /// Load the image at `path` (already resolved against the referencing file).
    fn load_image(&self, path: &Path) -> Option<AssetHandle> {
        let _ = path;
        None
    }

    /// Load a font for a text object.
    fn load_font(&self, family: &str, pixel_size: f64) -> Option<AssetHandle> {
        let _ = (family, pixel_size);
        None
    }
}

/// Callbacks that load nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCallbacks;

impl ResourceCallbacks for NoCallbacks {}

/// Builds [`Document`]s from Tiled files.
#[derive(Clone)]
pub struct Loader {
    pub(crate) config: LoaderConfig,
    pub(crate) registry: Arc<TypeRegistry>,
    pub(crate) callbacks: Arc<dyn ResourceCallbacks>,
}

impl Loader {
    /// Loader over the built-in and `inventory`-submitted entity types.
    pub fn new(config: LoaderConfig) -> Self {
        Self {
            config,
            registry: Arc::new(TypeRegistry::build()),
            callbacks: Arc::new(NoCallbacks),
        }
    }

    pub fn with_registry(mut self, registry: TypeRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn with_callbacks(mut self, callbacks: impl ResourceCallbacks + 'static) -> Self {
        self.callbacks = Arc::new(callbacks);
        self
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Load the document at `path`.
    ///
    /// The encoding is detected from the extension (XML when unknown). XML roots are built as
    /// the type registered for their tag; JSON roots as [`LoaderConfig::root_type`].
    pub fn load(&self, path: impl AsRef<Path>) -> LoadResult<Document> {
        let path = path.as_ref();
        let raw = load_raw_document(path, DocumentFormat::Xml, self.config.case_insensitive_paths)?;
        self.build(raw, path, None)
    }

    /// Load the document at `path`, building its root as entity type `type_name`.
    pub fn load_as(&self, path: impl AsRef<Path>, type_name: &str) -> LoadResult<Document> {
        let path = path.as_ref();
        let raw = load_raw_document(path, DocumentFormat::Xml, self.config.case_insensitive_paths)?;
        self.build(raw, path, Some(type_name))
    }

    /// Load from text already in memory. References resolve relative to `path`.
    pub fn load_str(
        &self,
        contents: &str,
        format: DocumentFormat,
        path: impl AsRef<Path>,
    ) -> LoadResult<Document> {
        let path = path.as_ref();
        let raw = parse_raw_document(contents, format, path)?;
        self.build(raw, path, None)
    }

    fn root_type(&self, raw: &RawNode, path: &Path, type_name: Option<&str>) -> LoadResult<&EntityType> {
        if let Some(name) = type_name {
            return self
                .registry
                .get(name)
                .ok_or_else(|| LoadError::UnknownEntityType(name.to_string()));
        }
        match raw.tag() {
            Some(tag) => self.registry.by_tag(tag).ok_or_else(|| LoadError::UnknownTag {
                tag: tag.to_string(),
                path: path.to_path_buf(),
            }),
            None => self
                .registry
                .get(&self.config.root_type)
                .ok_or_else(|| LoadError::UnknownEntityType(self.config.root_type.clone())),
        }
    }

    fn build(&self, raw: RawNode, path: &Path, type_name: Option<&str>) -> LoadResult<Document> {
        let root_type = self.root_type(&raw, path, type_name)?;
        let document = DocumentBuild::new(self, path).run(root_type, raw)?;
        info!(
            "Loaded {} as {} ({} entries)",
            path.display(),
            root_type.name(),
            document.len()
        );
        Ok(document)
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new(LoaderConfig::default())
    }
}

impl fmt::Debug for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loader")
            .field("config", &self.config)
            .field("types", &self.registry.len())
            .finish_non_exhaustive()
    }
}
