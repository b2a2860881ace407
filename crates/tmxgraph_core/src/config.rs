use serde::Deserialize;

/// Configuration for a [`Loader`](crate::loader::Loader).
///
/// # Example
///
/// ```rust
/// use tmxgraph_core::LoaderConfig;
///
/// let config = LoaderConfig {
///     strict: false,
///     ..Default::default()
/// };
/// assert!(config.case_insensitive_paths);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Fail on unknown tags and unrecognized property types.
    ///
    /// When disabled, unknown tags become generic field-less entries and unrecognized
    /// property types keep their raw text. Both are reported with `warn!`.
    pub strict: bool,

    /// Accept referenced files whose names differ from the reference only in letter case.
    pub case_insensitive_paths: bool,

    /// Entity type built for the document root of a JSON document.
    ///
    /// XML roots are dispatched on their tag when it is registered.
    pub root_type: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            strict: true,
            case_insensitive_paths: true,
            root_type: crate::entities::MAP.to_string(),
        }
    }
}
