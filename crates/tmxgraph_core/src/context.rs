use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tmxgraph_assets::prelude::RawNode;

use crate::document::EntryId;

/// Mutable state of a single load.
///
/// Tracks the file currently being read (switched while a remote reference is followed), the
/// creation-ordered list of entries driving the finalize pass, and the raw node every entry was
/// built from.
#[derive(Debug, Default)]
pub struct LoaderContext {
    path_stack: Vec<PathBuf>,
    created: Vec<EntryId>,
    raw_nodes: HashMap<EntryId, Rc<RawNode>>,
}

impl LoaderContext {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path_stack: vec![path.into()],
            ..Default::default()
        }
    }

    /// File currently being read.
    pub fn current_path(&self) -> &Path {
        self.path_stack
            .last()
            .map_or_else(|| Path::new(""), PathBuf::as_path)
    }

    /// Whether `path` is already on the stack of files being read.
    pub fn is_reading(&self, path: &Path) -> bool {
        self.path_stack.iter().any(|open| open == path)
    }

    pub(crate) fn push_path(&mut self, path: PathBuf) {
        self.path_stack.push(path);
    }

    pub(crate) fn pop_path(&mut self) {
        self.path_stack.pop();
    }

    pub(crate) fn record(&mut self, id: EntryId) {
        self.created.push(id);
    }

    /// Entries in the order they finished loading.
    pub fn created(&self) -> &[EntryId] {
        &self.created
    }

    pub(crate) fn bind_raw(&mut self, id: EntryId, raw: Rc<RawNode>) {
        self.raw_nodes.insert(id, raw);
    }

    /// Raw node `id` was built from.
    pub fn raw_of(&self, id: EntryId) -> Option<&RawNode> {
        self.raw_nodes.get(&id).map(Rc::as_ref)
    }

    pub(crate) fn raw_rc(&self, id: EntryId) -> Option<Rc<RawNode>> {
        self.raw_nodes.get(&id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use tmxgraph_assets::raw::XmlElement;

    use super::*;

    #[test]
    fn test_path_switching() {
        let mut context = LoaderContext::new("/maps/level.tmx");
        context.push_path(PathBuf::from("/tilesets/a.tsx"));
        assert_eq!(context.current_path(), Path::new("/tilesets/a.tsx"));
        assert!(context.is_reading(Path::new("/maps/level.tmx")));

        context.pop_path();
        assert_eq!(context.current_path(), Path::new("/maps/level.tmx"));
        assert!(!context.is_reading(Path::new("/tilesets/a.tsx")));
    }

    #[test]
    fn test_raw_binding() {
        let mut context = LoaderContext::new("a.tmx");
        let id = EntryId::new(3);
        context.bind_raw(id, Rc::new(RawNode::Xml(XmlElement::new("map"))));
        context.record(id);

        assert_eq!(context.raw_of(id).and_then(RawNode::tag), Some("map"));
        assert!(context.raw_of(EntryId::new(4)).is_none());
        assert_eq!(context.created(), &[id]);
    }
}
