//! Cross-file references.
//!
//! A remote entity (map, tileset) whose node carries `source` is loaded from the referenced
//! file. Every attribute of the referencing node except `source` is overlaid onto the remote
//! root, so `<tileset firstgid="5" source="tiles.tsx"/>` keeps `firstgid="5"` whatever the
//! file says. A remote root carrying its own `source` is followed again, relative to its file.

use std::borrow::Cow;
use std::rc::Rc;

use tmxgraph_assets::prelude::{RawNode, load_raw_document, resolve_relative_path};
use tracing::debug;

use super::build::DocumentBuild;
use crate::document::EntryId;
use crate::error::{LoadError, LoadResult};
use crate::schema::EntityType;

impl<'l> DocumentBuild<'l> {
    pub(super) fn build_remote(
        &mut self,
        ty: &'l EntityType,
        referencing: &RawNode,
        parent: Option<EntryId>,
    ) -> LoadResult<EntryId> {
        let reference = referencing
            .scalar_text("source")
            .map(Cow::into_owned)
            .unwrap_or_default();
        let path = resolve_relative_path(self.context.current_path(), &reference);
        if self.context.is_reading(&path) {
            return Err(LoadError::CyclicReference { reference, path });
        }

        debug!(
            "Following {} source '{}' to {}",
            ty.name(),
            reference,
            path.display()
        );
        let mut merged = load_raw_document(
            &path,
            referencing.format(),
            self.loader.config.case_insensitive_paths,
        )
        .map_err(|err| {
            if err.is_not_found() {
                LoadError::UnresolvedSource {
                    reference: reference.clone(),
                    path: path.clone(),
                }
            } else {
                LoadError::Asset(err)
            }
        })?;
        // Drop only the reference just followed; the file may point further itself
        let mut attributes = referencing.clone();
        attributes.remove_key("source");
        merged.overlay(&attributes);

        self.context.push_path(path.clone());
        let built = self.build_node(ty, Rc::new(merged), parent);
        self.context.pop_path();

        let id = built?;
        let entry = self.document.entry_mut(id);
        entry.set_source(reference);
        // A nested hop already recorded the file the content came from
        if entry.file().is_none() {
            entry.set_file(path);
        }
        Ok(id)
    }
}
