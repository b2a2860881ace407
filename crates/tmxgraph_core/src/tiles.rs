//! Global tile id resolution.

use crate::document::EntryId;
use crate::error::{LoadError, LoadResult};

/// Bit set on a GID when the tile is flipped horizontally.
pub const FLIPPED_HORIZONTALLY: u32 = 0x8000_0000;
/// Bit set on a GID when the tile is flipped vertically.
pub const FLIPPED_VERTICALLY: u32 = 0x4000_0000;
/// Bit set on a GID when the tile is flipped anti-diagonally.
pub const FLIPPED_DIAGONALLY: u32 = 0x2000_0000;
/// Bit set on a GID when a hexagonal tile is rotated by 120 degrees.
pub const ROTATED_HEXAGONAL_120: u32 = 0x1000_0000;

const FLAG_MASK: u32 =
    FLIPPED_HORIZONTALLY | FLIPPED_VERTICALLY | FLIPPED_DIAGONALLY | ROTATED_HEXAGONAL_120;

/// Flip flags carried in the high bits of a raw GID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FlipFlags {
    pub horizontal: bool,
    pub vertical: bool,
    pub diagonal: bool,
    pub hexagonal_120: bool,
}

impl FlipFlags {
    pub fn from_gid(raw: u32) -> Self {
        Self {
            horizontal: raw & FLIPPED_HORIZONTALLY != 0,
            vertical: raw & FLIPPED_VERTICALLY != 0,
            diagonal: raw & FLIPPED_DIAGONALLY != 0,
            hexagonal_120: raw & ROTATED_HEXAGONAL_120 != 0,
        }
    }

    pub fn bits(&self) -> u32 {
        let mut bits = 0;
        if self.horizontal {
            bits |= FLIPPED_HORIZONTALLY;
        }
        if self.vertical {
            bits |= FLIPPED_VERTICALLY;
        }
        if self.diagonal {
            bits |= FLIPPED_DIAGONALLY;
        }
        if self.hexagonal_120 {
            bits |= ROTATED_HEXAGONAL_120;
        }
        bits
    }

    pub fn is_empty(&self) -> bool {
        self.bits() == 0
    }
}

/// Split a raw GID into the plain GID and its flip flags.
pub fn split_gid(raw: u32) -> (u32, FlipFlags) {
    (raw & !FLAG_MASK, FlipFlags::from_gid(raw))
}

/// The GID range a tileset occupies inside a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TilesetSpan {
    pub tileset: EntryId,
    pub firstgid: u32,
    pub tilecount: u32,
}

/// A resolved tile reference.
///
/// GID 0 resolves to the sentinel: no tileset, local id 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileRef {
    /// Owning tileset, `None` for the empty tile
    pub tileset: Option<EntryId>,
    /// Id of the tile inside its tileset
    pub id: u32,
    /// The tileset's explicit `<tile>` entry, when it declares one for this id
    pub entry: Option<EntryId>,
    /// Flip flags stripped from the raw GID
    pub flip: FlipFlags,
    firstgid: u32,
}

impl TileRef {
    pub const EMPTY: TileRef = TileRef {
        tileset: None,
        id: 0,
        entry: None,
        flip: FlipFlags {
            horizontal: false,
            vertical: false,
            diagonal: false,
            hexagonal_120: false,
        },
        firstgid: 0,
    };

    pub(crate) fn new(span: &TilesetSpan, id: u32, flip: FlipFlags) -> Self {
        Self {
            tileset: Some(span.tileset),
            id,
            entry: None,
            flip,
            firstgid: span.firstgid,
        }
    }

    pub(crate) fn with_entry(mut self, entry: Option<EntryId>) -> Self {
        self.entry = entry;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.tileset.is_none()
    }

    /// The plain GID of this tile (without flip flags). 0 for the sentinel.
    pub fn gid(&self) -> u32 {
        match self.tileset {
            Some(_) => self.firstgid + self.id,
            None => 0,
        }
    }
}

/// Read-only index over a map's tilesets, sorted by `firstgid`.
///
/// Gaps and overlaps between tileset ranges are not validated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TileCollection {
    spans: Vec<TilesetSpan>,
}

impl TileCollection {
    pub fn new(mut spans: Vec<TilesetSpan>) -> Self {
        spans.sort_by_key(|span| span.firstgid);
        Self { spans }
    }

    pub fn spans(&self) -> &[TilesetSpan] {
        &self.spans
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Resolve a raw GID (flip flags allowed) to its tileset and local id.
    ///
    /// The owning tileset is the one with the greatest `firstgid <= gid`. The explicit tile
    /// entry is not filled in here, see [`MapView::tile`](crate::entities::MapView::tile).
    pub fn lookup(&self, raw: u32) -> LoadResult<TileRef> {
        let (gid, flip) = split_gid(raw);
        if gid == 0 {
            return Ok(TileRef {
                flip,
                ..TileRef::EMPTY
            });
        }

        let position = self.spans.partition_point(|span| span.firstgid <= gid);
        let Some(span) = position.checked_sub(1).and_then(|i| self.spans.get(i)) else {
            return Err(LoadError::IndexOutOfRange {
                what: "gid",
                index: i64::from(gid),
                len: 0,
            });
        };

        let id = gid - span.firstgid;
        if id >= span.tilecount {
            return Err(LoadError::IndexOutOfRange {
                what: "tile",
                index: i64::from(id),
                len: span.tilecount as usize,
            });
        }
        Ok(TileRef::new(span, id, flip))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection() -> TileCollection {
        // Declared out of order on purpose
        TileCollection::new(vec![
            TilesetSpan {
                tileset: EntryId::new(2),
                firstgid: 17,
                tilecount: 4,
            },
            TilesetSpan {
                tileset: EntryId::new(1),
                firstgid: 1,
                tilecount: 16,
            },
        ])
    }

    #[test]
    fn test_zero_is_sentinel() {
        let tile = collection().lookup(0).unwrap();
        assert!(tile.is_empty());
        assert_eq!(tile.id, 0);
        assert_eq!(tile.gid(), 0);
    }

    #[test]
    fn test_lookup_ranges_independent_of_order() {
        let tiles = collection();
        for gid in 1..17 {
            let tile = tiles.lookup(gid).unwrap();
            assert_eq!(tile.tileset, Some(EntryId::new(1)));
            assert_eq!(tile.id, gid - 1);
            assert_eq!(tile.gid(), gid);
        }
        for gid in 17..21 {
            let tile = tiles.lookup(gid).unwrap();
            assert_eq!(tile.tileset, Some(EntryId::new(2)));
            assert_eq!(tile.id, gid - 17);
        }
    }

    #[test]
    fn test_past_last_tileset() {
        assert!(matches!(
            collection().lookup(21),
            Err(LoadError::IndexOutOfRange { what: "tile", index: 4, len: 4 })
        ));
    }

    #[test]
    fn test_before_first_tileset() {
        let tiles = TileCollection::new(vec![TilesetSpan {
            tileset: EntryId::new(1),
            firstgid: 5,
            tilecount: 2,
        }]);
        assert!(matches!(
            tiles.lookup(3),
            Err(LoadError::IndexOutOfRange { what: "gid", .. })
        ));
    }

    #[test]
    fn test_flip_flags_stripped() {
        let tile = collection()
            .lookup(FLIPPED_HORIZONTALLY | FLIPPED_DIAGONALLY | 18)
            .unwrap();
        assert_eq!(tile.id, 1);
        assert!(tile.flip.horizontal);
        assert!(!tile.flip.vertical);
        assert!(tile.flip.diagonal);
        assert_eq!(tile.flip.bits(), FLIPPED_HORIZONTALLY | FLIPPED_DIAGONALLY);
    }
}
