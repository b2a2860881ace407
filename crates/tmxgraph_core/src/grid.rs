//! Dense 2-D storage for tile layer payloads.

use crate::error::{LoadError, LoadResult};

/// Row-major grid of raw GIDs.
///
/// Cell `(x, y)` lives at `y * width + x`. Dimensions are either known from the payload
/// (JSON layers, chunks) or back-filled from the owning layer once it has loaded (XML).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct GridData {
    width: Option<u32>,
    height: Option<u32>,
    data: Vec<u32>,
}

impl GridData {
    pub fn new(width: Option<u32>, height: Option<u32>, data: Vec<u32>) -> Self {
        Self {
            width,
            height,
            data,
        }
    }

    /// Parse a comma-separated GID list, as written by Tiled's `csv` encoding.
    ///
    /// Whitespace and line breaks around values are ignored, as is a trailing comma. Any
    /// other empty cell is an error.
    pub fn from_csv(text: &str) -> LoadResult<Self> {
        let mut cells: Vec<&str> = text.split(',').map(str::trim).collect();
        if cells.last().is_some_and(|cell| cell.is_empty()) {
            cells.pop();
        }
        let data = cells
            .into_iter()
            .map(|cell| {
                cell.parse::<u32>().map_err(|_| LoadError::InvalidValue {
                    field: "data",
                    entity: crate::entities::LAYER_DATA,
                    value: cell.to_string(),
                    expected: "unsigned tile id",
                })
            })
            .collect::<LoadResult<Vec<_>>>()?;
        Ok(Self::new(None, None, data))
    }

    /// Build from a JSON numeric array.
    pub fn from_json(values: &[serde_json::Value]) -> LoadResult<Self> {
        let data = values
            .iter()
            .map(|value| {
                value
                    .as_u64()
                    .and_then(|gid| u32::try_from(gid).ok())
                    .ok_or_else(|| LoadError::InvalidValue {
                        field: "data",
                        entity: crate::entities::LAYER_DATA,
                        value: value.to_string(),
                        expected: "unsigned tile id",
                    })
            })
            .collect::<LoadResult<Vec<_>>>()?;
        Ok(Self::new(None, None, data))
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> LoadResult<Self> {
        self.set_dimensions(width, height)?;
        Ok(self)
    }

    /// Fix the dimensions. The payload must hold exactly `width * height` cells.
    pub fn set_dimensions(&mut self, width: u32, height: u32) -> LoadResult<()> {
        if self.data.len() as u64 != u64::from(width) * u64::from(height) {
            return Err(LoadError::GridSizeMismatch {
                width,
                height,
                cells: self.data.len(),
            });
        }
        self.width = Some(width);
        self.height = Some(height);
        Ok(())
    }

    pub fn width(&self) -> Option<u32> {
        self.width
    }

    pub fn height(&self) -> Option<u32> {
        self.height
    }

    pub fn is_sized(&self) -> bool {
        self.width.is_some() && self.height.is_some()
    }

    /// Raw GID at `(x, y)`, flip flags included.
    pub fn get(&self, x: u32, y: u32) -> LoadResult<u32> {
        let (Some(width), Some(height)) = (self.width, self.height) else {
            return Err(LoadError::UnsizedGrid);
        };
        if x >= width {
            return Err(LoadError::IndexOutOfRange {
                what: "grid column",
                index: i64::from(x),
                len: width as usize,
            });
        }
        if y >= height {
            return Err(LoadError::IndexOutOfRange {
                what: "grid row",
                index: i64::from(y),
                len: height as usize,
            });
        }

        let index = y as usize * width as usize + x as usize;
        self.data
            .get(index)
            .copied()
            .ok_or(LoadError::IndexOutOfRange {
                what: "grid cell",
                index: index as i64,
                len: self.data.len(),
            })
    }

    /// Index with a coordinate slice; anything other than `[x, y]` is rejected.
    pub fn get_at(&self, key: &[u32]) -> LoadResult<u32> {
        match key {
            [x, y] => self.get(*x, *y),
            _ => Err(LoadError::MalformedGridIndex(key.len())),
        }
    }

    /// Iterate `(x, y, gid)` in row-major order.
    ///
    /// Yields nothing until the width is known.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, u32)> + '_ {
        let width = self.width.unwrap_or(0);
        let cells = if width == 0 { 0 } else { self.data.len() };
        self.data[..cells]
            .iter()
            .enumerate()
            .map(move |(index, &gid)| {
                let index = index as u32;
                (index % width, index / width, gid)
            })
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> GridData {
        GridData::from_csv("1,2,3,\n4,5,6\n")
            .unwrap()
            .with_dimensions(3, 2)
            .unwrap()
    }

    #[test]
    fn test_get_row_major() {
        let grid = sample();
        assert_eq!(grid.get(0, 0).unwrap(), 1);
        assert_eq!(grid.get(2, 1).unwrap(), 6);
        assert_eq!(grid.get(1, 1).unwrap(), 5);
    }

    #[test]
    fn test_out_of_range() {
        let grid = sample();
        assert!(matches!(
            grid.get(3, 0),
            Err(LoadError::IndexOutOfRange { index: 3, len: 3, .. })
        ));
        assert!(matches!(
            grid.get(0, 2),
            Err(LoadError::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn test_malformed_key() {
        let grid = sample();
        assert_eq!(grid.get_at(&[2, 1]).unwrap(), 6);
        assert!(matches!(
            grid.get_at(&[1]),
            Err(LoadError::MalformedGridIndex(1))
        ));
        assert!(matches!(
            grid.get_at(&[1, 1, 1]),
            Err(LoadError::MalformedGridIndex(3))
        ));
    }

    #[test]
    fn test_unsized_grid() {
        let grid = GridData::from_csv("1,2").unwrap();
        assert!(!grid.is_sized());
        assert!(matches!(grid.get(0, 0), Err(LoadError::UnsizedGrid)));
        assert_eq!(grid.iter().count(), 0);
    }

    #[test]
    fn test_invalid_csv_cell() {
        assert!(matches!(
            GridData::from_csv("1,x,3"),
            Err(LoadError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_empty_csv_cells() {
        assert_eq!(GridData::from_csv("1,2,\n").unwrap().as_slice(), &[1, 2]);
        assert!(GridData::from_csv("").unwrap().is_empty());
        assert!(matches!(
            GridData::from_csv("1,,2,3"),
            Err(LoadError::InvalidValue { value, .. }) if value.is_empty()
        ));
        assert!(GridData::from_csv("1,2,,").is_err());
    }

    #[test]
    fn test_dimensions_must_match_payload() {
        let grid = GridData::from_csv("1,2,3").unwrap();
        assert!(matches!(
            grid.clone().with_dimensions(2, 2),
            Err(LoadError::GridSizeMismatch { width: 2, height: 2, cells: 3 })
        ));
        assert_eq!(grid.with_dimensions(3, 1).unwrap().get(2, 0).unwrap(), 3);
    }

    #[test]
    fn test_from_json() {
        let values = vec![serde_json::json!(0), serde_json::json!(2147483649u64)];
        let grid = GridData::from_json(&values)
            .unwrap()
            .with_dimensions(2, 1)
            .unwrap();
        assert_eq!(grid.get(1, 0).unwrap(), 0x8000_0001);
    }

    #[test]
    fn test_iter_positions() {
        let cells: Vec<_> = sample().iter().collect();
        assert_eq!(cells[4], (1, 1, 5));
        assert_eq!(cells.len(), 6);
    }
}
