use std::fmt;

use parcel_blocks::{BaseBlock, Biome, BlockState, CompoundTag, Pattern};
use parcel_geom::{BlockPos, CHUNK_MASK};
use thiserror::Error;

use crate::QueueCoordinator;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        })
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RegionError {
    #[error("region {axis} extent must be positive, got {extent} (min={min:?}, max={max:?})")]
    NonPositiveExtent {
        axis: Axis,
        extent: i64,
        min: BlockPos,
        max: BlockPos,
    },
    #[error("region of {width}x{height}x{length} blocks is too large to buffer")]
    TooLarge { width: i64, height: i64, length: i64 },
    #[error("offset ({offset_x}, {offset_z}) moves the cache window past the coordinate range")]
    OffsetOutOfRange { offset_x: i32, offset_z: i32 },
}

/// `(width, height, length)` of the inclusive box `min..=max`, each at least 1.
pub(crate) fn region_extents(min: BlockPos, max: BlockPos) -> Result<(i64, i64, i64), RegionError> {
    let width = i64::from(max.x) - i64::from(min.x) + 1;
    let height = i64::from(max.y) - i64::from(min.y) + 1;
    let length = i64::from(max.z) - i64::from(min.z) + 1;
    for (axis, extent) in [(Axis::X, width), (Axis::Y, height), (Axis::Z, length)] {
        if extent <= 0 {
            return Err(RegionError::NonPositiveExtent {
                axis,
                extent,
                min,
                max,
            });
        }
    }
    Ok((width, height, length))
}

/// Write-through cache for one chunk-sized window of the world.
///
/// Writes are translated by the horizontal offset and must land inside the
/// chunk-local window `[scope_min_x, scope_max_x) x [min_y, max_y] x
/// [scope_min_z, scope_max_z)`; anything outside is dropped silently. The
/// scheduler that feeds it issues writes for a wider shape than one cache
/// covers and relies on this clipping.
///
/// Reads use the grid-native frame: x in `[0, width)`, z in `[0, length)`,
/// absolute y, no offset. [`BlockArrayCache::native_xz`] converts a write
/// coordinate into that frame.
///
/// Changing the offset never clears the grid. Values written under a previous
/// offset stay until [`BlockArrayCache::clear`].
pub struct BlockArrayCache {
    region_min: BlockPos,
    blocks: Vec<Option<BlockState>>,
    height: i32,
    width: i32,
    length: i32,
    min_y: i32,
    max_y: i32,
    scope_min_x: i32,
    scope_min_z: i32,
    scope_max_x: i32,
    scope_max_z: i32,
    offset_x: i32,
    offset_z: i32,
}

impl BlockArrayCache {
    /// `min` and `max` are inclusive corners of the buffered volume.
    pub fn new(min: BlockPos, max: BlockPos) -> Result<Self, RegionError> {
        let (width, height, length) = region_extents(min, max)?;
        let too_large = RegionError::TooLarge {
            width,
            height,
            length,
        };
        let cells = (height as usize)
            .checked_mul(width as usize)
            .and_then(|n| n.checked_mul(length as usize))
            .ok_or(too_large)?;
        let width = i32::try_from(width).map_err(|_| too_large)?;
        let length = i32::try_from(length).map_err(|_| too_large)?;
        let height = i32::try_from(height).map_err(|_| too_large)?;

        let scope_min_x = min.x & CHUNK_MASK;
        let scope_min_z = min.z & CHUNK_MASK;
        log::trace!(
            "block cache {:?}..{:?}: {}x{}x{} scope x[{}, {}) z[{}, {})",
            min,
            max,
            width,
            height,
            length,
            scope_min_x,
            scope_min_x + width,
            scope_min_z,
            scope_min_z + length
        );
        Ok(Self {
            region_min: min,
            blocks: vec![None; cells],
            height,
            width,
            length,
            min_y: min.y,
            max_y: max.y,
            scope_min_x,
            scope_min_z,
            scope_max_x: scope_min_x + width,
            scope_max_z: scope_min_z + length,
            offset_x: 0,
            offset_z: 0,
        })
    }

    /// Backing grid in `[y][x][z]` order. Shares storage with the cache.
    #[inline]
    pub fn block_states(&self) -> &[Option<BlockState>] {
        &self.blocks
    }

    /// `(height, width, length)` of the grid.
    #[inline]
    pub fn dimensions(&self) -> (usize, usize, usize) {
        (self.height as usize, self.width as usize, self.length as usize)
    }

    /// Minimum corner passed at construction, without offset.
    #[inline]
    pub fn region_min(&self) -> BlockPos {
        self.region_min
    }

    #[inline]
    pub fn min_y(&self) -> i32 {
        self.min_y
    }

    #[inline]
    pub fn max_y(&self) -> i32 {
        self.max_y
    }

    /// Chunk-local origin of the window, `(min.x & 15, min.z & 15)`.
    #[inline]
    pub fn scope_min(&self) -> (i32, i32) {
        (self.scope_min_x, self.scope_min_z)
    }

    /// Exclusive chunk-local upper bounds of the window.
    #[inline]
    pub fn scope_max(&self) -> (i32, i32) {
        (self.scope_max_x, self.scope_max_z)
    }

    #[inline]
    pub fn offset(&self) -> (i32, i32) {
        (self.offset_x, self.offset_z)
    }

    // Window origin on one axis under an offset; None once min() or max()
    // would leave the i32 range.
    fn window_origin(base: i32, offset: i32, scope_min: i32) -> Option<i32> {
        let lo = i64::from(base) + i64::from(offset) - i64::from(scope_min);
        let lo = i32::try_from(lo).ok()?;
        lo.checked_add(CHUNK_MASK).map(|_| lo)
    }

    fn check_offset(&self, offset_x: i32, offset_z: i32) -> Result<(), RegionError> {
        let x = Self::window_origin(self.region_min.x, offset_x, self.scope_min_x);
        let z = Self::window_origin(self.region_min.z, offset_z, self.scope_min_z);
        match (x, z) {
            (Some(_), Some(_)) => Ok(()),
            _ => Err(RegionError::OffsetOutOfRange { offset_x, offset_z }),
        }
    }

    pub fn set_offset_x(&mut self, offset_x: i32) -> Result<(), RegionError> {
        self.rebind(offset_x, self.offset_z)
    }

    pub fn set_offset_z(&mut self, offset_z: i32) -> Result<(), RegionError> {
        self.rebind(self.offset_x, offset_z)
    }

    /// Point subsequent writes at another column. Cells keep their values.
    ///
    /// Offsets that would put `min()` or `max()` outside the `i32` range are
    /// refused and leave the current offset in place.
    pub fn rebind(&mut self, offset_x: i32, offset_z: i32) -> Result<(), RegionError> {
        self.check_offset(offset_x, offset_z)?;
        self.offset_x = offset_x;
        self.offset_z = offset_z;
        Ok(())
    }

    /// Forget every buffered value.
    pub fn clear(&mut self) {
        self.blocks.fill(None);
    }

    /// Number of cells holding a value.
    pub fn written(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_some()).count()
    }

    #[inline]
    fn idx(&self, y: i32, gx: i32, gz: i32) -> usize {
        debug_assert!(y >= self.min_y && y <= self.max_y);
        debug_assert!(gx >= 0 && gx < self.width);
        debug_assert!(gz >= 0 && gz < self.length);
        (((y - self.min_y) * self.width + gx) * self.length + gz) as usize
    }

    /// Grid-native `(x, z)` for a write coordinate under the current offset,
    /// or `None` when the write would be clipped.
    pub fn native_xz(&self, x: i32, z: i32) -> Option<(i32, i32)> {
        let rx = x.checked_add(self.offset_x)?;
        let rz = z.checked_add(self.offset_z)?;
        if rx >= self.scope_min_x && rx < self.scope_max_x && rz >= self.scope_min_z && rz < self.scope_max_z {
            Some((rx - self.scope_min_x, rz - self.scope_min_z))
        } else {
            None
        }
    }

    #[inline]
    fn write_cell(&self, x: i32, y: i32, z: i32) -> Option<usize> {
        if y < self.min_y || y > self.max_y {
            return None;
        }
        let (gx, gz) = self.native_xz(x, z)?;
        Some(self.idx(y, gx, gz))
    }

    /// Written cells as `(native x, y, native z, state)`.
    pub fn iter_written(&self) -> impl Iterator<Item = (i32, i32, i32, BlockState)> + '_ {
        let (w, l) = (self.width as usize, self.length as usize);
        self.blocks.iter().enumerate().filter_map(move |(i, b)| {
            let state = (*b)?;
            let gz = (i % l) as i32;
            let gx = ((i / l) % w) as i32;
            let y = (i / (l * w)) as i32 + self.min_y;
            Some((gx, y, gz, state))
        })
    }
}

impl QueueCoordinator for BlockArrayCache {
    fn set_block(&mut self, x: i32, y: i32, z: i32, state: BlockState) -> bool {
        if let Some(i) = self.write_cell(x, y, z) {
            self.blocks[i] = Some(state);
        }
        false
    }

    /// The pattern is evaluated at `region_min + (x, y, z)`, ignoring the
    /// offset, while the value is stored at the offset cell. The position
    /// wraps at the `i32` boundary.
    fn set_pattern(&mut self, x: i32, y: i32, z: i32, pattern: &dyn Pattern) -> bool {
        if let Some(i) = self.write_cell(x, y, z) {
            let base = self.region_min;
            let pos = BlockPos::new(
                base.x.wrapping_add(x),
                base.y.wrapping_add(y),
                base.z.wrapping_add(z),
            );
            self.blocks[i] = Some(pattern.apply_block(pos).to_immutable_state());
        }
        false
    }

    fn set_raw_block(&mut self, x: i32, y: i32, z: i32, block: &BaseBlock) -> bool {
        if let Some(i) = self.write_cell(x, y, z) {
            self.blocks[i] = Some(block.to_immutable_state());
        }
        false
    }

    fn get_block(&self, x: i32, y: i32, z: i32) -> Option<BlockState> {
        if x >= 0 && x < self.width && y >= self.min_y && y <= self.max_y && z >= 0 && z < self.length {
            return self.blocks[self.idx(y, x, z)];
        }
        None
    }

    fn set_biome_2d(&mut self, _x: i32, _z: i32, _biome: Biome) -> bool {
        false
    }

    fn set_biome(&mut self, _x: i32, _y: i32, _z: i32, _biome: Biome) -> bool {
        false
    }

    fn fill_biome(&mut self, _biome: Biome) {}

    fn set_tile(&mut self, _x: i32, _y: i32, _z: i32, _tag: &CompoundTag) -> bool {
        false
    }

    fn size(&self) -> usize {
        self.blocks.len()
    }

    /// World position the window's chunk-local origin maps to under the
    /// current offset.
    fn min(&self) -> BlockPos {
        let origin = |base, offset, scope_min| {
            Self::window_origin(base, offset, scope_min).unwrap_or(base)
        };
        BlockPos::new(
            origin(self.region_min.x, self.offset_x, self.scope_min_x),
            self.region_min.y,
            origin(self.region_min.z, self.offset_z, self.scope_min_z),
        )
    }

    /// Always one chunk column past `min()`, topped at the region's max y.
    fn max(&self) -> BlockPos {
        self.min().add_xyz(CHUNK_MASK, 0, CHUNK_MASK).with_y(self.max_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parcel_blocks::FnPattern;

    const STONE: BlockState = BlockState::new(1, 0);
    const DIRT: BlockState = BlockState::new(2, 0);

    fn section() -> BlockArrayCache {
        BlockArrayCache::new(BlockPos::new(0, 64, 0), BlockPos::new(15, 79, 15)).unwrap()
    }

    #[test]
    fn chunk_section_write_then_read() {
        let mut cache = section();
        assert_eq!(cache.scope_min(), (0, 0));
        assert_eq!(cache.scope_max(), (16, 16));
        assert!(!cache.set_block(5, 70, 5, STONE));
        assert_eq!(cache.get_block(5, 70, 5), Some(STONE));
        let (h, w, l) = cache.dimensions();
        assert_eq!((h, w, l), (16, 16, 16));
        assert_eq!(cache.block_states()[((70 - 64) * w + 5) * l + 5], Some(STONE));
    }

    #[test]
    fn offset_past_window_clips() {
        let mut cache = section();
        cache.set_offset_x(16).unwrap();
        assert!(!cache.set_block(5, 70, 5, STONE));
        assert_eq!(cache.written(), 0);
        assert_eq!(cache.get_block(5, 70, 5), None);
    }

    #[test]
    fn vertical_bounds_are_inclusive() {
        let mut cache = section();
        cache.set_block(0, 64, 0, STONE);
        cache.set_block(0, 79, 0, DIRT);
        cache.set_block(0, 63, 0, DIRT);
        cache.set_block(0, 80, 0, DIRT);
        assert_eq!(cache.get_block(0, 64, 0), Some(STONE));
        assert_eq!(cache.get_block(0, 79, 0), Some(DIRT));
        assert_eq!(cache.written(), 2);
    }

    #[test]
    fn unaligned_region_uses_chunk_local_window() {
        // x 20..=25 is chunk-local 4..=9, z -3..=-1 is chunk-local 13..=15
        let mut cache =
            BlockArrayCache::new(BlockPos::new(20, 0, -3), BlockPos::new(25, 3, -1)).unwrap();
        assert_eq!(cache.scope_min(), (4, 13));
        assert_eq!(cache.scope_max(), (10, 16));
        cache.set_block(4, 1, 13, STONE);
        cache.set_block(3, 1, 13, DIRT);
        cache.set_block(10, 1, 13, DIRT);
        cache.set_block(9, 1, 16, DIRT);
        assert_eq!(cache.written(), 1);
        assert_eq!(cache.get_block(0, 1, 0), Some(STONE));
        assert_eq!(cache.native_xz(9, 15), Some((5, 2)));
        assert_eq!(cache.min(), BlockPos::new(16, 0, -16));
        assert_eq!(cache.max(), BlockPos::new(31, 3, -1));
    }

    #[test]
    fn raw_block_write_uses_same_frame_as_state_write() {
        let mut a = BlockArrayCache::new(BlockPos::new(3, 0, 5), BlockPos::new(8, 2, 9)).unwrap();
        let mut b = BlockArrayCache::new(BlockPos::new(3, 0, 5), BlockPos::new(8, 2, 9)).unwrap();
        a.set_block(6, 1, 7, STONE);
        b.set_raw_block(6, 1, 7, &BaseBlock::new(STONE));
        assert_eq!(a.block_states(), b.block_states());
        assert_eq!(b.get_block(3, 1, 2), Some(STONE));
    }

    #[test]
    fn rebind_keeps_stale_cells_until_clear() {
        let mut cache = section();
        cache.set_block(2, 64, 2, STONE);
        cache.rebind(-16, 0).unwrap();
        assert_eq!(cache.offset(), (-16, 0));
        cache.set_block(18, 64, 3, DIRT);
        assert_eq!(cache.get_block(2, 64, 2), Some(STONE));
        assert_eq!(cache.get_block(2, 64, 3), Some(DIRT));
        cache.clear();
        assert_eq!(cache.written(), 0);
        assert_eq!(cache.size(), 16 * 16 * 16);
    }

    #[test]
    fn offsets_past_i32_range_are_refused() {
        let mut cache =
            BlockArrayCache::new(BlockPos::new(100, 0, 0), BlockPos::new(103, 0, 3)).unwrap();
        assert_eq!(cache.scope_min(), (4, 0));
        assert_eq!(
            cache.rebind(i32::MAX, 0),
            Err(RegionError::OffsetOutOfRange {
                offset_x: i32::MAX,
                offset_z: 0
            })
        );
        // The window may sit flush against i32::MIN
        cache.set_offset_z(i32::MIN).unwrap();
        assert_eq!(cache.min().z, i32::MIN);
        cache.set_offset_z(0).unwrap();
        assert_eq!(cache.offset(), (0, 0));
        assert_eq!(cache.min(), BlockPos::new(96, 0, 0));

        // Largest offset whose window still ends at i32::MAX
        let edge = i32::MAX - 111;
        cache.rebind(edge, 0).unwrap();
        assert_eq!(cache.max().x, i32::MAX);
        assert!(cache.set_offset_x(edge + 1).is_err());
        assert_eq!(cache.offset(), (edge, 0));
    }

    #[test]
    fn pattern_position_wraps_instead_of_overflowing() {
        let mut cache =
            BlockArrayCache::new(BlockPos::new(100, 0, 0), BlockPos::new(103, 0, 3)).unwrap();
        let offset = i32::MIN + 200;
        cache.rebind(offset, 0).unwrap();
        let x = 4 - offset;
        let seen = std::cell::Cell::new(None);
        let pattern = FnPattern(|p: BlockPos| {
            seen.set(Some(p));
            BaseBlock::new(STONE)
        });
        cache.set_pattern(x, 0, 0, &pattern);
        assert_eq!(seen.get(), Some(BlockPos::new(100i32.wrapping_add(x), 0, 0)));
        assert_eq!(cache.get_block(0, 0, 0), Some(STONE));
    }

    #[test]
    fn rejects_inverted_regions() {
        let err = BlockArrayCache::new(BlockPos::new(0, 10, 0), BlockPos::new(15, 9, 15));
        match err {
            Err(RegionError::NonPositiveExtent { axis, extent, .. }) => {
                assert_eq!(axis, Axis::Y);
                assert_eq!(extent, 0);
            }
            other => panic!("unexpected {:?}", other.map(|c| c.size())),
        }
        assert!(BlockArrayCache::new(BlockPos::new(5, 0, 0), BlockPos::new(0, 0, 0)).is_err());
        assert!(BlockArrayCache::new(BlockPos::new(0, 0, 5), BlockPos::new(0, 0, 4)).is_err());
    }

    #[test]
    fn iter_written_reports_native_coords() {
        let mut cache =
            BlockArrayCache::new(BlockPos::new(4, 10, 4), BlockPos::new(7, 12, 9)).unwrap();
        cache.set_block(5, 11, 8, STONE);
        cache.set_block(7, 12, 4, DIRT);
        let mut got: Vec<_> = cache.iter_written().collect();
        got.sort_by_key(|&(x, y, z, _)| (y, x, z));
        assert_eq!(got, vec![(1, 11, 4, STONE), (3, 12, 0, DIRT)]);
    }

    #[test]
    fn unsupported_mutations_are_noops() {
        let mut cache = section();
        cache.set_block(1, 65, 1, STONE);
        let before = cache.block_states().to_vec();
        assert!(!cache.set_biome_2d(1, 1, Biome::PLAINS));
        assert!(!cache.set_biome(1, 65, 1, Biome::PLAINS));
        cache.fill_biome(Biome::PLAINS);
        assert!(!cache.set_tile(1, 65, 1, &CompoundTag::new()));
        assert_eq!(cache.block_states(), &before[..]);
    }
}
