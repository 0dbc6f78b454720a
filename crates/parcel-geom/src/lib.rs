//! Integer block and chunk positions shared by the queue and world crates.
#![forbid(unsafe_code)]

use core::ops::{Add, AddAssign, Sub, SubAssign};
use serde::{Deserialize, Serialize};

/// Horizontal edge length of a chunk column, in blocks.
pub const CHUNK_WIDTH: i32 = 16;
/// Mask reducing a world coordinate to its chunk-local component.
pub const CHUNK_MASK: i32 = CHUNK_WIDTH - 1;
const CHUNK_SHIFT: u32 = 4;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const ZERO: BlockPos = BlockPos { x: 0, y: 0, z: 0 };

    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub const fn add_xyz(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            z: self.z + dz,
        }
    }

    #[inline]
    pub const fn with_y(self, y: i32) -> Self {
        Self { y, ..self }
    }

    /// Chunk-local x in `0..16`; non-negative for negative coordinates too.
    #[inline]
    pub const fn local_x(self) -> i32 {
        self.x & CHUNK_MASK
    }

    #[inline]
    pub const fn local_z(self) -> i32 {
        self.z & CHUNK_MASK
    }

    /// Column containing this block.
    #[inline]
    pub const fn chunk(self) -> ChunkPos {
        ChunkPos {
            cx: self.x >> CHUNK_SHIFT,
            cz: self.z >> CHUNK_SHIFT,
        }
    }
}

impl Add for BlockPos {
    type Output = BlockPos;
    #[inline]
    fn add(self, rhs: BlockPos) -> BlockPos {
        self.add_xyz(rhs.x, rhs.y, rhs.z)
    }
}

impl AddAssign for BlockPos {
    #[inline]
    fn add_assign(&mut self, rhs: BlockPos) {
        *self = *self + rhs;
    }
}

impl Sub for BlockPos {
    type Output = BlockPos;
    #[inline]
    fn sub(self, rhs: BlockPos) -> BlockPos {
        BlockPos::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl SubAssign for BlockPos {
    #[inline]
    fn sub_assign(&mut self, rhs: BlockPos) {
        *self = *self - rhs;
    }
}

impl From<(i32, i32, i32)> for BlockPos {
    fn from(value: (i32, i32, i32)) -> Self {
        Self::new(value.0, value.1, value.2)
    }
}

impl From<BlockPos> for (i32, i32, i32) {
    fn from(value: BlockPos) -> Self {
        (value.x, value.y, value.z)
    }
}

/// Chunk column address (16x16 blocks, full world height).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct ChunkPos {
    pub cx: i32,
    pub cz: i32,
}

impl ChunkPos {
    #[inline]
    pub const fn new(cx: i32, cz: i32) -> Self {
        Self { cx, cz }
    }

    /// World position of the column's (0, y, 0) corner.
    #[inline]
    pub const fn origin(self, y: i32) -> BlockPos {
        BlockPos::new(self.cx * CHUNK_WIDTH, y, self.cz * CHUNK_WIDTH)
    }
}

impl From<(i32, i32)> for ChunkPos {
    fn from(value: (i32, i32)) -> Self {
        Self::new(value.0, value.1)
    }
}

/// Inclusive axis-aligned block box.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockRegion {
    pub min: BlockPos,
    pub max: BlockPos,
}

impl BlockRegion {
    /// Orders the corners component-wise.
    pub fn new(a: BlockPos, b: BlockPos) -> Self {
        Self {
            min: BlockPos::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: BlockPos::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.max.x - self.min.x + 1
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.max.y - self.min.y + 1
    }

    #[inline]
    pub fn length(&self) -> i32 {
        self.max.z - self.min.z + 1
    }

    #[inline]
    pub fn contains(&self, p: BlockPos) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    pub fn intersect(&self, other: &BlockRegion) -> Option<BlockRegion> {
        let min = BlockPos::new(
            self.min.x.max(other.min.x),
            self.min.y.max(other.min.y),
            self.min.z.max(other.min.z),
        );
        let max = BlockPos::new(
            self.max.x.min(other.max.x),
            self.max.y.min(other.max.y),
            self.max.z.min(other.max.z),
        );
        if min.x > max.x || min.y > max.y || min.z > max.z {
            return None;
        }
        Some(BlockRegion { min, max })
    }

    /// The part of this region inside one chunk column.
    pub fn clip_to_chunk(&self, chunk: ChunkPos) -> Option<BlockRegion> {
        let lo = chunk.origin(self.min.y);
        let column = BlockRegion {
            min: lo,
            max: lo.add_xyz(CHUNK_MASK, 0, CHUNK_MASK).with_y(self.max.y),
        };
        self.intersect(&column)
    }

    /// Every chunk column the region touches, x-major.
    pub fn chunks(&self) -> Vec<ChunkPos> {
        let lo = self.min.chunk();
        let hi = self.max.chunk();
        let mut out = Vec::new();
        for cx in lo.cx..=hi.cx {
            for cz in lo.cz..=hi.cz {
                out.push(ChunkPos::new(cx, cz));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn local_coords_rebuild_world_coords(p in any::<BlockPos>()) {
            let c = p.chunk();
            let o = c.origin(p.y);
            prop_assert_eq!(o.add_xyz(p.local_x(), 0, p.local_z()), p);
        }
    }

    #[test]
    fn negative_coordinates_mask_into_chunk() {
        let p = BlockPos::new(-1, 10, -17);
        assert_eq!(p.local_x(), 15);
        assert_eq!(p.local_z(), 15);
        assert_eq!(p.chunk(), ChunkPos::new(-1, -2));
    }
}
