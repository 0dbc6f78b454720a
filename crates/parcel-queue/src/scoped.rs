use parcel_blocks::{BaseBlock, Biome, BlockState, CompoundTag, Pattern};
use parcel_geom::BlockPos;

use crate::QueueCoordinator;
use crate::array_cache::{RegionError, region_extents};

/// Window onto another queue. Accepts coordinates relative to `min`, within
/// `[0, dx] x [0, dy] x [0, dz]`, and forwards them translated to the parent.
pub struct ScopedQueue<Q> {
    parent: Q,
    min: BlockPos,
    max: BlockPos,
    dx: i32,
    dy: i32,
    dz: i32,
}

impl<Q: QueueCoordinator> ScopedQueue<Q> {
    /// `min` and `max` are inclusive and must not be inverted on any axis.
    pub fn new(parent: Q, min: BlockPos, max: BlockPos) -> Result<Self, RegionError> {
        let (width, height, length) = region_extents(min, max)?;
        let too_large = RegionError::TooLarge {
            width,
            height,
            length,
        };
        let span = |extent: i64| i32::try_from(extent - 1).map_err(|_| too_large);
        Ok(Self {
            parent,
            min,
            max,
            dx: span(width)?,
            dy: span(height)?,
            dz: span(length)?,
        })
    }

    pub fn parent(&self) -> &Q {
        &self.parent
    }

    pub fn into_parent(self) -> Q {
        self.parent
    }

    #[inline]
    fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        x >= 0 && x <= self.dx && y >= 0 && y <= self.dy && z >= 0 && z <= self.dz
    }

    #[inline]
    fn contains_xz(&self, x: i32, z: i32) -> bool {
        x >= 0 && x <= self.dx && z >= 0 && z <= self.dz
    }
}

impl<Q: QueueCoordinator> QueueCoordinator for ScopedQueue<Q> {
    fn set_block(&mut self, x: i32, y: i32, z: i32, state: BlockState) -> bool {
        self.contains(x, y, z)
            && self
                .parent
                .set_block(x + self.min.x, y + self.min.y, z + self.min.z, state)
    }

    fn set_pattern(&mut self, x: i32, y: i32, z: i32, pattern: &dyn Pattern) -> bool {
        self.contains(x, y, z)
            && self
                .parent
                .set_pattern(x + self.min.x, y + self.min.y, z + self.min.z, pattern)
    }

    fn set_raw_block(&mut self, x: i32, y: i32, z: i32, block: &BaseBlock) -> bool {
        self.contains(x, y, z)
            && self
                .parent
                .set_raw_block(x + self.min.x, y + self.min.y, z + self.min.z, block)
    }

    fn get_block(&self, x: i32, y: i32, z: i32) -> Option<BlockState> {
        if !self.contains(x, y, z) {
            return None;
        }
        self.parent
            .get_block(x + self.min.x, y + self.min.y, z + self.min.z)
    }

    fn set_biome_2d(&mut self, x: i32, z: i32, biome: Biome) -> bool {
        self.contains_xz(x, z)
            && self
                .parent
                .set_biome_2d(x + self.min.x, z + self.min.z, biome)
    }

    fn set_biome(&mut self, x: i32, y: i32, z: i32, biome: Biome) -> bool {
        self.contains(x, y, z)
            && self
                .parent
                .set_biome(x + self.min.x, y + self.min.y, z + self.min.z, biome)
    }

    fn fill_biome(&mut self, biome: Biome) {
        for x in 0..=self.dx {
            for z in 0..=self.dz {
                self.set_biome_2d(x, z, biome);
            }
        }
    }

    fn set_tile(&mut self, x: i32, y: i32, z: i32, tag: &CompoundTag) -> bool {
        self.contains(x, y, z)
            && self
                .parent
                .set_tile(x + self.min.x, y + self.min.y, z + self.min.z, tag)
    }

    fn size(&self) -> usize {
        let extent = |d: i32| d as usize + 1;
        extent(self.dx)
            .saturating_mul(extent(self.dy))
            .saturating_mul(extent(self.dz))
    }

    fn min(&self) -> BlockPos {
        self.min
    }

    fn max(&self) -> BlockPos {
        self.max
    }
}
