use parcel_blocks::{BaseBlock, Biome, BlockState, CompoundTag, Pattern};
use parcel_geom::{BlockPos, BlockRegion};
use parcel_queue::QueueCoordinator;

use crate::ChunkWorld;

/// Queue that writes straight into a live world, limited to one region.
///
/// Coordinates are absolute world positions. Every call reports whether the
/// world actually changed.
pub struct WorldQueue<'w> {
    world: &'w mut ChunkWorld,
    region: BlockRegion,
}

impl<'w> WorldQueue<'w> {
    /// The region's vertical range is clamped to the world's build height.
    pub fn new(world: &'w mut ChunkWorld, region: BlockRegion) -> Self {
        let min = region.min.with_y(region.min.y.max(world.min_y()));
        let max = region.max.with_y(region.max.y.min(world.max_y()));
        Self {
            world,
            region: BlockRegion { min, max },
        }
    }

    pub fn region(&self) -> BlockRegion {
        self.region
    }

    #[inline]
    fn accepts(&self, x: i32, y: i32, z: i32) -> bool {
        self.region.contains(BlockPos::new(x, y, z))
    }

    #[inline]
    fn accepts_xz(&self, x: i32, z: i32) -> bool {
        self.accepts(x, self.region.min.y, z)
    }
}

impl QueueCoordinator for WorldQueue<'_> {
    fn set_block(&mut self, x: i32, y: i32, z: i32, state: BlockState) -> bool {
        self.accepts(x, y, z) && self.world.set(x, y, z, state)
    }

    fn set_pattern(&mut self, x: i32, y: i32, z: i32, pattern: &dyn Pattern) -> bool {
        if !self.accepts(x, y, z) {
            return false;
        }
        let block = pattern.apply_block(BlockPos::new(x, y, z));
        self.set_raw_block(x, y, z, &block)
    }

    /// Tile data carried by the block is attached after the state is set.
    fn set_raw_block(&mut self, x: i32, y: i32, z: i32, block: &BaseBlock) -> bool {
        if !self.accepts(x, y, z) {
            return false;
        }
        let mut changed = self.world.set(x, y, z, block.to_immutable_state());
        if let Some(nbt) = &block.nbt {
            changed |= self.world.set_tile(x, y, z, nbt.clone());
        }
        changed
    }

    fn get_block(&self, x: i32, y: i32, z: i32) -> Option<BlockState> {
        self.world.get(x, y, z)
    }

    fn set_biome_2d(&mut self, x: i32, z: i32, biome: Biome) -> bool {
        self.accepts_xz(x, z) && self.world.set_biome_column(x, z, biome)
    }

    fn set_biome(&mut self, x: i32, y: i32, z: i32, biome: Biome) -> bool {
        self.accepts(x, y, z) && self.world.set_biome(x, y, z, biome)
    }

    fn fill_biome(&mut self, biome: Biome) {
        let BlockRegion { min, max } = self.region;
        for x in min.x..=max.x {
            for z in min.z..=max.z {
                self.world.set_biome_column(x, z, biome);
            }
        }
    }

    fn set_tile(&mut self, x: i32, y: i32, z: i32, tag: &CompoundTag) -> bool {
        self.accepts(x, y, z) && self.world.set_tile(x, y, z, tag.clone())
    }

    fn size(&self) -> usize {
        let r = &self.region;
        r.width().max(0) as usize * r.height().max(0) as usize * r.length().max(0) as usize
    }

    fn min(&self) -> BlockPos {
        self.region.min
    }

    fn max(&self) -> BlockPos {
        self.region.max
    }
}
