//! Block queues: write surfaces that buffer or forward block, biome, and tile
//! mutations for a region of the world.
#![forbid(unsafe_code)]

mod array_cache;
mod scoped;

pub use array_cache::{Axis, BlockArrayCache, RegionError};
pub use scoped::ScopedQueue;

use parcel_blocks::{BaseBlock, Biome, BlockState, CompoundTag, Pattern};
use parcel_geom::BlockPos;

/// Shared mutation contract for every queue variant.
///
/// Boolean returns report whether the call changed host-visible world state
/// immediately. Buffering queues always answer `false`. Variants that do not
/// keep a category of data (biomes, tiles) accept the call as a no-op.
///
/// Coordinate frames are per variant; see each implementor.
pub trait QueueCoordinator {
    fn set_block(&mut self, x: i32, y: i32, z: i32, state: BlockState) -> bool;

    /// Write the pattern's value for this position. Implementations only
    /// evaluate the pattern for coordinates they accept.
    fn set_pattern(&mut self, x: i32, y: i32, z: i32, pattern: &dyn Pattern) -> bool;

    fn set_raw_block(&mut self, x: i32, y: i32, z: i32, block: &BaseBlock) -> bool;

    fn get_block(&self, x: i32, y: i32, z: i32) -> Option<BlockState>;

    /// Set the biome of a whole block column.
    fn set_biome_2d(&mut self, x: i32, z: i32, biome: Biome) -> bool;

    fn set_biome(&mut self, x: i32, y: i32, z: i32, biome: Biome) -> bool;

    fn fill_biome(&mut self, biome: Biome);

    fn set_tile(&mut self, x: i32, y: i32, z: i32, tag: &CompoundTag) -> bool;

    /// Logical capacity in blocks.
    fn size(&self) -> usize;

    fn min(&self) -> BlockPos;

    fn max(&self) -> BlockPos;
}

impl<Q: QueueCoordinator + ?Sized> QueueCoordinator for &mut Q {
    fn set_block(&mut self, x: i32, y: i32, z: i32, state: BlockState) -> bool {
        (**self).set_block(x, y, z, state)
    }

    fn set_pattern(&mut self, x: i32, y: i32, z: i32, pattern: &dyn Pattern) -> bool {
        (**self).set_pattern(x, y, z, pattern)
    }

    fn set_raw_block(&mut self, x: i32, y: i32, z: i32, block: &BaseBlock) -> bool {
        (**self).set_raw_block(x, y, z, block)
    }

    fn get_block(&self, x: i32, y: i32, z: i32) -> Option<BlockState> {
        (**self).get_block(x, y, z)
    }

    fn set_biome_2d(&mut self, x: i32, z: i32, biome: Biome) -> bool {
        (**self).set_biome_2d(x, z, biome)
    }

    fn set_biome(&mut self, x: i32, y: i32, z: i32, biome: Biome) -> bool {
        (**self).set_biome(x, y, z, biome)
    }

    fn fill_biome(&mut self, biome: Biome) {
        (**self).fill_biome(biome)
    }

    fn set_tile(&mut self, x: i32, y: i32, z: i32, tag: &CompoundTag) -> bool {
        (**self).set_tile(x, y, z, tag)
    }

    fn size(&self) -> usize {
        (**self).size()
    }

    fn min(&self) -> BlockPos {
        (**self).min()
    }

    fn max(&self) -> BlockPos {
        (**self).max()
    }
}
