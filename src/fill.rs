use std::cell::Cell;

use hashbrown::HashMap;
use hashbrown::hash_map::Entry;
use parcel_blocks::{FnPattern, Pattern};
use parcel_geom::{BlockPos, BlockRegion, CHUNK_WIDTH, ChunkPos};
use parcel_queue::{BlockArrayCache, QueueCoordinator};
use parcel_runtime::{
    ChunkCoordinator, CoordinatorError, LoggingSubscriber, ProgressSubscriber, Settings,
};
use parcel_world::ChunkWorld;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FillSummary {
    pub chunks: usize,
    pub cells: usize,
    pub caches: usize,
    pub failed: usize,
    pub ticks: usize,
}

// Clip of a region against one chunk, relative to that chunk's origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct ClipShape {
    min_x: i32,
    min_z: i32,
    width: i32,
    length: i32,
}

impl ClipShape {
    fn of(part: &BlockRegion, chunk: ChunkPos) -> Self {
        let origin = chunk.origin(0);
        Self {
            min_x: part.min.x - origin.x,
            min_z: part.min.z - origin.z,
            width: part.width(),
            length: part.length(),
        }
    }
}

/// Caches keyed by clip shape, each remembering the chunk it was built for.
/// Chunks with the same shape reuse one buffer through `rebind`.
#[derive(Default)]
struct CachePool {
    caches: HashMap<ClipShape, (ChunkPos, BlockArrayCache)>,
    allocated: usize,
}

impl CachePool {
    fn bind(
        &mut self,
        part: &BlockRegion,
        chunk: ChunkPos,
    ) -> Result<&mut BlockArrayCache, CoordinatorError> {
        let (home, cache) = match self.caches.entry(ClipShape::of(part, chunk)) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => {
                let cache = BlockArrayCache::new(part.min, part.max)?;
                self.allocated += 1;
                e.insert((chunk, cache))
            }
        };
        cache.rebind(
            (chunk.cx - home.cx) * CHUNK_WIDTH,
            (chunk.cz - home.cz) * CHUNK_WIDTH,
        )?;
        cache.clear();
        Ok(cache)
    }
}

/// Writes one chunk's share of the fill into `cache`, using chunk-local
/// coordinates. Writes outside the cache window are clipped by the cache.
fn paint_chunk(cache: &mut BlockArrayCache, pattern: &dyn Pattern) {
    let (ox, oz) = cache.offset();
    let min = cache.min();
    let base = cache.region_min();
    // set_pattern samples at region_min + write coords; move that back to
    // the world cell the value lands on.
    let shift = BlockPos::new(min.x + ox - base.x, -base.y, min.z + oz - base.z);
    let shifted = FnPattern(|p: BlockPos| pattern.apply_block(p + shift));
    for y in cache.min_y()..=cache.max_y() {
        for lx in 0..CHUNK_WIDTH {
            for lz in 0..CHUNK_WIDTH {
                cache.set_pattern(lx - ox, y, lz - oz, &shifted);
            }
        }
    }
}

/// Fill `region` of `world` with `pattern`, one chunk per task, under the
/// queue budget from `settings`.
pub fn fill_region(
    world: &mut ChunkWorld,
    region: BlockRegion,
    pattern: &dyn Pattern,
    settings: &Settings,
    subscriber: Option<Box<dyn ProgressSubscriber + '_>>,
) -> Result<FillSummary, CoordinatorError> {
    let region = BlockRegion {
        min: region.min.with_y(region.min.y.max(world.min_y())),
        max: region.max.with_y(region.max.y.min(world.max_y())),
    };
    if region.height() <= 0 {
        log::warn!("fill region {:?} is outside the world height", region);
        return Ok(FillSummary::default());
    }
    let chunks = region.chunks();
    log::info!("filling {:?}..{:?} across {} chunks", region.min, region.max, chunks.len());

    let mut pool = CachePool::default();
    let cells = Cell::new(0usize);
    let failed = Cell::new(0usize);
    let mut builder = ChunkCoordinator::builder()
        .from_settings(settings)
        .with_chunks(chunks.iter().copied())
        .with_consumer(|w: &mut ChunkWorld, pos: ChunkPos| {
            let Some(part) = region.clip_to_chunk(pos) else {
                return Ok(());
            };
            let cache = pool.bind(&part, pos)?;
            paint_chunk(cache, pattern);
            cells.set(cells.get() + w.apply_cache(cache));
            Ok(())
        })
        .with_throwable_consumer(|e| {
            log::warn!("fill task failed: {}", e);
            failed.set(failed.get() + 1);
        });
    if let Some(s) = subscriber {
        builder = builder.with_progress_subscriber(s);
    }
    let mut coord = builder.build()?;
    let ticks = coord.run_to_completion(world);
    drop(coord);

    Ok(FillSummary {
        chunks: chunks.len(),
        cells: cells.get(),
        caches: pool.allocated,
        failed: failed.get(),
        ticks,
    })
}

/// Default progress reporter for CLI fills.
pub fn logging_subscriber() -> Box<dyn ProgressSubscriber> {
    Box::new(LoggingSubscriber::new("fill", 0.1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use parcel_blocks::{BlockState, NoisePattern};

    const STONE: BlockState = BlockState::new(1, 0);
    const DIRT: BlockState = BlockState::new(2, 0);

    fn settings() -> Settings {
        Settings::from_toml_str("[queue]\ntarget_time_ms = 5000\n").unwrap()
    }

    #[test]
    fn fills_exactly_the_region() {
        let mut world = ChunkWorld::new(0, 31);
        let region = BlockRegion::new(BlockPos::new(-20, 4, 5), BlockPos::new(40, 6, 37));
        let summary = fill_region(&mut world, region, &STONE, &settings(), None).unwrap();
        let volume = (61 * 3 * 33) as usize;
        assert_eq!(summary.cells, volume);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.chunks, region.chunks().len());
        assert_eq!(world.stats().non_air_blocks, volume);
        for (x, y, z) in [(-20, 4, 5), (40, 6, 37), (0, 5, 16), (15, 5, 31)] {
            assert_eq!(world.get(x, y, z), Some(STONE), "inside at {x},{y},{z}");
        }
        for (x, y, z) in [(-21, 4, 5), (41, 6, 37), (0, 3, 16), (0, 7, 16), (0, 5, 4)] {
            assert_eq!(world.get(x, y, z), Some(BlockState::AIR), "outside at {x},{y},{z}");
        }
    }

    #[test]
    fn interior_chunks_share_one_cache() {
        let mut world = ChunkWorld::new(0, 15);
        let region = BlockRegion::new(BlockPos::new(0, 0, 0), BlockPos::new(63, 1, 63));
        let summary = fill_region(&mut world, region, &DIRT, &settings(), None).unwrap();
        assert_eq!(summary.chunks, 16);
        assert_eq!(summary.caches, 1);
        assert_eq!(summary.cells, 64 * 64 * 2);
    }

    #[test]
    fn noise_is_sampled_at_world_positions() {
        let mut world = ChunkWorld::new(0, 15);
        let noise = NoisePattern::new(7, 0.2, STONE, DIRT, 0.0);
        let region = BlockRegion::new(BlockPos::new(-9, 2, 3), BlockPos::new(40, 4, 40));
        let summary = fill_region(&mut world, region, &noise, &settings(), None).unwrap();
        assert!(summary.caches < summary.chunks);
        for x in region.min.x..=region.max.x {
            for y in region.min.y..=region.max.y {
                for z in region.min.z..=region.max.z {
                    let expected = noise.apply_block(BlockPos::new(x, y, z)).to_immutable_state();
                    assert_eq!(world.get(x, y, z), Some(expected));
                }
            }
        }
    }

    #[test]
    fn auto_trim_keeps_filled_columns() {
        let settings = Settings::from_toml_str(
            "[queue]\ntarget_time_ms = 5000\n[chunk_processor]\nauto_trim = true\n",
        )
        .unwrap();
        let mut world = ChunkWorld::new(0, 15);
        let region = BlockRegion::new(BlockPos::new(0, 0, 0), BlockPos::new(31, 1, 31));
        let summary = fill_region(&mut world, region, &STONE, &settings, None).unwrap();
        assert_eq!(summary.cells, 32 * 2 * 32);
        let stats = world.stats();
        assert_eq!(stats.loaded_chunks, 0);
        assert_eq!(stats.stored_chunks, 4);
        assert_eq!(stats.non_air_blocks, summary.cells);
        assert_eq!(world.get(31, 1, 31), Some(STONE));
    }

    #[test]
    fn region_is_clamped_to_world_height() {
        let mut world = ChunkWorld::new(0, 7);
        let region = BlockRegion::new(BlockPos::new(0, -10, 0), BlockPos::new(3, 100, 3));
        let summary = fill_region(&mut world, region, &STONE, &settings(), None).unwrap();
        assert_eq!(summary.cells, 4 * 8 * 4);

        let above = BlockRegion::new(BlockPos::new(0, 50, 0), BlockPos::new(3, 60, 3));
        let summary = fill_region(&mut world, above, &STONE, &settings(), None).unwrap();
        assert_eq!(summary, FillSummary::default());
    }
}
