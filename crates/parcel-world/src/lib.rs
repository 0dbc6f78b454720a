//! Sparse chunk-column world that block queues are applied to.
#![forbid(unsafe_code)]

mod column;
mod queue;

pub use column::ChunkColumn;
pub use queue::WorldQueue;

use hashbrown::HashMap;
use parcel_blocks::{Biome, BlockState, CompoundTag};
use parcel_geom::{BlockPos, ChunkPos};
use parcel_queue::BlockArrayCache;

pub const DEFAULT_MAX_TILES: usize = 4096;

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorldStats {
    pub loaded_chunks: usize,
    pub stored_chunks: usize,
    pub non_air_blocks: usize,
    pub tiles: usize,
    pub rev: u64,
}

/// Loaded chunk columns keyed by position, all sharing one vertical range.
///
/// Unloading moves a column into storage rather than dropping it; it is
/// restored on the next load or write. Reads see stored columns too.
pub struct ChunkWorld {
    min_y: i32,
    max_y: i32,
    columns: HashMap<ChunkPos, ChunkColumn>,
    stored: HashMap<ChunkPos, ChunkColumn>,
    max_tiles_per_chunk: usize,
    // Change-tracking
    counter: u64,
}

impl ChunkWorld {
    /// `min_y..=max_y` is the build height of every column.
    pub fn new(min_y: i32, max_y: i32) -> Self {
        debug_assert!(max_y >= min_y);
        Self {
            min_y,
            max_y,
            columns: HashMap::new(),
            stored: HashMap::new(),
            max_tiles_per_chunk: DEFAULT_MAX_TILES,
            counter: 0,
        }
    }

    pub fn with_max_tiles(mut self, max_tiles_per_chunk: usize) -> Self {
        self.max_tiles_per_chunk = max_tiles_per_chunk;
        self
    }

    #[inline]
    pub fn min_y(&self) -> i32 {
        self.min_y
    }

    #[inline]
    pub fn max_y(&self) -> i32 {
        self.max_y
    }

    #[inline]
    fn height(&self) -> usize {
        (self.max_y - self.min_y + 1) as usize
    }

    pub fn stats(&self) -> WorldStats {
        WorldStats {
            loaded_chunks: self.columns.len(),
            stored_chunks: self.stored.len(),
            non_air_blocks: self.all_columns().map(|c| c.non_air_count()).sum(),
            tiles: self.all_columns().map(|c| c.tile_count()).sum(),
            rev: self.counter,
        }
    }

    fn all_columns(&self) -> impl Iterator<Item = &ChunkColumn> + '_ {
        self.columns.values().chain(self.stored.values())
    }

    /// Load a column, restoring it from storage or creating it all-air.
    /// Returns false if it was already loaded.
    pub fn load_chunk(&mut self, pos: ChunkPos) -> bool {
        if self.columns.contains_key(&pos) {
            return false;
        }
        let col = match self.stored.remove(&pos) {
            Some(col) => col,
            None => ChunkColumn::new(pos, self.min_y, self.height()),
        };
        self.columns.insert(pos, col);
        log::trace!("loaded chunk ({}, {})", pos.cx, pos.cz);
        true
    }

    /// Move a loaded column into storage. Its contents are kept.
    pub fn unload_chunk(&mut self, pos: ChunkPos) -> bool {
        let Some(col) = self.columns.remove(&pos) else {
            return false;
        };
        self.stored.insert(pos, col);
        log::trace!("unloaded chunk ({}, {})", pos.cx, pos.cz);
        true
    }

    /// Drop a column, loaded or stored, and hand it back.
    pub fn discard_chunk(&mut self, pos: ChunkPos) -> Option<ChunkColumn> {
        let col = self.columns.remove(&pos).or_else(|| self.stored.remove(&pos));
        if col.is_some() {
            log::trace!("discarded chunk ({}, {})", pos.cx, pos.cz);
        }
        col
    }

    #[inline]
    pub fn is_stored(&self, pos: ChunkPos) -> bool {
        self.stored.contains_key(&pos)
    }

    #[inline]
    pub fn is_loaded(&self, pos: ChunkPos) -> bool {
        self.columns.contains_key(&pos)
    }

    /// Loaded or stored column.
    pub fn column(&self, pos: ChunkPos) -> Option<&ChunkColumn> {
        self.columns.get(&pos).or_else(|| self.stored.get(&pos))
    }

    pub fn loaded_chunks(&self) -> impl Iterator<Item = ChunkPos> + '_ {
        self.columns.keys().copied()
    }

    /// Latest change stamp of a column, 0 if never changed or not loaded.
    pub fn chunk_rev(&self, pos: ChunkPos) -> u64 {
        self.column(pos).map(|c| c.rev).unwrap_or(0)
    }

    #[inline]
    fn peek_stamp(&self) -> u64 {
        self.counter.wrapping_add(1).max(1)
    }

    #[inline]
    fn in_height(&self, wy: i32) -> bool {
        wy >= self.min_y && wy <= self.max_y
    }

    /// Column for a world position, loading it if needed.
    fn column_for(&mut self, wx: i32, wz: i32) -> &mut ChunkColumn {
        let pos = BlockPos::new(wx, 0, wz).chunk();
        let (min_y, sy) = (self.min_y, self.height());
        let stored = &mut self.stored;
        self.columns.entry(pos).or_insert_with(|| {
            stored
                .remove(&pos)
                .unwrap_or_else(|| ChunkColumn::new(pos, min_y, sy))
        })
    }

    pub fn get(&self, wx: i32, wy: i32, wz: i32) -> Option<BlockState> {
        let pos = BlockPos::new(wx, wy, wz).chunk();
        self.column(pos)?.get_world(wx, wy, wz)
    }

    /// Returns whether the world changed. Out-of-height writes are dropped.
    pub fn set(&mut self, wx: i32, wy: i32, wz: i32, b: BlockState) -> bool {
        if !self.in_height(wy) {
            return false;
        }
        let stamp = self.peek_stamp();
        let col = self.column_for(wx, wz);
        let Some((x, y, z)) = col.local_of(wx, wy, wz) else {
            return false;
        };
        if !col.set_local(x, y, z, b) {
            return false;
        }
        // Replacing a block drops its tile entity.
        col.tiles.remove(&(x, wy, z));
        col.bump_rev(stamp);
        self.counter = stamp;
        true
    }

    pub fn biome(&self, wx: i32, wy: i32, wz: i32) -> Option<Biome> {
        let pos = BlockPos::new(wx, wy, wz).chunk();
        let col = self.column(pos)?;
        let (x, y, z) = col.local_of(wx, wy, wz)?;
        Some(col.biome_local(x, y, z))
    }

    pub fn set_biome(&mut self, wx: i32, wy: i32, wz: i32, biome: Biome) -> bool {
        if !self.in_height(wy) {
            return false;
        }
        let stamp = self.peek_stamp();
        let col = self.column_for(wx, wz);
        let Some((x, y, z)) = col.local_of(wx, wy, wz) else {
            return false;
        };
        if !col.set_biome_local(x, y, z, biome) {
            return false;
        }
        col.bump_rev(stamp);
        self.counter = stamp;
        true
    }

    pub fn set_biome_column(&mut self, wx: i32, wz: i32, biome: Biome) -> bool {
        let stamp = self.peek_stamp();
        let min_y = self.min_y;
        let col = self.column_for(wx, wz);
        let Some((x, _, z)) = col.local_of(wx, min_y, wz) else {
            return false;
        };
        if !col.set_biome_column(x, z, biome) {
            return false;
        }
        col.bump_rev(stamp);
        self.counter = stamp;
        true
    }

    pub fn tile(&self, wx: i32, wy: i32, wz: i32) -> Option<&CompoundTag> {
        let pos = BlockPos::new(wx, wy, wz).chunk();
        let col = self.column(pos)?;
        let (x, _, z) = col.local_of(wx, wy, wz)?;
        col.tile(x, wy, z)
    }

    /// Attach tile data. New tiles beyond the per-chunk cap are refused.
    pub fn set_tile(&mut self, wx: i32, wy: i32, wz: i32, tag: CompoundTag) -> bool {
        if !self.in_height(wy) {
            return false;
        }
        let cap = self.max_tiles_per_chunk;
        let stamp = self.peek_stamp();
        let col = self.column_for(wx, wz);
        let Some((x, _, z)) = col.local_of(wx, wy, wz) else {
            return false;
        };
        let key = (x, wy, z);
        if !col.tiles.contains_key(&key) && col.tiles.len() >= cap {
            log::warn!(
                "tile cap {} reached in chunk ({}, {}); dropping tile at ({}, {}, {})",
                cap,
                col.pos.cx,
                col.pos.cz,
                wx,
                wy,
                wz
            );
            return false;
        }
        if col.tiles.get(&key) == Some(&tag) {
            return false;
        }
        col.tiles.insert(key, tag);
        col.bump_rev(stamp);
        self.counter = stamp;
        true
    }

    /// Copy every written cell of a cache into the world.
    ///
    /// Native cell `(gx, y, gz)` lands at
    /// `min() + (scope_min_x + gx, 0, scope_min_z + gz)` with absolute y,
    /// i.e. the window position under the cache's current offset. Returns
    /// the number of cells copied.
    pub fn apply_cache(&mut self, cache: &BlockArrayCache) -> usize {
        use parcel_queue::QueueCoordinator;
        let origin = cache.min();
        let (smx, smz) = cache.scope_min();
        let mut applied = 0;
        let mut changed = 0;
        for (gx, y, gz, state) in cache.iter_written() {
            applied += 1;
            if self.set(origin.x + smx + gx, y, origin.z + smz + gz, state) {
                changed += 1;
            }
        }
        log::debug!(
            "applied cache at {:?}: {} cells, {} changed",
            origin,
            applied,
            changed
        );
        applied
    }
}
