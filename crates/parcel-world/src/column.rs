use hashbrown::HashMap;
use parcel_blocks::{Biome, BlockState, CompoundTag};
use parcel_geom::{CHUNK_WIDTH, ChunkPos};

const W: usize = CHUNK_WIDTH as usize;

/// Dense block storage for one loaded chunk column.
#[derive(Clone, Debug)]
pub struct ChunkColumn {
    pub pos: ChunkPos,
    pub min_y: i32,
    pub sy: usize,
    pub blocks: Vec<BlockState>,
    pub biomes: Vec<Biome>,
    // key: (local x, world y, local z)
    pub tiles: HashMap<(usize, i32, usize), CompoundTag>,
    pub rev: u64,
}

impl ChunkColumn {
    pub fn new(pos: ChunkPos, min_y: i32, sy: usize) -> Self {
        Self {
            pos,
            min_y,
            sy,
            blocks: vec![BlockState::AIR; W * sy * W],
            biomes: vec![Biome::default(); W * sy * W],
            tiles: HashMap::new(),
            rev: 0,
        }
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize, z: usize) -> usize {
        (y * W + z) * W + x
    }

    #[inline]
    pub fn get_local(&self, x: usize, y: usize, z: usize) -> BlockState {
        self.blocks[self.idx(x, y, z)]
    }

    /// Returns whether the stored value changed.
    #[inline]
    pub fn set_local(&mut self, x: usize, y: usize, z: usize, b: BlockState) -> bool {
        let i = self.idx(x, y, z);
        if self.blocks[i] == b {
            return false;
        }
        self.blocks[i] = b;
        true
    }

    /// Local `(x, y, z)` of a world position, if the column holds it.
    #[inline]
    pub fn local_of(&self, wx: i32, wy: i32, wz: i32) -> Option<(usize, usize, usize)> {
        let base_x = self.pos.cx * CHUNK_WIDTH;
        let base_z = self.pos.cz * CHUNK_WIDTH;
        if wy < self.min_y || wy >= self.min_y + self.sy as i32 {
            return None;
        }
        if wx < base_x || wx >= base_x + CHUNK_WIDTH || wz < base_z || wz >= base_z + CHUNK_WIDTH {
            return None;
        }
        Some((
            (wx - base_x) as usize,
            (wy - self.min_y) as usize,
            (wz - base_z) as usize,
        ))
    }

    #[inline]
    pub fn contains_world(&self, wx: i32, wy: i32, wz: i32) -> bool {
        self.local_of(wx, wy, wz).is_some()
    }

    #[inline]
    pub fn get_world(&self, wx: i32, wy: i32, wz: i32) -> Option<BlockState> {
        let (x, y, z) = self.local_of(wx, wy, wz)?;
        Some(self.get_local(x, y, z))
    }

    pub fn biome_local(&self, x: usize, y: usize, z: usize) -> Biome {
        self.biomes[self.idx(x, y, z)]
    }

    pub fn set_biome_local(&mut self, x: usize, y: usize, z: usize, biome: Biome) -> bool {
        let i = self.idx(x, y, z);
        if self.biomes[i] == biome {
            return false;
        }
        self.biomes[i] = biome;
        true
    }

    /// Set the biome for every y of one block column.
    pub fn set_biome_column(&mut self, x: usize, z: usize, biome: Biome) -> bool {
        let mut changed = false;
        for y in 0..self.sy {
            changed |= self.set_biome_local(x, y, z, biome);
        }
        changed
    }

    pub fn tile(&self, x: usize, wy: i32, z: usize) -> Option<&CompoundTag> {
        self.tiles.get(&(x, wy, z))
    }

    #[inline]
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    #[inline]
    pub fn has_non_air(&self) -> bool {
        self.blocks.iter().any(|b| !b.is_air())
    }

    #[inline]
    pub fn is_all_air(&self) -> bool {
        !self.has_non_air()
    }

    pub fn non_air_count(&self) -> usize {
        self.blocks.iter().filter(|b| !b.is_air()).count()
    }

    pub(crate) fn bump_rev(&mut self, stamp: u64) {
        self.rev = stamp;
    }
}
