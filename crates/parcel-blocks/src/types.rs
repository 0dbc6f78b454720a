use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type BlockId = u16;
pub type StateBits = u16;

/// Immutable voxel value: block type plus packed property bits.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default, Debug, Serialize, Deserialize)]
pub struct BlockState {
    pub id: BlockId,
    pub state: StateBits,
}

impl BlockState {
    pub const AIR: BlockState = BlockState { id: 0, state: 0 };

    #[inline]
    pub const fn new(id: BlockId, state: StateBits) -> Self {
        Self { id, state }
    }

    #[inline]
    pub fn is_air(self) -> bool {
        self.id == 0
    }
}

/// Block as handed out by patterns and editors: a state that may carry
/// tile-entity data.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct BaseBlock {
    pub state: BlockState,
    #[serde(default)]
    pub nbt: Option<CompoundTag>,
}

impl BaseBlock {
    pub fn new(state: BlockState) -> Self {
        Self { state, nbt: None }
    }

    pub fn with_nbt(state: BlockState, nbt: CompoundTag) -> Self {
        Self {
            state,
            nbt: Some(nbt),
        }
    }

    /// Drops any tile data, leaving the canonical block state.
    #[inline]
    pub fn to_immutable_state(&self) -> BlockState {
        self.state
    }

    #[inline]
    pub fn has_nbt(&self) -> bool {
        self.nbt.is_some()
    }
}

impl From<BlockState> for BaseBlock {
    fn from(state: BlockState) -> Self {
        BaseBlock::new(state)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub struct Biome(pub u16);

impl Biome {
    pub const PLAINS: Biome = Biome(1);
}

/// Tile-entity payload, a small NBT-like tree.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct CompoundTag(pub BTreeMap<String, Tag>);

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Tag {
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Tag>),
    Compound(CompoundTag),
}

impl CompoundTag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Tag) -> Option<Tag> {
        self.0.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&Tag> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
