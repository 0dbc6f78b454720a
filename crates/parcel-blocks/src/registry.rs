use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::path::Path;

use super::config::BlocksConfig;
use super::types::{BlockId, BlockState};

#[derive(Clone, Debug)]
pub struct BlockType {
    pub id: BlockId,
    pub name: String,
}

#[derive(Default, Clone, Debug)]
pub struct BlockRegistry {
    pub blocks: Vec<BlockType>,
    pub by_name: HashMap<String, BlockId>,
    pub unknown_block_id: Option<BlockId>,
}

const DEFAULT_BLOCKS: &[&str] = &[
    "air",
    "stone",
    "dirt",
    "grass_block",
    "bedrock",
    "sand",
    "water",
    "oak_planks",
    "glass",
    "chest",
    "sign",
];

impl BlockRegistry {
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            by_name: HashMap::new(),
            unknown_block_id: None,
        }
    }

    /// Small built-in palette used when no blocks file is given.
    pub fn with_defaults() -> Self {
        let mut reg = Self::new();
        for &name in DEFAULT_BLOCKS {
            let id = reg.blocks.len() as BlockId;
            reg.by_name.insert(name.to_string(), id);
            reg.blocks.push(BlockType {
                id,
                name: name.to_string(),
            });
        }
        reg
    }

    #[inline]
    pub fn get(&self, id: BlockId) -> Option<&BlockType> {
        self.blocks.get(id as usize)
    }

    pub fn id_by_name(&self, name: &str) -> Option<BlockId> {
        self.by_name.get(name).copied()
    }

    /// Default state of the named block.
    pub fn state_by_name(&self, name: &str) -> Option<BlockState> {
        self.id_by_name(name).map(|id| BlockState::new(id, 0))
    }

    /// Like `state_by_name`, but misses resolve to the unknown block (or air).
    pub fn state_or_unknown(&self, name: &str) -> BlockState {
        self.state_by_name(name)
            .unwrap_or_else(|| BlockState::new(self.unknown_block_id.unwrap_or(0), 0))
    }

    pub fn name_of(&self, state: BlockState) -> Option<&str> {
        self.get(state.id).map(|t| t.name.as_str())
    }

    pub fn load_from_path(blocks_path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let blocks_toml = fs::read_to_string(blocks_path)?;
        Self::from_toml_str(&blocks_toml)
    }

    pub fn from_toml_str(src: &str) -> Result<Self, Box<dyn Error>> {
        let cfg: BlocksConfig = toml::from_str(src)?;
        Self::from_config(cfg)
    }

    pub fn from_config(cfg: BlocksConfig) -> Result<Self, Box<dyn Error>> {
        let mut reg = BlockRegistry::new();
        for def in cfg.blocks.into_iter() {
            let id = def.id.unwrap_or(reg.blocks.len() as BlockId);
            // Registry is indexed by id, so ids must be dense and in order.
            if id as usize != reg.blocks.len() {
                return Err(format!(
                    "block '{}' has id {} but the next free id is {}",
                    def.name,
                    id,
                    reg.blocks.len()
                )
                .into());
            }
            if reg.by_name.contains_key(&def.name) {
                return Err(format!("duplicate block name '{}'", def.name).into());
            }
            reg.by_name.insert(def.name.clone(), id);
            reg.blocks.push(BlockType {
                id,
                name: def.name,
            });
        }
        if reg.id_by_name("air") != Some(0) {
            return Err("block id 0 must be 'air'".into());
        }
        reg.unknown_block_id = cfg
            .unknown_block
            .as_deref()
            .and_then(|n| reg.id_by_name(n));
        if let (Some(name), None) = (cfg.unknown_block.as_deref(), reg.unknown_block_id) {
            log::warn!("unknown_block '{}' is not a registered block; misses resolve to air", name);
        }
        log::debug!(
            "block registry loaded: {} blocks, unknown block {:?}",
            reg.blocks.len(),
            reg.unknown_block_id
        );
        Ok(reg)
    }
}
