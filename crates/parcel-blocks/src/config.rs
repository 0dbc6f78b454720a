use serde::Deserialize;

// Top-level blocks config file
#[derive(Deserialize, Debug)]
pub struct BlocksConfig {
    pub blocks: Vec<BlockDef>,
    // Name of the block returned for lookups that miss; falls back to `air`.
    #[serde(default)]
    pub unknown_block: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct BlockDef {
    pub name: String,
    #[serde(default)]
    pub id: Option<u16>,
}
