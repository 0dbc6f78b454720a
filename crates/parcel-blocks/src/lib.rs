//! Block state, biome, and tile types; patterns; block registry.
#![forbid(unsafe_code)]

pub mod config;
pub mod pattern;
pub mod registry;
pub mod types;

pub use pattern::{FnPattern, NoisePattern, Pattern};
pub use registry::BlockRegistry;
pub use types::{BaseBlock, Biome, BlockId, BlockState, CompoundTag, StateBits, Tag};
