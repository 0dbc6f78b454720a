//! Position-dependent block sources used to paint regions.

use fastnoise_lite::{FastNoiseLite, NoiseType};
use parcel_geom::BlockPos;

use crate::types::{BaseBlock, BlockState};

/// Computes the block for an absolute world position.
pub trait Pattern {
    fn apply_block(&self, pos: BlockPos) -> BaseBlock;
}

impl Pattern for BlockState {
    #[inline]
    fn apply_block(&self, _pos: BlockPos) -> BaseBlock {
        BaseBlock::new(*self)
    }
}

impl Pattern for BaseBlock {
    #[inline]
    fn apply_block(&self, _pos: BlockPos) -> BaseBlock {
        self.clone()
    }
}

/// Adapts a closure into a pattern.
pub struct FnPattern<F>(pub F);

impl<F> Pattern for FnPattern<F>
where
    F: Fn(BlockPos) -> BaseBlock,
{
    #[inline]
    fn apply_block(&self, pos: BlockPos) -> BaseBlock {
        (self.0)(pos)
    }
}

/// Two-block mix driven by seeded 3D noise: `accent` where the noise exceeds
/// `threshold`, `base` elsewhere.
pub struct NoisePattern {
    noise: FastNoiseLite,
    base: BlockState,
    accent: BlockState,
    threshold: f32,
}

impl NoisePattern {
    pub fn new(seed: i32, frequency: f32, base: BlockState, accent: BlockState, threshold: f32) -> Self {
        let mut noise = FastNoiseLite::with_seed(seed);
        noise.set_noise_type(Some(NoiseType::OpenSimplex2));
        noise.set_frequency(Some(frequency));
        Self {
            noise,
            base,
            accent,
            threshold,
        }
    }

    #[inline]
    pub fn sample(&self, pos: BlockPos) -> f32 {
        self.noise
            .get_noise_3d(pos.x as f32, pos.y as f32, pos.z as f32)
    }
}

impl Pattern for NoisePattern {
    fn apply_block(&self, pos: BlockPos) -> BaseBlock {
        if self.sample(pos) > self.threshold {
            BaseBlock::new(self.accent)
        } else {
            BaseBlock::new(self.base)
        }
    }
}
