use parcel_blocks::{BlockState, NoisePattern, Pattern};
use parcel_geom::BlockPos;
use proptest::prelude::*;

fn arb_pos() -> impl Strategy<Value = BlockPos> {
    (-100_000i32..=100_000, -64i32..=320, -100_000i32..=100_000)
        .prop_map(|(x, y, z)| BlockPos::new(x, y, z))
}

proptest! {
    // A constant state paints the same value everywhere
    #[test]
    fn constant_pattern_ignores_position(id in 0u16..512, bits in any::<u16>(), p in arb_pos()) {
        let s = BlockState::new(id, bits);
        prop_assert_eq!(s.apply_block(p).to_immutable_state(), s);
    }

    // Noise mix only ever yields one of its two inputs
    #[test]
    fn noise_pattern_yields_base_or_accent(seed in any::<i32>(), t in -1.0f32..1.0, p in arb_pos()) {
        let base = BlockState::new(1, 0);
        let accent = BlockState::new(2, 0);
        let pat = NoisePattern::new(seed, 0.05, base, accent, t);
        let got = pat.apply_block(p).to_immutable_state();
        prop_assert!(got == base || got == accent);
        prop_assert_eq!(got == accent, pat.sample(p) > t);
    }
}
