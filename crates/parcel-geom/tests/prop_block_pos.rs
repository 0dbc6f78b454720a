use parcel_geom::{BlockPos, BlockRegion, CHUNK_WIDTH};
use proptest::prelude::*;

fn coord() -> impl Strategy<Value = i32> {
    -1_000_000i32..=1_000_000
}

fn arb_pos() -> impl Strategy<Value = BlockPos> {
    (coord(), -64i32..=320, coord()).prop_map(|(x, y, z)| BlockPos::new(x, y, z))
}

proptest! {
    // Local reduction always lands in 0..16 and agrees with rem_euclid
    #[test]
    fn local_is_rem_euclid(p in arb_pos()) {
        prop_assert!((0..CHUNK_WIDTH).contains(&p.local_x()));
        prop_assert!((0..CHUNK_WIDTH).contains(&p.local_z()));
        prop_assert_eq!(p.local_x(), p.x.rem_euclid(CHUNK_WIDTH));
        prop_assert_eq!(p.local_z(), p.z.rem_euclid(CHUNK_WIDTH));
    }

    // Chunk of a block agrees with div_euclid
    #[test]
    fn chunk_is_div_euclid(p in arb_pos()) {
        let c = p.chunk();
        prop_assert_eq!(c.cx, p.x.div_euclid(CHUNK_WIDTH));
        prop_assert_eq!(c.cz, p.z.div_euclid(CHUNK_WIDTH));
    }

    // Every block of a region lies in exactly one listed chunk, and each clip is non-empty
    #[test]
    fn region_chunks_partition_region(a in arb_pos(), dx in 0i32..40, dz in 0i32..40) {
        let r = BlockRegion::new(a, a.add_xyz(dx, 0, dz));
        let chunks = r.chunks();
        let mut total = 0i64;
        for c in &chunks {
            let clip = r.clip_to_chunk(*c);
            prop_assert!(clip.is_some());
            let clip = clip.unwrap();
            total += i64::from(clip.width()) * i64::from(clip.length());
        }
        prop_assert_eq!(total, i64::from(r.width()) * i64::from(r.length()));
    }
}
