use parcel_blocks::registry::BlockRegistry;
use parcel_blocks::types::{BaseBlock, BlockState, CompoundTag, Tag};

#[test]
fn defaults_start_with_air() {
    let reg = BlockRegistry::with_defaults();
    assert_eq!(reg.id_by_name("air"), Some(0));
    let stone = reg.state_by_name("stone").unwrap();
    assert_eq!(reg.name_of(stone), Some("stone"));
    let chest = reg.id_by_name("chest").unwrap();
    assert_eq!(reg.get(chest).unwrap().name, "chest");
}

#[test]
fn loads_dense_ids_from_toml() {
    let reg = BlockRegistry::from_toml_str(
        r#"
        unknown_block = "marker"

        [[blocks]]
        name = "air"

        [[blocks]]
        name = "stone"

        [[blocks]]
        name = "marker"
        id = 2
    "#,
    )
    .expect("registry");
    assert_eq!(reg.blocks.len(), 3);
    assert_eq!(reg.name_of(BlockState::new(1, 0)), Some("stone"));
    assert_eq!(reg.unknown_block_id, Some(2));
    assert_eq!(reg.state_or_unknown("nope"), BlockState::new(2, 0));
}

#[test]
fn rejects_sparse_ids() {
    let err = BlockRegistry::from_toml_str(
        r#"
        [[blocks]]
        name = "air"

        [[blocks]]
        name = "stone"
        id = 5
    "#,
    );
    assert!(err.is_err());
}

#[test]
fn rejects_missing_air_and_duplicates() {
    assert!(BlockRegistry::from_toml_str("[[blocks]]\nname = \"stone\"\n").is_err());
    assert!(
        BlockRegistry::from_toml_str("[[blocks]]\nname = \"air\"\n[[blocks]]\nname = \"air\"\n")
            .is_err()
    );
}

#[test]
fn base_block_drops_nbt_on_normalize() {
    let mut tag = CompoundTag::new();
    tag.insert("Lock", Tag::String("key".into()));
    let chest = BlockState::new(9, 2);
    let raw = BaseBlock::with_nbt(chest, tag);
    assert!(raw.has_nbt());
    assert_eq!(raw.to_immutable_state(), chest);
}

#[test]
fn unresolved_unknown_block_falls_back_to_air() {
    let reg = BlockRegistry::from_toml_str(
        r#"
        unknown_block = "missing"

        [[blocks]]
        name = "air"
    "#,
    )
    .unwrap();
    assert_eq!(reg.unknown_block_id, None);
}
