use boards_core::{
    BlockId, BlockPatch, BlockPatchBatch, QueryBlockHistoryOptions, QuerySubtreeOptions, UserId,
    block::{TYPE_CARD, TYPE_TEXT},
};
use boards_engine::EngineError;
use boards_harness::{TestBoard, block, fixture::START_MILLIS};
use boards_storage::BlockStore;
use std::collections::BTreeSet;

// ============================================================================
// Undelete
// ============================================================================

#[test]
fn undelete_restores_with_original_provenance() -> Result<(), Box<dyn std::error::Error>> {
    let mut tb = TestBoard::new()?;
    let mut card = block(&tb.board_id, "card-a", "", "", TYPE_CARD);
    card.fields.insert("icon".into(), serde_json::json!("📌"));
    tb.insert(&card)?;
    tb.tick();
    let user = tb.user_id.clone();
    tb.storage_mut().delete_block(&"card-a".into(), &user)?;

    let restorer = UserId::from("user-2");
    let now = tb.tick();
    let restored = tb.engine.undelete_block(&"card-a".into(), &restorer)?;

    assert_eq!(restored.created_by, tb.user_id);
    assert_eq!(restored.create_at, START_MILLIS + 1);
    assert_eq!(restored.modified_by, restorer);
    assert_eq!(restored.update_at, now);
    assert_eq!(restored.delete_at, 0);

    let live = tb.storage().get_block(&"card-a".into())?.ok_or("missing")?;
    assert_eq!(live.fields.get("icon"), Some(&serde_json::json!("📌")));
    assert_eq!(live.created_by, tb.user_id);

    let history = tb
        .storage()
        .get_block_history(&"card-a".into(), QueryBlockHistoryOptions::default())?;
    assert_eq!(history.len(), 3);
    assert!(history[1].is_deleted());
    assert!(!history[2].is_deleted());
    Ok(())
}

#[test]
fn undelete_rejects_live_and_unknown_blocks() -> Result<(), Box<dyn std::error::Error>> {
    let mut tb = TestBoard::new()?;
    tb.add_card("card-a")?;
    let user = tb.user_id.clone();

    let err = tb.engine.undelete_block(&"card-a".into(), &user).unwrap_err();
    assert!(matches!(err, EngineError::BlockStillLive(_)));
    assert_eq!(tb.history_len("card-a")?, 1);

    let err = tb.engine.undelete_block(&"ghost".into(), &user).unwrap_err();
    assert!(matches!(err, EngineError::NothingToUndelete(_)));
    assert!(err.is_not_found());
    Ok(())
}

// ============================================================================
// Atomic batches
// ============================================================================

#[test]
fn atomic_upsert_writes_nothing_on_failure() -> Result<(), Box<dyn std::error::Error>> {
    let mut tb = TestBoard::new()?;
    let mut bad = block(&tb.board_id, "card-b", "", "", TYPE_CARD);
    bad.root_id = BlockId::empty();
    let batch = vec![block(&tb.board_id, "card-a", "", "", TYPE_CARD), bad];
    let user = tb.user_id.clone();

    let err = tb.engine.upsert_blocks_atomic(&batch, &user).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Storage(boards_storage::StorageError::RootIdMissing)
    ));
    assert!(tb.storage().get_block(&"card-a".into())?.is_none());
    assert_eq!(tb.history_len("card-a")?, 0);

    let written = tb.engine.upsert_blocks_atomic(&batch[..1], &user)?;
    assert_eq!(written.len(), 1);
    assert!(tb.storage().get_block(&"card-a".into())?.is_some());
    Ok(())
}

#[test]
fn atomic_patch_writes_nothing_on_failure() -> Result<(), Box<dyn std::error::Error>> {
    let mut tb = TestBoard::new()?;
    tb.add_card("card-a")?;
    let rename = BlockPatch {
        title: Some("renamed".into()),
        ..Default::default()
    };
    let batch = BlockPatchBatch {
        block_ids: vec!["card-a".into(), "ghost".into()],
        block_patches: vec![rename.clone(), rename],
    };
    let user = tb.user_id.clone();

    let err = tb.engine.patch_blocks_atomic(&batch, &user).unwrap_err();
    assert!(err.is_not_found());
    let live = tb.storage().get_block(&"card-a".into())?.ok_or("missing")?;
    assert_eq!(live.title, "card card-a");
    assert_eq!(tb.history_len("card-a")?, 1);
    Ok(())
}

// ============================================================================
// Duplicate card
// ============================================================================

#[test]
fn duplicate_card_copies_children_under_fresh_ids() -> Result<(), Box<dyn std::error::Error>> {
    let mut tb = TestBoard::new()?;
    let card = tb.add_card("card-src")?;
    tb.add_child(&card, "text-first", TYPE_TEXT)?;
    tb.add_child(&card, "text-second", TYPE_TEXT)?;
    tb.set_content_order("card-src", &["text-first", "text-second"])?;

    let board_id = tb.board_id.clone();
    let user = UserId::from("user-2");
    let copy_id = tb
        .engine
        .duplicate_card(&board_id, &"card-src".into(), &user)?;
    assert_ne!(copy_id.as_str(), "card-src");

    let copy = tb
        .storage()
        .get_subtree2(&board_id, &copy_id, QuerySubtreeOptions::default())?;
    assert_eq!(copy.len(), 3);
    let copy_card = copy.iter().find(|b| b.id == copy_id).ok_or("no copy")?;
    assert_eq!(copy_card.title, "card card-src");
    assert_eq!(copy_card.created_by, user);

    let children: Vec<_> = copy.iter().filter(|b| b.id != copy_id).collect();
    assert!(children.iter().all(|b| b.parent_id == copy_id && b.root_id == copy_id));
    let child_ids: BTreeSet<BlockId> = children.iter().map(|b| b.id.clone()).collect();
    assert!(!child_ids.contains(&BlockId::from("text-first")));

    let order = copy_card.content_order();
    assert_eq!(order.len(), 2);
    assert_eq!(order.into_iter().collect::<BTreeSet<_>>(), child_ids);
    let first = children
        .iter()
        .find(|b| b.title == "text text-first")
        .ok_or("no first child")?;
    assert_eq!(copy_card.content_order()[0], first.id);

    let original = tb.storage().get_subtree2(
        &board_id,
        &"card-src".into(),
        QuerySubtreeOptions::default(),
    )?;
    assert_eq!(original.len(), 3);
    Ok(())
}

#[test]
fn duplicate_of_missing_card_is_not_found() -> Result<(), Box<dyn std::error::Error>> {
    let mut tb = TestBoard::new()?;
    let board_id = tb.board_id.clone();
    let user = tb.user_id.clone();
    let err = tb
        .engine
        .duplicate_card(&board_id, &"ghost".into(), &user)
        .unwrap_err();
    assert!(err.is_not_found());
    Ok(())
}

// ============================================================================
// Id regeneration
// ============================================================================

#[test]
fn regenerated_tree_has_no_old_ids_left() -> Result<(), Box<dyn std::error::Error>> {
    let mut tb = TestBoard::new()?;
    let card = tb.add_card("card-import")?;
    tb.add_child(&card, "text-import-one", TYPE_TEXT)?;
    tb.add_child(&card, "text-import-two", TYPE_TEXT)?;
    tb.set_content_order("card-import", &["text-import-one", "text-import-two"])?;

    let board_id = tb.board_id.clone();
    let ids = tb
        .engine
        .regenerate_tree_ids(&board_id, &"card-import".into())?;
    assert_eq!(ids.len(), 3);

    for old in ["card-import", "text-import-one", "text-import-two"] {
        for table in ["blocks", "blocks_history"] {
            for column in ["id", "parent_id", "root_id"] {
                assert_eq!(tb.count_where(table, column, old)?, 0, "{table}.{column} {old}");
            }
        }
    }

    let new_root = ids
        .get(&BlockId::from("card-import"))
        .ok_or("root not renamed")?;
    let tree = tb.storage().get_blocks_with_root_id(&board_id, new_root)?;
    assert_eq!(tree.len(), 3);

    let new_card = tb.storage().get_block(new_root)?.ok_or("missing")?;
    let expected: Vec<BlockId> = ["text-import-one", "text-import-two"]
        .iter()
        .map(|old| ids.get(&BlockId::from(*old)).cloned().ok_or("child not renamed"))
        .collect::<Result<_, _>>()?;
    assert_eq!(new_card.content_order(), expected);
    Ok(())
}

#[test]
fn regeneration_survives_short_ids() -> Result<(), Box<dyn std::error::Error>> {
    let mut tb = TestBoard::new()?;
    let card = tb.add_card("c")?;
    let children: Vec<String> = (1..=9).map(|n| n.to_string()).collect();
    for child in &children {
        tb.add_child(&card, child, TYPE_TEXT)?;
    }
    let order: Vec<&str> = children.iter().map(String::as_str).collect();
    tb.set_content_order("c", &order)?;

    let board_id = tb.board_id.clone();
    let ids = tb.engine.regenerate_tree_ids(&board_id, &"c".into())?;
    assert_eq!(ids.len(), 10);

    let expected: Vec<BlockId> = children
        .iter()
        .map(|old| ids.get(&BlockId::from(old.as_str())).cloned().ok_or("child not renamed"))
        .collect::<Result<_, _>>()?;
    let new_card_id = ids.get(&BlockId::from("c")).ok_or("card not renamed")?;
    let new_card = tb.storage().get_block(new_card_id)?.ok_or("missing")?;
    assert_eq!(new_card.content_order(), expected);

    let expected_json = serde_json::to_value(&expected)?;
    let history = tb.raw_fields("blocks_history", new_card_id.as_str())?;
    assert_eq!(history.len(), 2);
    let orders: Vec<&serde_json::Value> =
        history.iter().filter_map(|f| f.get("contentOrder")).collect();
    assert_eq!(orders, vec![&expected_json]);
    Ok(())
}

#[test]
fn regeneration_keeps_prefix_ids_apart() -> Result<(), Box<dyn std::error::Error>> {
    let mut tb = TestBoard::new()?;
    let card = tb.add_card("c")?;
    for id in ["c1", "c10", "c100"] {
        tb.add_child(&card, id, TYPE_TEXT)?;
    }
    let mut card = tb.storage().get_block(&"c".into())?.ok_or("missing")?;
    card.fields.insert("contentOrder".into(), serde_json::json!([["c1", "c10"], "c100"]));
    tb.insert(&card)?;

    let board_id = tb.board_id.clone();
    let ids = tb.engine.regenerate_tree_ids(&board_id, &"c".into())?;
    let new_id = |old: &str| -> Result<String, &'static str> {
        ids.get(&BlockId::from(old)).map(|id| id.to_string()).ok_or("not renamed")
    };

    let new_card_id = ids.get(&BlockId::from("c")).ok_or("card not renamed")?;
    let new_card = tb.storage().get_block(new_card_id)?.ok_or("missing")?;
    assert_eq!(
        new_card.fields.get("contentOrder"),
        Some(&serde_json::json!([[new_id("c1")?, new_id("c10")?], new_id("c100")?]))
    );
    for old in ["c", "c1", "c10", "c100"] {
        assert_eq!(tb.count_where("blocks", "parent_id", old)?, 0);
        assert_eq!(tb.count_where("blocks_history", "id", old)?, 0);
    }
    assert_eq!(tb.storage().get_blocks_with_parent(&board_id, new_card_id)?.len(), 3);
    Ok(())
}
