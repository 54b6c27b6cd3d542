use std::collections::BTreeMap;

use boards_core::block::{CONTENT_ORDER_FIELD, remap_content_order};
use boards_core::{Block, BlockId};

fn remap_id(id: &BlockId, ids: &BTreeMap<BlockId, BlockId>) -> BlockId {
    ids.get(id).cloned().unwrap_or_else(|| id.clone())
}

/// Copy of `block` with every id found in `ids` replaced, including those
/// in `contentOrder`. Ids outside the map are kept.
pub fn remap_block(block: &Block, ids: &BTreeMap<BlockId, BlockId>) -> Block {
    let mut copy = block.clone();
    copy.id = remap_id(&block.id, ids);
    copy.parent_id = remap_id(&block.parent_id, ids);
    copy.root_id = remap_id(&block.root_id, ids);
    copy.insert_at = String::new();
    if let Some(order) = block.fields.get(CONTENT_ORDER_FIELD) {
        copy.fields
            .insert(CONTENT_ORDER_FIELD.to_string(), remap_content_order(order, ids));
    }
    copy
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn remaps_links_and_nested_content_order() {
        let ids: BTreeMap<BlockId, BlockId> = [("card", "card2"), ("t1", "t1b"), ("t2", "t2b")]
            .into_iter()
            .map(|(a, b)| (BlockId::from(a), BlockId::from(b)))
            .collect();
        let mut card = Block {
            id: "card".into(),
            parent_id: "board-root".into(),
            root_id: "card".into(),
            board_id: "board".into(),
            block_type: "card".into(),
            ..Default::default()
        };
        card.fields
            .insert(CONTENT_ORDER_FIELD.into(), json!(["t1", ["t2", "other"]]));

        let copy = remap_block(&card, &ids);
        assert_eq!(copy.id.as_str(), "card2");
        assert_eq!(copy.root_id.as_str(), "card2");
        assert_eq!(copy.parent_id.as_str(), "board-root");
        assert_eq!(
            copy.fields.get(CONTENT_ORDER_FIELD),
            Some(&json!(["t1b", ["t2b", "other"]]))
        );
    }
}
