//! Edge cases integration tests for the replicated sequence.
//!
//! These tests verify the robustness of the merge engine under duplicated,
//! reordered and malformed deliveries, plus boundary conditions of the
//! local editing API.

use crdt_seq::crdt::{DeleteOp, InsertOp};
use crdt_seq::{Document, DocumentError, MergeOutcome, MergeRejection, NodeId, Operation, Side};

fn typed(site: &str, text: &str) -> Document {
    let mut doc = Document::new(site).unwrap();
    for (i, ch) in text.chars().enumerate() {
        doc.insert(i, ch.to_string()).unwrap();
    }
    doc
}

fn remote_insert(id: &str, parent: &str, value: &str, side: Side) -> Operation {
    Operation::Insert(InsertOp {
        id: id.parse().unwrap(),
        parent: Some(parent.parse().unwrap()),
        value: value.to_string(),
        side: Some(side),
    })
}

#[test]
fn test_index_bounds() {
    let mut doc = Document::new("site").unwrap();

    assert!(matches!(
        doc.delete(0),
        Err(DocumentError::IndexOutOfRange { index: 0, len: 0 })
    ));
    assert!(matches!(
        doc.insert(1, "x"),
        Err(DocumentError::IndexOutOfRange { index: 1, len: 0 })
    ));

    doc.insert(0, "x").unwrap();
    doc.insert(1, "y").unwrap();
    assert!(doc.insert(2, "z").is_ok());
    assert!(doc.insert(4, "!").is_err());
    assert!(doc.delete(3).is_err());

    // Failed calls leave no trace
    assert_eq!(doc.text(), "xyz");
    assert_eq!(doc.node_count(), 4);
}

#[test]
fn test_root_is_never_deleted() {
    let mut doc = typed("site", "ab");
    doc.delete(0).unwrap();
    doc.delete(0).unwrap();

    assert!(doc.delete(0).is_err());
    assert!(doc.resolve_index(0).unwrap().is_root());
    assert_eq!(
        doc.apply(Operation::Delete(DeleteOp { id: NodeId::root() })),
        MergeOutcome::Rejected(MergeRejection::RootDelete)
    );

    // Still usable after everything was deleted
    doc.insert(0, "c").unwrap();
    assert_eq!(doc.text(), "c");
}

#[test]
fn test_reapplying_operations_is_idempotent() {
    let mut source = typed("docA", "hello");
    source.delete(1).unwrap();
    let ops = source.operations();

    let mut replica = Document::new("docB").unwrap();
    for op in &ops {
        replica.apply(op.clone());
    }
    let text = replica.text();
    let nodes = replica.node_count();

    for _ in 0..3 {
        for op in &ops {
            assert!(matches!(
                replica.apply(op.clone()),
                MergeOutcome::Duplicate { .. }
            ));
        }
    }

    assert_eq!(replica.text(), text);
    assert_eq!(replica.text(), "hllo");
    assert_eq!(replica.node_count(), nodes);
}

#[test]
fn test_tombstones_are_permanent() {
    let mut source = typed("docA", "ab");
    let insert_ops = source.operations();
    let a = source.delete(0).unwrap();

    let mut replica = Document::new("docB").unwrap();
    for op in source.operations() {
        replica.apply(op);
    }
    assert_eq!(replica.text(), "b");

    // A late duplicate of the original insert must not bring "a" back
    for op in insert_ops {
        replica.apply(op);
    }
    assert_eq!(replica.text(), "b");
    assert!(replica.node(&a).unwrap().is_deleted);
}

#[test]
fn test_numeric_clock_ordering_between_siblings() {
    let mut doc = Document::new("docB").unwrap();

    // Siblings under the root from one site: s:2 must precede s:10
    doc.apply(remote_insert("s:10", "root:0", "ten", Side::Left));
    doc.apply(remote_insert("s:2", "root:0", "two", Side::Left));
    doc.apply(remote_insert("s:1", "root:0", "one", Side::Left));

    assert_eq!(doc.text(), "onetwoten");
}

#[test]
fn test_clocks_past_nine_keep_typing_order() {
    let doc = typed("site", "abcdefghijklmnop");
    let mut replica = Document::new("other").unwrap();

    let mut ops = doc.operations();
    ops.reverse();
    for op in ops {
        replica.apply(op);
    }

    assert_eq!(replica.text(), "abcdefghijklmnop");
}

#[test]
fn test_deferred_chain_released_in_one_step() {
    let mut doc = Document::new("docB").unwrap();

    assert!(matches!(
        doc.apply(remote_insert("a:2", "a:1", "c", Side::Right)),
        MergeOutcome::Deferred { .. }
    ));
    assert!(matches!(
        doc.apply(Operation::Delete(DeleteOp { id: "a:2".parse().unwrap() })),
        MergeOutcome::Deferred { .. }
    ));
    assert!(matches!(
        doc.apply(remote_insert("a:1", "a:0", "b", Side::Right)),
        MergeOutcome::Deferred { .. }
    ));
    assert_eq!(doc.pending_count(), 3);
    assert_eq!(doc.text(), "");

    let outcome = doc.apply(remote_insert("a:0", "root:0", "a", Side::Left));
    assert_eq!(
        outcome,
        MergeOutcome::Inserted {
            id: "a:0".parse().unwrap(),
            replayed: 3
        }
    );
    assert_eq!(doc.text(), "ab");
    assert_eq!(doc.pending_count(), 0);
}

#[test]
fn test_duplicate_deferred_operation_buffered_once() {
    let mut doc = Document::new("docB").unwrap();
    let op = remote_insert("a:1", "a:0", "b", Side::Right);

    doc.apply(op.clone());
    doc.apply(op);
    assert_eq!(doc.pending_count(), 1);
    assert_eq!(doc.missing_ids(), vec!["a:0".parse::<NodeId>().unwrap()]);
}

#[test]
fn test_restarted_replica_does_not_reuse_buffered_ids() {
    let mut original = typed("docA", "ab");
    let history = original.operations();

    // The restarted replica sees its own second insert before the first
    let mut restarted = Document::new("docA").unwrap();
    assert!(matches!(
        restarted.apply(history[1].clone()),
        MergeOutcome::Deferred { .. }
    ));

    let z = restarted.insert(0, "Z").unwrap();
    assert_eq!(z.to_string(), "docA:2");

    assert_eq!(
        restarted.apply(history[0].clone()),
        MergeOutcome::Inserted {
            id: "docA:0".parse().unwrap(),
            replayed: 1
        }
    );
    assert_eq!(restarted.pending_count(), 0);

    for op in restarted.operations() {
        original.apply(op);
    }
    assert_eq!(restarted.text(), original.text());
    assert_eq!(restarted.text(), "abZ");
}

#[test]
fn test_out_of_range_clock_rejected_everywhere() {
    let json = r#"{"type":"INSERT","data":{"id":"docA:18446744073709551615","parent":"root:0","value":"x","side":"L"}}"#;

    let mut own = typed("docA", "a");
    let mut other = typed("docB", "b");
    for doc in [&mut own, &mut other] {
        assert!(matches!(
            doc.apply_json(json),
            MergeOutcome::Rejected(MergeRejection::ClockOutOfRange(_))
        ));
    }

    // The owning site keeps editing normally
    own.insert(1, "c").unwrap();
    assert_eq!(own.text(), "ac");
    assert_eq!(other.text(), "b");
}

#[test]
fn test_empty_remote_value_rejected_everywhere() {
    let mut doc = typed("docB", "ok");
    let outcome = doc.apply(remote_insert("docA:0", "root:0", "", Side::Left));

    assert!(matches!(
        outcome,
        MergeOutcome::Rejected(MergeRejection::EmptyValue(_))
    ));
    assert_eq!(doc.len(), 2);

    // Indices still address visible fragments only
    doc.insert(0, "!").unwrap();
    assert_eq!(doc.text(), "!ok");
}

#[test]
fn test_malformed_json_does_not_abort() {
    let mut doc = typed("docB", "ok");

    for json in ["", "{}", "[1,2]", r#"{"type":"INSERT"}"#, r#"{"type":"DELETE","data":{"id":7}}"#] {
        assert!(matches!(
            doc.apply_json(json),
            MergeOutcome::Rejected(MergeRejection::Malformed(_))
        ));
    }

    assert!(
        doc.apply_json(r#"{"type":"INSERT","data":{"id":"docA:0","parent":"root:0","value":"!","side":"L"}}"#)
            .is_applied()
    );
    // "docA" sorts before "docB" among the root's left children
    assert_eq!(doc.text(), "!ok");
}

#[test]
fn test_unicode_fragments() {
    let mut doc = Document::new("site").unwrap();
    for (i, ch) in ["🦀", "∂", "中", "😀"].into_iter().enumerate() {
        doc.insert(i, ch).unwrap();
    }

    assert_eq!(doc.text(), "🦀∂中😀");
    assert_eq!(doc.len(), 4);

    doc.delete(1).unwrap();
    assert_eq!(doc.text(), "🦀中😀");
}

#[test]
fn test_pasted_run_is_addressed_as_a_whole() {
    let mut doc = typed("site", "ab");
    doc.insert(1, "PASTE").unwrap();

    assert_eq!(doc.text(), "aPASTEb");
    assert_eq!(doc.len(), 3);

    // Index 2 is "b", the fragment after the pasted run
    doc.insert(2, "-").unwrap();
    assert_eq!(doc.text(), "aPASTE-b");
}

#[test]
fn test_long_sequential_typing() {
    let size = 2_000usize;
    let mut doc = Document::new("site").unwrap();
    for i in 0..size {
        let ch = char::from(b'a' + (i % 26) as u8);
        doc.insert(i, ch.to_string()).unwrap();
    }

    assert_eq!(doc.len(), size);
    assert_eq!(doc.text().len(), size);

    // Delete every other character from the front
    for i in 0..size / 2 {
        doc.delete(i).unwrap();
    }
    assert_eq!(doc.len(), size / 2);
    assert_eq!(doc.node_count(), size + 1);
}
