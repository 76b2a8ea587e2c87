//! Simple standalone example of replicated sequence usage.
//!
//! Two users edit their own replica of a document, then exchange the
//! operations their edits produced and end up with the same text.
//!
//! Run with: cargo run --example simple

use std::sync::mpsc;

use crdt_seq::{DocumentConfig, Operation};

fn main() {
    println!("=== Simple Replicated Sequence Example ===\n");

    // Each replica sends its local operations to an outbox, like a socket would
    let (alice_tx, alice_outbox) = mpsc::channel::<Operation>();
    let (bob_tx, bob_outbox) = mpsc::channel::<Operation>();

    let mut alice = DocumentConfig::new("alice")
        .on_local_change(move |text, op| {
            println!("  [alice] {} -> '{}'", op.id(), text.text());
            let _ = alice_tx.send(op.clone());
        })
        .build()
        .unwrap();
    let mut bob = DocumentConfig::new("bob")
        .on_local_change(move |text, op| {
            println!("  [bob]   {} -> '{}'", op.id(), text.text());
            let _ = bob_tx.send(op.clone());
        })
        .build()
        .unwrap();

    println!("Alice types 'Hello':");
    for (i, ch) in "Hello".chars().enumerate() {
        alice.insert(i, ch.to_string()).unwrap();
    }

    println!("\nBob concurrently types 'World!':");
    for (i, ch) in "World!".chars().enumerate() {
        bob.insert(i, ch.to_string()).unwrap();
    }

    println!("\n--- Before Synchronization ---");
    println!("  Alice sees: '{}'", alice.text());
    println!("  Bob sees:   '{}'", bob.text());

    println!("\n--- Synchronizing Changes ---");
    for op in bob_outbox.try_iter() {
        alice.apply(op);
    }
    for op in alice_outbox.try_iter() {
        bob.apply(op);
    }

    println!("  Alice sees: '{}'", alice.text());
    println!("  Bob sees:   '{}'", bob.text());

    if alice.text() == bob.text() {
        println!("\n✓ SUCCESS: Both users converged to the same document!");
    } else {
        println!("\n✗ ERROR: Documents did not converge!");
    }

    println!("\n--- Technical Details ---");
    println!("Siblings are ordered by site name, then by clock:");
    print!("{}", alice.dump_tree());

    println!("\n=== Deletion Example ===");
    let len = alice.len();
    println!("Alice deletes the last character");
    alice.delete(len - 1).unwrap();

    // Deletes travel as JSON on the wire
    for op in alice_outbox.try_iter() {
        let json = op.to_json().unwrap();
        println!("  wire: {json}");
        bob.apply_json(&json);
    }

    println!("  Alice sees: '{}'", alice.text());
    println!("  Bob sees:   '{}'", bob.text());
    println!(
        "  Tombstones kept: {}",
        alice.node_count() - 1 - alice.len()
    );

    println!("\n=== Example Complete ===");
}
