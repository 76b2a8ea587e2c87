//! Concurrent editing example.
//!
//! This example showcases:
//! - A shared document edited from several threads
//! - Many replicas merging each other's history in scrambled order
//! - Two peers converging through the websocket relay
//!
//! Run with: cargo run --example concurrent_editing

use std::thread;
use std::time::{Duration, Instant};

use crdt_seq::server::{Relay, serve};
use crdt_seq::{Document, Operation, Peer};

#[tokio::main]
async fn main() {
    println!("=== Concurrent Editing Example ===\n");

    shared_document_demo();
    println!();

    scrambled_delivery_demo();
    println!();

    relay_demo().await;
}

/// Several threads type into one document behind a lock
fn shared_document_demo() {
    println!("--- Shared Document ---");

    let num_threads = 4;
    let operations_per_thread = 100;
    let doc = Document::new("shared").unwrap().into_shared();

    let start_time = Instant::now();
    let handles: Vec<_> = (0..num_threads)
        .map(|thread_id| {
            let doc = doc.clone();
            thread::spawn(move || {
                for i in 0..operations_per_thread {
                    let mut doc = doc.lock();
                    let index = (thread_id * 7 + i) % (doc.len() + 1);
                    let ch = char::from(b'A' + (thread_id * 4 + i % 26) as u8 % 26);
                    doc.insert(index, ch.to_string()).unwrap();

                    if i % 10 == 9 {
                        let len = doc.len();
                        doc.delete(i % len).unwrap();
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let doc = doc.lock();
    println!("Completed in {:?}", start_time.elapsed());
    println!("Visible fragments: {}", doc.len());
    println!("Total nodes (including tombstones and root): {}", doc.node_count());
}

/// Replicas edit independently, then receive the others' operations reversed
fn scrambled_delivery_demo() {
    println!("--- Scrambled Delivery ---");

    let num_replicas = 8;
    let operations_per_replica = 200;

    let start_time = Instant::now();
    let handles: Vec<_> = (0..num_replicas)
        .map(|n| {
            thread::spawn(move || {
                let mut doc = Document::new(format!("replica{n}")).unwrap();
                for i in 0..operations_per_replica {
                    let index = (i * 31 + n) % (doc.len() + 1);
                    doc.insert(index, char::from(b'a' + n as u8).to_string()).unwrap();
                }
                let ops = doc.operations();
                (doc, ops)
            })
        })
        .collect();
    let (mut docs, histories): (Vec<Document>, Vec<Vec<Operation>>) =
        handles.into_iter().map(|h| h.join().unwrap()).unzip();
    println!("Local editing took {:?}", start_time.elapsed());

    let merge_start = Instant::now();
    let mut max_pending = 0;
    for (i, doc) in docs.iter_mut().enumerate() {
        for (j, ops) in histories.iter().enumerate() {
            if i == j {
                continue;
            }
            // Children arrive before their parents and wait in the buffer
            for op in ops.iter().rev() {
                doc.apply(op.clone());
                max_pending = max_pending.max(doc.pending_count());
            }
        }
    }
    println!("Merging took {:?}", merge_start.elapsed());
    println!("Largest pending buffer: {max_pending} operations");

    let first = docs[0].text();
    if docs.iter().all(|doc| doc.text() == first) {
        println!("✓ All {num_replicas} replicas converged ({} fragments)", first.len());
    } else {
        println!("✗ Replicas diverged!");
    }
}

/// Two peers exchange operations through a relay on a local port
async fn relay_demo() {
    println!("--- Relay ---");

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/api/ws", listener.local_addr().unwrap());
    tokio::spawn(serve(listener, Relay::new(64)));

    let alice = Peer::connect(&url, "alice").await.unwrap();
    let bob = Peer::connect(&url, "bob").await.unwrap();

    for (i, ch) in "relay".chars().enumerate() {
        alice.insert(i, ch.to_string()).unwrap();
    }
    bob.insert(0, ">").unwrap();

    for _ in 0..100 {
        if alice.text() == bob.text() && alice.text().len() == 6 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    println!("  Alice sees: '{}'", alice.text());
    println!("  Bob sees:   '{}'", bob.text());
}
