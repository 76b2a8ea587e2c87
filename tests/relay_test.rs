//! End-to-end tests for the websocket relay and the relay client.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crdt_seq::Peer;
use crdt_seq::server::{Relay, serve};

async fn start_relay() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(listener, Relay::new(64)));
    format!("ws://{addr}/api/ws")
}

async fn wait_for(peer: &Peer, expected_len: usize) -> String {
    timeout(Duration::from_secs(5), async {
        loop {
            let text = peer.text();
            if text.chars().count() == expected_len {
                return text;
            }
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("replica did not converge in time")
}

#[tokio::test]
async fn test_relay_forwards_to_others_only() {
    let url = start_relay().await;
    let (mut first, _) = connect_async(&url).await.unwrap();
    let (mut second, _) = connect_async(&url).await.unwrap();

    let frame = r#"{"type":"DELETE","data":{"id":"a:0"}}"#;
    first.send(Message::Text(frame.to_string())).await.unwrap();

    let received = timeout(Duration::from_secs(5), second.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(received, Message::Text(frame.to_string()));

    // No echo back to the sender
    assert!(timeout(Duration::from_millis(200), first.next()).await.is_err());
}

#[tokio::test]
async fn test_relay_forwards_frames_in_sender_order() {
    let url = start_relay().await;
    let (mut sender, _) = connect_async(&url).await.unwrap();
    let (mut receiver, _) = connect_async(&url).await.unwrap();

    for i in 0..10 {
        sender.send(Message::Text(format!("frame-{i}"))).await.unwrap();
    }

    for i in 0..10 {
        let msg = timeout(Duration::from_secs(5), receiver.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(msg, Message::Text(format!("frame-{i}")));
    }
}

#[tokio::test]
async fn test_peers_converge_through_relay() {
    let url = start_relay().await;
    let alice = Peer::connect(&url, "alice").await.unwrap();
    let bob = Peer::connect(&url, "bob").await.unwrap();

    alice.insert(0, "a").unwrap();
    alice.insert(1, "b").unwrap();
    bob.insert(0, "c").unwrap();
    bob.insert(1, "d").unwrap();

    let text_a = wait_for(&alice, 4).await;
    let text_b = wait_for(&bob, 4).await;
    assert_eq!(text_a, text_b);

    // Bob may have seen Alice's edits before typing, so only the content is fixed
    let mut chars: Vec<char> = text_a.chars().collect();
    chars.sort_unstable();
    assert_eq!(chars, vec!['a', 'b', 'c', 'd']);
    assert!(text_a.find('a') < text_a.find('b'));
    assert!(text_a.find('c') < text_a.find('d'));

    bob.delete(0).unwrap();
    let text_a = wait_for(&alice, 3).await;
    assert_eq!(text_a, bob.text());
    assert_eq!(text_a, &text_b[text_b.chars().next().unwrap().len_utf8()..]);
}
