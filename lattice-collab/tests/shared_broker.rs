//! Concurrent drivers against the lock-protected broker.

use futures_util::future::join_all;

use lattice_collab::{Broker, ConnectOutcome, SharedBroker, TextDocument};

fn push(text: String) -> impl FnOnce(&mut TextDocument) -> Vec<u8> {
    move |doc: &mut TextDocument| doc.edit(|e| e.push(&text))
}

async fn shared_with(peers: &[&str]) -> SharedBroker {
    let shared = SharedBroker::new(Broker::new());
    for id in peers {
        shared.register_peer(*id).await.unwrap();
    }
    shared
}

#[tokio::test]
async fn test_concurrent_edits_converge() {
    let _ = env_logger::builder().is_test(true).try_init();
    let ids = ["peer0", "peer1", "peer2", "peer3"];
    let shared = shared_with(&ids).await;

    for outcome in join_all(ids.iter().map(|id| shared.connect(*id))).await {
        outcome.unwrap();
    }

    let edits = ids.iter().enumerate().map(|(i, id)| {
        let handle = shared.clone();
        async move {
            for n in 0..10 {
                handle
                    .apply_local_edit(*id, push(format!("{i}{n}")))
                    .await
                    .unwrap();
            }
        }
    });
    join_all(edits).await;

    let reference = shared.snapshot("peer0").await.unwrap();
    assert_eq!(reference.content.len(), 4 * 10 * 2);
    for id in ids {
        assert_eq!(shared.snapshot(id).await.unwrap(), reference);
    }
}

#[tokio::test]
async fn test_reconnect_drains_under_concurrent_broadcasts() {
    let _ = env_logger::builder().is_test(true).try_init();
    let shared = shared_with(&["peer0", "peer1"]).await;
    shared.connect("peer1").await.unwrap();

    let writer = {
        let handle = shared.clone();
        async move {
            for n in 0..20 {
                handle
                    .apply_local_edit("peer1", push(format!("{n};")))
                    .await
                    .unwrap();
            }
        }
    };
    let joiner = {
        let handle = shared.clone();
        async move { handle.connect("peer0").await.unwrap() }
    };

    let ((), outcome) = tokio::join!(writer, joiner);
    assert!(matches!(outcome, ConnectOutcome::Connected { .. }));

    assert!(shared.is_connected("peer0").await.unwrap());
    assert_eq!(shared.offline_len("peer0").await.unwrap(), 0);
    assert_eq!(
        shared.snapshot("peer0").await.unwrap(),
        shared.snapshot("peer1").await.unwrap()
    );
}

#[tokio::test]
async fn test_disconnected_peer_accumulates_through_shared_handle() {
    let shared = shared_with(&["peer0", "peer1"]).await;
    shared.connect("peer0").await.unwrap();

    for n in 0..3 {
        let report = shared
            .apply_local_edit("peer0", push(n.to_string()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(report.queued.len(), 1);
    }

    // peer0's connect state plus three deltas
    assert_eq!(shared.offline_len("peer1").await.unwrap(), 4);

    shared.disconnect("peer0").await.unwrap();
    assert!(!shared.is_connected("peer0").await.unwrap());
}
