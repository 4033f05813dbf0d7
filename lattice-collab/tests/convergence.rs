//! Convergence and offline-accumulation properties.
//!
//! Random connect/disconnect/edit schedules must always end with every
//! replica showing the same document once all peers are back online.

use proptest::prelude::*;

use lattice_collab::{Broker, Harness, PeerId, SimConfig, Step, TextDocument};

fn step(peer_count: usize) -> impl Strategy<Value = Step> {
    prop_oneof![
        (0..peer_count).prop_map(Step::Connect),
        (0..peer_count).prop_map(Step::Disconnect),
        (0..peer_count, 0u32..12, "[a-zé日🦀]{1,4}")
            .prop_map(|(peer, index, text)| Step::Insert { peer, index, text }),
        (0..peer_count, 0u32..12, 1u32..4)
            .prop_map(|(peer, index, len)| Step::Remove { peer, index, len }),
    ]
}

fn schedule() -> impl Strategy<Value = (usize, Vec<Step>)> {
    (2usize..5).prop_flat_map(|peer_count| {
        (
            Just(peer_count),
            prop::collection::vec(step(peer_count), 0..40),
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_schedules_converge((peer_count, steps) in schedule()) {
        let mut h: Harness = Harness::new(SimConfig {
            peer_count,
            ..SimConfig::default()
        }).unwrap();

        h.run(&steps).unwrap();
        h.connect_all().unwrap();

        prop_assert!(h.converged(), "diverged after {:?}", steps);
        for index in 0..peer_count {
            prop_assert!(h.broker().peer(h.id(index).unwrap()).unwrap().offline_queue().is_empty());
        }
    }

    #[test]
    fn offline_queue_holds_every_foreign_broadcast(texts in prop::collection::vec("[a-z]{1,6}", 1..20)) {
        let mut broker: Broker = Broker::new();
        for id in ["peer0", "peer1", "peer2"] {
            broker.register_peer(id).unwrap();
        }
        broker.connect("peer1").unwrap();
        broker.connect("peer2").unwrap();
        let baseline = broker.peer("peer0").unwrap().offline_queue().len();
        prop_assert_eq!(baseline, 2);

        let mut sent = Vec::new();
        for (i, text) in texts.iter().enumerate() {
            let sender = if i % 2 == 0 { "peer1" } else { "peer2" };
            let mut source = TextDocument::new(100 + i as u64);
            let update = source.edit(|e| e.push(text));
            broker.broadcast(sender, &update).unwrap();
            sent.push(update);
        }

        let queue = broker.peer("peer0").unwrap().offline_queue();
        prop_assert_eq!(queue.len(), baseline + texts.len());
        prop_assert_eq!(&queue.updates()[baseline..], &sent[..]);
        prop_assert_eq!(broker.peer("peer0").unwrap().document_snapshot().content, "");
    }
}

#[test]
fn test_all_connected_peers_stay_in_lockstep() {
    let mut h: Harness = Harness::new(SimConfig {
        peer_count: 5,
        start_connected: true,
        ..SimConfig::default()
    })
    .unwrap();

    for round in 0..20usize {
        let writer = round % 5;
        h.edit(writer, |e| e.insert(0, "w")).unwrap();
        h.assert_converged().unwrap();
    }
    assert_eq!(h.content(3).unwrap(), "w".repeat(20));
}

#[test]
fn test_all_offline_edits_converge_after_reconnect() {
    let mut h: Harness = Harness::new(SimConfig {
        peer_count: 3,
        id_prefix: "node".to_string(),
        ..SimConfig::default()
    })
    .unwrap();

    h.edit(0, |e| e.push("alpha")).unwrap();
    h.edit(1, |e| e.push("beta")).unwrap();
    h.edit(2, |e| e.push("gamma")).unwrap();
    assert!(!h.converged());

    h.connect_all().unwrap();
    h.assert_converged().unwrap();

    let content = h.content(0).unwrap();
    for word in ["alpha", "beta", "gamma"] {
        assert!(content.contains(word), "missing {word} in {content:?}");
    }
    assert_eq!(h.id(2).unwrap(), &PeerId::from("node2"));
}
