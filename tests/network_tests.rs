//! Network integration tests
//!
//! Real loopback TCP exchanges between nodes: block propagation with the
//! chain-request fallback, transaction broadcast, and the bootstrap host
//! wiring three nodes together.

use peer_ledger::config::{BootstrapEntry, ScheduleSettings};
use peer_ledger::controller::Controller;
use peer_ledger::network::{Bootstrapper, Message, NodeClient, Server};
use peer_ledger::node::PeerNode;
use peer_ledger::view::BufferedView;
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

const DIFFICULTY: usize = 1;

struct TestNode {
    node: Arc<PeerNode>,
    view: Arc<BufferedView>,
    port: u16,
}

impl TestNode {
    fn start(name: &str) -> TestNode {
        let node = Arc::new(PeerNode::with_difficulty(name, DIFFICULTY).unwrap());
        let view = Arc::new(BufferedView::new());
        let server = Server::new(Arc::clone(&node), view.clone()).with_host("127.0.0.1");
        let port = server.spawn("127.0.0.1:0").unwrap().port();
        TestNode { node, view, port }
    }

    fn client(&self) -> NodeClient {
        NodeClient::new("127.0.0.1", self.port)
    }

    fn controller(&self) -> Controller {
        Controller::new(
            Arc::clone(&self.node),
            self.view.clone(),
            ScheduleSettings::default(),
        )
    }
}

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

#[test]
fn test_block_extending_tip_is_accepted() {
    let alice = TestNode::start("alice");
    let bob = TestNode::start("bob");

    let block = bob.node.create_block().unwrap().unwrap();

    assert_eq!(alice.client().send_block(&block).unwrap(), Message::Success);
    assert_eq!(alice.node.get_block_chain(), bob.node.get_block_chain());
    assert!(alice.view.received()[0].contains("RECEIVED NEW BLOCK"));
}

#[test]
fn test_block_ahead_of_tip_triggers_chain_exchange() {
    let alice = TestNode::start("alice");
    let bob = TestNode::start("bob");
    bob.node.add_peer_sender("127.0.0.1", alice.port);

    // Alice never saw the first block, so the second one does not link
    bob.node.create_block().unwrap();
    let second = bob.node.create_block().unwrap().unwrap();
    assert_eq!(
        alice.client().send_block(&second).unwrap(),
        Message::BlockchainRequest
    );
    assert_eq!(alice.node.chain_len(), 0);

    // The broadcast answers the request with the whole chain
    bob.controller().create_block_task().unwrap();

    assert_eq!(alice.node.get_block_chain(), bob.node.get_block_chain());
    assert_eq!(alice.node.get_utxo_set(), bob.node.get_utxo_set());
    let sent = bob.view.sending();
    assert!(sent.iter().any(|text| text.contains("SENDING NEW BLOCKCHAIN")));
}

#[test]
fn test_invalid_block_gets_fail() {
    let alice = TestNode::start("alice");
    let mut block = peer_ledger::Block::new("0", "mallory").unwrap();
    block.set_merkle_root();

    assert_eq!(alice.client().send_block(&block).unwrap(), Message::Fail);
}

#[test]
fn test_blockchain_request_returns_snapshot() {
    let alice = TestNode::start("alice");
    alice.node.create_block().unwrap();
    alice.node.create_block().unwrap();

    let chain = alice.client().send_blockchain_request().unwrap();

    assert_eq!(chain, alice.node.get_block_chain());
    assert!(chain.verify_chain(DIFFICULTY));
}

#[test]
fn test_shorter_chain_gets_fail() {
    let alice = TestNode::start("alice");
    let bob = TestNode::start("bob");
    alice.node.create_block().unwrap();
    alice.node.create_block().unwrap();
    bob.node.create_block().unwrap();

    assert_eq!(
        alice.client().send_blockchain(&bob.node.get_block_chain()).unwrap(),
        Message::Fail
    );
    assert_eq!(alice.node.chain_len(), 2);
}

#[test]
fn test_transaction_broadcast() {
    let alice = TestNode::start("alice");
    let bob = TestNode::start("bob");
    bob.node.add_peer_sender("127.0.0.1", alice.port);
    bob.node.add_contact("alice", &alice.node.get_address());
    bob.node.create_block().unwrap();
    let first = bob.node.get_block_chain().get_blocks()[0].clone();
    assert_eq!(alice.client().send_block(&first).unwrap(), Message::Success);

    let controller = bob.controller();
    let tx = controller.start_transaction_task().unwrap();

    assert_eq!(tx.get_recipient(), alice.node.get_address());
    assert!(alice.node.get_transaction_pool().contains(&tx));

    // Alice mines bob's transaction and bob accepts her block
    let block = alice.node.create_block().unwrap().unwrap();
    assert!(block.get_transactions().contains(&tx));
    assert_eq!(bob.client().send_block(&block).unwrap(), Message::Success);
    let expected = peer_ledger::BLOCK_REWARD + tx.get_value();
    assert!((alice.node.get_wallet().get_balance() - expected).abs() < 1e-9);
}

#[test]
fn test_bootstrap_wires_three_nodes() {
    let nodes: Vec<TestNode> = ["alice", "bob", "carol"]
        .iter()
        .map(|name| TestNode::start(name))
        .collect();
    let peer_ports: Vec<u16> = nodes.iter().map(|_| free_port()).collect();

    let entries: Vec<BootstrapEntry> = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| BootstrapEntry {
            address: "127.0.0.1".to_string(),
            port: n.port,
            server_ports: vec![peer_ports[i]],
            client_ports: peer_ports
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, port)| *port)
                .collect(),
        })
        .collect();

    let mut host = Bootstrapper::new(entries).with_retry_pause(Duration::from_millis(20));
    host.start();

    assert_eq!(host.get_contacts().len(), 3);
    for (i, n) in nodes.iter().enumerate() {
        let contacts = n.node.get_contacts();
        assert_eq!(contacts.len(), 2);
        assert!(!contacts.contains(n.node.get_owner_name()));

        let ports: Vec<u16> = n
            .node
            .get_peer_senders()
            .iter()
            .map(|s| s.get_port())
            .collect();
        assert_eq!(ports.len(), 2);
        assert!(!ports.contains(&peer_ports[i]));
    }

    // Peer listeners opened during bootstrap carry ledger traffic
    let block = nodes[0].node.create_block().unwrap().unwrap();
    let to_bob = NodeClient::new("127.0.0.1", peer_ports[1]);
    assert_eq!(to_bob.send_block(&block).unwrap(), Message::Success);
    assert_eq!(nodes[1].node.chain_len(), 1);
}
