//! Periodic node tasks
//!
//! The controller drives a node on three fixed schedules (mine a block,
//! originate a transaction, dump the chain) and broadcasts whatever the node
//! produces to its peer senders.

use crate::config::{Period, ScheduleSettings};
use crate::core::{Block, Transaction};
use crate::network::Message;
use crate::node::PeerNode;
use crate::view::{banner, DisplaySink};
use log::{error, warn};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

#[derive(Clone)]
pub struct Controller {
    node: Arc<PeerNode>,
    view: Arc<dyn DisplaySink>,
    schedule: ScheduleSettings,
}

impl Controller {
    pub fn new(node: Arc<PeerNode>, view: Arc<dyn DisplaySink>, schedule: ScheduleSettings) -> Self {
        Self {
            node,
            view,
            schedule,
        }
    }

    pub fn get_node(&self) -> &Arc<PeerNode> {
        &self.node
    }

    /// Mines one block and sends it to every peer.
    ///
    /// A peer that answers `BLOCKCHAIN_REQUEST` gets the whole chain right
    /// away. Peers that cannot be reached are skipped.
    pub fn create_block_task(&self) -> Option<Block> {
        let block = match self.node.create_block() {
            Ok(Some(block)) => block,
            Ok(None) => return None,
            Err(e) => {
                error!("Block creation failed: {e}");
                return None;
            }
        };

        self.view
            .print_sending_log(&format!("{}\n{block}", banner("SENDING NEW BLOCK")));

        for sender in self.node.get_peer_senders() {
            match sender.send_block(&block) {
                Ok(Message::BlockchainRequest) => {
                    let chain = self.node.get_block_chain();
                    self.view.print_sending_log(&format!(
                        "{}\n{chain}",
                        banner("SENDING NEW BLOCKCHAIN")
                    ));
                    if let Err(e) = sender.send_blockchain(&chain) {
                        warn!("Connection error. Failed sending blockchain to {sender}: {e}");
                    }
                }
                Ok(_) => {}
                Err(e) => warn!("Connection error. Failed sending block to {sender}: {e}"),
            }
        }
        Some(block)
    }

    /// Originates one transaction and sends it to every peer
    pub fn start_transaction_task(&self) -> Option<Transaction> {
        let transaction = self.node.start_auto_transaction()?;

        self.view.print_sending_log(&format!(
            "{}\n{transaction}",
            banner("SENDING NEW TRANSACTION")
        ));

        for sender in self.node.get_peer_senders() {
            if let Err(e) = sender.send_transaction(&transaction) {
                warn!("Connection error. Failed sending transaction to {sender}: {e}");
            }
        }
        Some(transaction)
    }

    pub fn show_blockchain_task(&self) {
        self.view
            .print_blockchain_log(&self.node.get_block_chain().to_string());
    }

    /// Spawns the three recurring tasks. They run until the process exits.
    pub fn start(&self) -> Vec<JoinHandle<()>> {
        let block_task = self.clone();
        let transaction_task = self.clone();
        let show_task = self.clone();

        vec![
            spawn_periodic("create-block", self.schedule.create_block, move || {
                block_task.create_block_task();
            }),
            spawn_periodic(
                "start-transaction",
                self.schedule.start_transaction,
                move || {
                    transaction_task.start_transaction_task();
                },
            ),
            spawn_periodic("show-blockchain", self.schedule.show_blockchain, move || {
                show_task.show_blockchain_task();
            }),
        ]
    }
}

/// Runs `task` after `period.delay()`, then at a fixed rate. A run that
/// overshoots its period is followed immediately by the next one.
fn spawn_periodic<F>(name: &str, period: Period, mut task: F) -> JoinHandle<()>
where
    F: FnMut() + Send + 'static,
{
    let name = name.to_string();
    thread::spawn(move || {
        thread::sleep(period.delay());
        let mut next_run = Instant::now();
        loop {
            task();
            next_run += period.period();
            let now = Instant::now();
            if next_run > now {
                thread::sleep(next_run - now);
            } else {
                warn!("Task {name} is running behind schedule");
                next_run = now;
            }
        }
    })
}
