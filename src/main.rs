// Entry point: either run a ledger node or act as the one-shot bootstrap host
use clap::Parser;
use log::{error, info, LevelFilter};
use peer_ledger::{
    Bootstrapper, Command, Controller, DisplaySink, LogView, NodeSettings, Opt, PeerNode, Server,
    GLOBAL_CONFIG,
};
use std::process;
use std::sync::Arc;

fn main() {
    // Info by default, RUST_LOG still wins
    env_logger::builder()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let opt = Opt::parse();

    if let Err(e) = run_command(opt.command) {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn run_command(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::StartNode {
            name,
            listen,
            config,
            difficulty,
            peers,
        } => {
            // Environment first, then the settings file, then the command line
            let settings = match config {
                Some(path) => {
                    let settings = NodeSettings::load(&path)?;
                    GLOBAL_CONFIG.set_node_name(settings.node.name.clone());
                    GLOBAL_CONFIG.set_node_addr(settings.node.listen.clone());
                    GLOBAL_CONFIG.set_difficulty(settings.node.difficulty);
                    settings
                }
                None => NodeSettings::default(),
            };
            if let Some(name) = name {
                GLOBAL_CONFIG.set_node_name(name);
            }
            if let Some(listen) = listen {
                GLOBAL_CONFIG.set_node_addr(listen);
            }
            if let Some(difficulty) = difficulty {
                GLOBAL_CONFIG.set_difficulty(difficulty);
            }

            // Keypair failure ends startup here
            let node = Arc::new(PeerNode::with_difficulty(
                &GLOBAL_CONFIG.get_node_name(),
                GLOBAL_CONFIG.get_difficulty(),
            )?);
            node.set_self_client_address(&settings.node.client_address);
            for peer in &settings.peers {
                node.add_peer_sender(&peer.address, peer.port);
            }
            for peer in peers {
                match peer.address {
                    Some(address) => node.add_peer_sender(&address, peer.port),
                    None => node.add_peer_sender_port(peer.port),
                };
            }

            info!(
                "Node {} starting with address {}",
                node.get_owner_name(),
                node.get_address()
            );

            let view: Arc<dyn DisplaySink> = Arc::new(LogView);
            let server = Server::new(Arc::clone(&node), Arc::clone(&view));
            let controller = Controller::new(node, view, settings.schedule);
            let _tasks = controller.start();

            server.run(&GLOBAL_CONFIG.get_node_addr())?
        }
        Command::Bootstrap { config } => {
            let settings = NodeSettings::load(&config)?;
            if settings.bootstrap.is_empty() {
                return Err(format!("No [[bootstrap]] entries in {}", config.display()).into());
            }

            let mut host = Bootstrapper::new(settings.bootstrap);
            host.start();
            println!("Done! Contacts:\n{}", host.get_contacts());
        }
    }
    Ok(())
}
