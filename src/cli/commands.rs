use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;

/// A peer listener given on the command line as `host:port` or just `port`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerArg {
    pub address: Option<String>,
    pub port: u16,
}

impl FromStr for PeerArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (address, port) = match s.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() => (Some(host.to_string()), port),
            _ => (None, s),
        };
        let port = port
            .parse::<u16>()
            .map_err(|_| format!("Invalid peer: {s}. Use 'host:port' or 'port'"))?;
        Ok(PeerArg { address, port })
    }
}

#[derive(Debug, Parser)]
#[command(name = "peer-ledger")]
pub struct Opt {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(name = "startnode", about = "Start a ledger node")]
    StartNode {
        #[arg(long, help = "Owner name shown to other nodes")]
        name: Option<String>,
        #[arg(long, help = "Address to listen on, e.g. 127.0.0.1:7001")]
        listen: Option<String>,
        #[arg(long, help = "TOML settings file")]
        config: Option<PathBuf>,
        #[arg(long, help = "Number of leading zeros a block hash needs")]
        difficulty: Option<usize>,
        #[arg(long = "peer", help = "Peer listener to broadcast to (repeatable)")]
        peers: Vec<PeerArg>,
    },
    #[command(
        name = "bootstrap",
        about = "Wire up the nodes listed in a settings file, then exit"
    )]
    Bootstrap {
        #[arg(long, help = "TOML settings file with [[bootstrap]] entries")]
        config: PathBuf,
    },
}
