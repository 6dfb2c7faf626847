//! `signet init`: create the node's on-disk identity and state

use anyhow::{bail, Context};
use clap::Args;
use signet_core::storage::{BlockStore, PeerStore};
use signet_core::{Block, Config, KeyPair, Peer};
use std::fs;
use std::path::PathBuf;

/// Arguments of `signet init`
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Address this node is reachable at (e.g. 10.0.0.1 or 10.0.0.1:8080)
    #[arg(long)]
    pub address: String,

    /// Display name
    #[arg(long)]
    pub nickname: String,

    /// Network-unique node name
    #[arg(long)]
    pub nodename: String,

    /// State directory
    #[arg(long, default_value = signet_core::config::DEFAULT_ROOT_DIR)]
    pub root_dir: PathBuf,
}

/// Generate keys, write the genesis block, register self, write the config
pub fn run(args: InitArgs) -> anyhow::Result<()> {
    if !signet_core::types::is_valid_node_name(&args.nodename) {
        bail!("node name must match [A-Za-z0-9_-]+: {}", args.nodename);
    }

    let config = Config {
        root_dir: args.root_dir,
        address: args.address,
        nick_name: args.nickname,
        node_name: args.nodename,
        port: signet_core::config::DEFAULT_PORT.to_string(),
    };

    if config.block_file_path().exists() {
        bail!(
            "block log already exists at {}; refusing to re-initialize",
            config.block_file_path().display()
        );
    }

    fs::create_dir_all(&config.root_dir)
        .with_context(|| format!("failed to create {}", config.root_dir.display()))?;
    fs::create_dir_all(config.nodes_dir())
        .with_context(|| format!("failed to create {}", config.nodes_dir().display()))?;

    let keypair = KeyPair::generate();
    keypair
        .save(config.priv_key_path())
        .context("failed to save private key")?;

    BlockStore::new(config.block_file_path())
        .append(&Block::genesis())
        .context("failed to write genesis block")?;

    let public_key = keypair.public_key_hex();
    PeerStore::new(config.nodes_dir())
        .save(&Peer {
            name: config.node_name.clone(),
            nick_name: config.nick_name.clone(),
            address: config.address.clone(),
            public_key: public_key.clone(),
        })
        .context("failed to save node record")?;

    let conf_path = Config::default_path();
    if let Some(parent) = conf_path.parent() {
        fs::create_dir_all(parent)?;
    }
    config.save(&conf_path).context("failed to save config")?;

    println!("Signet node initialized successfully!");
    println!("  Node Name: {}", config.node_name);
    println!("  Nick Name: {}", config.nick_name);
    println!("  Address: {}", config.address);
    println!("  Public Key: {}", public_key);
    println!("  Config: {}", conf_path.display());
    Ok(())
}
