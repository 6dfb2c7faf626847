//! `signet stop`: terminate a running node via its PID file

use anyhow::{bail, Context};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use signet_core::Config;
use std::fs;

/// Send SIGTERM to the PID recorded by `start`
pub fn run() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load config")?;
    let pid_path = config.pid_file_path();

    let pid_data = match fs::read_to_string(&pid_path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            bail!("PID file not found. Is the node running?");
        }
        Err(e) => return Err(e).context("failed to read PID file"),
    };

    let pid: i32 = pid_data
        .trim()
        .parse()
        .with_context(|| format!("invalid PID format: {}", pid_data.trim()))?;

    kill(Pid::from_raw(pid), Signal::SIGTERM)
        .with_context(|| format!("failed to send SIGTERM to process {}", pid))?;

    println!("Sent SIGTERM to process {}", pid);

    if let Err(e) = fs::remove_file(&pid_path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            eprintln!("Warning: failed to remove PID file: {}", e);
        }
    }

    Ok(())
}
