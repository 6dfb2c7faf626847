//! Process lifecycle commands

pub mod init;
pub mod start;
pub mod stop;

pub use init::InitArgs;
