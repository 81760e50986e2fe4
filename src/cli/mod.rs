pub mod commands;
pub mod genesis;

pub use commands::{run_cli, Cli, Cmd};
pub use genesis::Genesis;
