// jmap-cli/src/commands/mod.rs
pub mod blob;
pub mod discover;
pub mod echo;
pub mod session;
pub mod setup;

pub use setup::run_setup;
