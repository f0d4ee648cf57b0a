pub mod cli;
pub mod config;
pub mod global;
pub mod remote;
pub mod session;
