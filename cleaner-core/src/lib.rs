pub const REFERENCE: &'static str = include_str!("../reference.toml");

pub mod error;
pub mod ext;
pub mod config;
pub mod discovery;
pub mod admin;
pub mod supplier;
pub mod outcome;
pub mod membership;
pub mod catalog;
pub mod reconciler;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod mock;
