pub use db::Election;
pub use election_core::{Category, ElectionCore, ElectionKind, ElectionStatus};
pub use spec::ElectionSpec;

mod db;
mod election_core;
mod spec;
