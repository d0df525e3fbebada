pub use db::Party;
pub use party_core::{Candidate, PartyCore, PartySpec};

mod db;
mod party_core;
