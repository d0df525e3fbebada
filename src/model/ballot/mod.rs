pub use ballot_core::{BallotCore, BallotStatus, Selection};
pub use db::Ballot;

mod ballot_core;
mod db;
