pub use registration::VoterRegistration;
pub use voter_core::{Dni, Role, VoterCore};

pub(crate) use voter_core::hash_password;

mod registration;
mod voter_core;
