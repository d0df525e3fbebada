//! Service operations over the store: everything the console exposes.
//!
//! Admin-only operations are gated at the console surface via
//! [`auth::require_admin`], mirroring where the original app enforced roles.

pub mod admin;
pub mod auth;
pub mod export;
pub mod stats;
pub mod voting;
