use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;

use crate::error::{Error, Result};

/// Application configuration, derived from `Votosafe.toml` and `VOTOSAFE_*`
/// environment variables. The store and the console both read from this.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    data_dir: PathBuf,
    demo_admin_dni: String,
    demo_admin_password: String,
    demo_admin_name: String,
}

impl Config {
    /// Load the config from `Votosafe.toml`, overridden by environment.
    pub fn load() -> Result<Self> {
        Figment::new()
            .merge(Toml::file("Votosafe.toml"))
            .merge(Env::prefixed("VOTOSAFE_"))
            .extract()
            .map_err(|err| Error::Validation(format!("Bad configuration: {err}")))
    }

    /// Directory holding the JSON collections.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// DNI of the seeded demo admin.
    pub fn demo_admin_dni(&self) -> &str {
        &self.demo_admin_dni
    }

    /// Password of the seeded demo admin.
    pub fn demo_admin_password(&self) -> &str {
        &self.demo_admin_password
    }

    /// Display name of the seeded demo admin.
    pub fn demo_admin_name(&self) -> &str {
        &self.demo_admin_name
    }
}
