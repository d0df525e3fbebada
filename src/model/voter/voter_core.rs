use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use chrono::NaiveDate;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Error, Result};

/// Core voter user data, as stored in the users collection.
///
/// Voters are keyed by DNI; there is no separate document id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterCore {
    /// National id, the primary key.
    pub dni: Dni,
    pub first_names: String,
    pub last_names: String,
    pub birth_date: NaiveDate,
    pub role: Role,
    pub department: String,
    pub email: String,
    /// Flipped by the store's cast-vote operation, never directly.
    pub has_voted: bool,
    /// Name of the election the voter voted in, if any.
    pub election_name: Option<String>,
    pub registered_at: NaiveDate,
    pub password_hash: String,
}

impl VoterCore {
    /// Check whether the given password is correct.
    ///
    /// A malformed stored hash verifies as false rather than erroring; such
    /// documents can only come from hand-edited files.
    pub fn verify_password<T: AsRef<[u8]>>(&self, password: T) -> bool {
        argon2::verify_encoded(&self.password_hash, password.as_ref()).unwrap_or(false)
    }

    /// The configured demo admin, seeded into an empty users collection.
    pub fn demo_admin(config: &Config) -> Result<Self> {
        let dni = config
            .demo_admin_dni()
            .parse::<Dni>()
            .map_err(|err| Error::Validation(format!("Bad demo admin DNI: {err}")))?;
        Ok(Self {
            dni,
            first_names: config.demo_admin_name().to_string(),
            last_names: "Administrador".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(), // Static date.
            role: Role::Admin,
            department: "Lima".to_string(),
            email: "admin@votosafe.pe".to_string(),
            has_voted: false,
            election_name: None,
            registered_at: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), // Static date.
            password_hash: hash_password(config.demo_admin_password()),
        })
    }
}

/// Hash a password for storage.
pub(crate) fn hash_password(password: &str) -> String {
    // 16 bytes is recommended for password hashing:
    //  https://en.wikipedia.org/wiki/Argon2
    let mut salt = [0_u8; 16];
    rand::thread_rng().fill(&mut salt);
    argon2::hash_encoded(password.as_bytes(), &salt, &argon2::Config::default())
        .unwrap() // Safe because the default `Config` is valid.
}

/// A validated national id: exactly eight ASCII digits.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Dni(String);

impl Dni {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Dni {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Dni {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.len() == 8 && s.chars().all(|c| c.is_ascii_digit()) {
            Ok(Self(s.to_string()))
        } else {
            Err("DNI must be exactly 8 digits".to_string())
        }
    }
}

impl TryFrom<String> for Dni {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Dni> for String {
    fn from(dni: Dni) -> Self {
        dni.0
    }
}

/// User roles.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
    /// Political-party observer accounts.
    Ppmm,
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "Admin"),
            Role::User => write!(f, "User"),
            Role::Ppmm => write!(f, "PPMM"),
        }
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl VoterCore {
        pub fn example(dni: &str, first: &str, last: &str) -> Self {
            Self {
                dni: dni.parse().unwrap(),
                first_names: first.to_string(),
                last_names: last.to_string(),
                birth_date: NaiveDate::from_ymd_opt(1993, 7, 14).unwrap(),
                role: Role::User,
                department: "Arequipa".to_string(),
                email: format!("{}@ejemplo.pe", first.to_lowercase()),
                has_voted: false,
                election_name: None,
                registered_at: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
                password_hash: hash_password("secreto"),
            }
        }
    }
}
