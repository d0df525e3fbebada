use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::voter_core::{hash_password, Dni, Role, VoterCore};

/// Raw registration data, received from the registration form. Never stored
/// directly, since the password is in plaintext.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoterRegistration {
    pub dni: String,
    pub first_names: String,
    pub last_names: String,
    pub birth_date: NaiveDate,
    pub department: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl VoterRegistration {
    /// Validate the form and convert it into a storable voter.
    ///
    /// Registered accounts always get the `user` role and an unset voted
    /// flag; DNI uniqueness is checked by the caller against the collection.
    pub fn into_voter(self, today: NaiveDate) -> Result<VoterCore, String> {
        let dni = self.dni.parse::<Dni>()?;
        if self.first_names.trim().is_empty() || self.last_names.trim().is_empty() {
            return Err("Name fields must not be empty".to_string());
        }
        if !is_valid_email(&self.email) {
            return Err(format!("Malformed email address: {}", self.email));
        }
        if self.password.len() < 6 {
            return Err("Password must be at least 6 characters".to_string());
        }
        if self.password != self.confirm_password {
            return Err("Passwords do not match".to_string());
        }
        Ok(VoterCore {
            dni,
            first_names: self.first_names,
            last_names: self.last_names,
            birth_date: self.birth_date,
            role: Role::User,
            department: self.department,
            email: self.email,
            has_voted: false,
            election_name: None,
            registered_at: today,
            password_hash: hash_password(&self.password),
        })
    }
}

/// `local@domain.tld`, no whitespace anywhere.
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !local.is_empty() && !host.is_empty() && !tld.is_empty() && !domain.contains('@')
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl VoterRegistration {
        pub fn example() -> Self {
            Self {
                dni: "45678912".to_string(),
                first_names: "Ximena".to_string(),
                last_names: "Rivera Gómez".to_string(),
                birth_date: NaiveDate::from_ymd_opt(1998, 11, 2).unwrap(),
                department: "Cusco".to_string(),
                email: "ximena@ejemplo.pe".to_string(),
                password: "secreto".to_string(),
                confirm_password: "secreto".to_string(),
            }
        }
    }
}
