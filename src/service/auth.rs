use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::model::{
    session::Session,
    store::Store,
    voter::{VoterCore, VoterRegistration},
};

/// Sign in with DNI and password, writing the session document.
///
/// Unknown DNI and wrong password produce the same error, so the console
/// cannot be used to probe which DNIs are registered.
pub fn login(store: &Store, dni: &str, password: &str) -> Result<Session> {
    let users = store.coll::<VoterCore>().read_all()?;
    let voter = users
        .iter()
        .find(|user| user.dni.as_str() == dni)
        .filter(|user| user.verify_password(password))
        .ok_or_else(|| Error::Unauthorized("Wrong DNI or password".to_string()))?;

    let session = Session::for_voter(voter);
    store.write_session(&session)?;
    info!("{} signed in ({})", session.dni, session.role);
    Ok(session)
}

/// Sign out, removing the session document.
pub fn logout(store: &Store) -> Result<()> {
    store.clear_session()
}

/// Register a new voter account after validating the form.
pub fn register(store: &Store, registration: VoterRegistration, today: NaiveDate) -> Result<VoterCore> {
    let voter = registration
        .into_voter(today)
        .map_err(Error::Validation)?;

    let users = store.coll::<VoterCore>();
    users.modify(|all| {
        // Check DNI uniqueness under the store lock.
        if all.iter().any(|user| user.dni == voter.dni) {
            return Err(Error::conflict(format!(
                "DNI {} is already registered",
                voter.dni
            )));
        }
        all.push(voter.clone());
        Ok(())
    })?;

    info!("Registered voter {}", voter.dni);
    Ok(voter)
}

/// The current session, or an unauthorized error.
pub fn current_session(store: &Store) -> Result<Session> {
    store
        .read_session()?
        .ok_or_else(|| Error::Unauthorized("Nobody is signed in".to_string()))
}

/// The current session, requiring the admin role.
pub fn require_admin(store: &Store) -> Result<Session> {
    let session = current_session(store)?;
    if session.is_admin() {
        Ok(session)
    } else {
        Err(Error::Unauthorized("Admin role required".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::model::voter::Role;

    use super::*;

    fn open_store(dir: &tempfile::TempDir) -> Store {
        Store::open(&Config::example(dir.path())).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 20).unwrap()
    }

    #[test]
    fn demo_admin_can_sign_in() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);

        let session = login(&store, "72381395", "admin123").unwrap();
        assert!(session.is_admin());
        assert_eq!(session, current_session(&store).unwrap());
        assert!(require_admin(&store).is_ok());

        logout(&store).unwrap();
        assert!(matches!(
            current_session(&store),
            Err(Error::Unauthorized(_))
        ));
    }

    #[test]
    fn wrong_credentials_are_uniform() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);

        let bad_password = login(&store, "72381395", "wrong").unwrap_err();
        let bad_dni = login(&store, "99999999", "admin123").unwrap_err();
        assert_eq!(bad_password.to_string(), bad_dni.to_string());
    }

    #[test]
    fn register_then_sign_in() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);

        let voter = register(&store, VoterRegistration::example(), today()).unwrap();
        assert_eq!(Role::User, voter.role);

        let session = login(&store, voter.dni.as_str(), "secreto").unwrap();
        assert!(!session.is_admin());
        assert!(matches!(
            require_admin(&store),
            Err(Error::Unauthorized(_))
        ));
    }

    #[test]
    fn duplicate_dni_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);

        register(&store, VoterRegistration::example(), today()).unwrap();
        let err = register(&store, VoterRegistration::example(), today()).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        // The collection still holds the seeded admin plus one registration.
        assert_eq!(2, store.coll::<VoterCore>().read_all().unwrap().len());
    }
}
