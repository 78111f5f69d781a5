//! Maintenance operations behind the `create_test_user` and `list_users`
//! binaries. They talk to the store directly and skip request validation.

use serde::Serialize;

use crate::auth::hash_password;
use crate::error::CrmResult;
use crate::models::{UserData, UserRole};
use crate::storage::Store;

pub const TEST_USERNAME: &str = "testuser";
pub const TEST_PASSWORD: &str = "password123";
pub const TEST_EMAIL: &str = "test@example.com";
const TEST_FULL_NAME: &str = "Test User";
const TEST_PHONE: &str = "555-0100";

/// What `create_test_user` prints so the account can be used to log in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestUserCredentials {
    pub username: String,
    pub password: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserListing {
    pub username: String,
    pub email: String,
    /// The stored bcrypt hash.
    pub password: String,
}

/// Inserts the fixed sample user. A second run fails on the username index.
pub fn create_test_user(store: &Store) -> CrmResult<TestUserCredentials> {
    let user = store.create_user(UserData {
        username: TEST_USERNAME.to_string(),
        password: hash_password(TEST_PASSWORD)?,
        full_name: TEST_FULL_NAME.to_string(),
        email: TEST_EMAIL.to_string(),
        phone: Some(TEST_PHONE.to_string()),
        avatar: None,
        role: UserRole::Agent,
        is_active: true,
    })?;
    store.flush()?;

    Ok(TestUserCredentials {
        username: user.data.username,
        password: TEST_PASSWORD.to_string(),
        email: user.data.email,
    })
}

pub fn list_users(store: &Store) -> CrmResult<Vec<UserListing>> {
    Ok(store
        .list_users()?
        .into_iter()
        .map(|user| UserListing {
            username: user.data.username,
            email: user.data.email,
            password: user.data.password,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verify_password;
    use crate::error::CrmError;

    #[test]
    fn second_test_user_is_a_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();

        let creds = create_test_user(&store).unwrap();
        assert_eq!(creds.username, TEST_USERNAME);
        assert_eq!(creds.password, TEST_PASSWORD);

        let err = create_test_user(&store).unwrap_err();
        assert!(matches!(err, CrmError::Conflict { field: "username", .. }));
        assert_eq!(list_users(&store).unwrap().len(), 1);
    }

    #[test]
    fn listing_shows_stored_hash() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        create_test_user(&store).unwrap();

        let users = list_users(&store).unwrap();
        assert_eq!(users[0].email, TEST_EMAIL);
        assert_ne!(users[0].password, TEST_PASSWORD);
        assert!(verify_password(TEST_PASSWORD, &users[0].password).unwrap());
    }
}
