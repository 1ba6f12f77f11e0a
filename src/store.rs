//! SQLite-backed accounts, profiles, and login sessions.
//!
//! One connection behind a mutex serves the whole process; requests take
//! one statement at a time, which matches the service's modest write
//! traffic. Passwords are stored as salted, iterated SHA-256 digests.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;
use uuid::Uuid;

const PASSWORD_ROUNDS: u32 = 10_000;

/// Store errors. The registration and login variants map one-to-one onto
/// the messages shown to users.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to create data directory: {0}")]
    CreateDir(std::io::Error),

    #[error("passwords do not match")]
    PasswordMismatch,

    #[error("username already taken")]
    UsernameTaken,

    #[error("email already registered")]
    EmailTaken,

    #[error("invalid username")]
    UnknownUsername,

    #[error("invalid password")]
    WrongPassword,
}

/// An authenticated account.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// Profile record tied one-to-one with an account. All fields optional,
/// represented as empty strings when unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub phone_number: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub bio: String,
    pub date_of_birth: String,
}

/// Registration input.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub confirm_password: String,
}

/// Posted profile-edit fields: account details plus profile details.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub profile: Profile,
}

/// Shared account store.
pub struct UserStore {
    conn: Mutex<Connection>,
}

impl UserStore {
    /// Open (and if needed create) the account database at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(StoreError::CreateDir)?;
        }
        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                username      TEXT NOT NULL UNIQUE,
                email         TEXT NOT NULL UNIQUE,
                first_name    TEXT NOT NULL DEFAULT '',
                last_name     TEXT NOT NULL DEFAULT '',
                password_salt TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                created_at    TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS profiles (
                user_id       INTEGER PRIMARY KEY REFERENCES users(id),
                phone_number  TEXT NOT NULL DEFAULT '',
                address       TEXT NOT NULL DEFAULT '',
                city          TEXT NOT NULL DEFAULT '',
                state         TEXT NOT NULL DEFAULT '',
                pincode       TEXT NOT NULL DEFAULT '',
                bio           TEXT NOT NULL DEFAULT '',
                date_of_birth TEXT NOT NULL DEFAULT ''
            );
            CREATE TABLE IF NOT EXISTS sessions (
                token      TEXT PRIMARY KEY,
                user_id    INTEGER NOT NULL REFERENCES users(id),
                created_at TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().expect("account store mutex poisoned")
    }

    /// Create an account and its empty profile row.
    ///
    /// The three rejection causes stay distinguishable so the form can
    /// show the right message.
    pub fn register(&self, new: &NewUser) -> Result<i64, StoreError> {
        if new.password != new.confirm_password {
            return Err(StoreError::PasswordMismatch);
        }

        let conn = self.lock();

        let username_taken: Option<i64> = conn
            .query_row(
                "SELECT id FROM users WHERE username = ?1",
                params![new.username],
                |row| row.get(0),
            )
            .optional()?;
        if username_taken.is_some() {
            return Err(StoreError::UsernameTaken);
        }

        let email_taken: Option<i64> = conn
            .query_row(
                "SELECT id FROM users WHERE email = ?1",
                params![new.email],
                |row| row.get(0),
            )
            .optional()?;
        if email_taken.is_some() {
            return Err(StoreError::EmailTaken);
        }

        let salt = Uuid::new_v4().simple().to_string();
        let hash = hash_password(&new.password, &salt);
        conn.execute(
            "INSERT INTO users (username, email, first_name, last_name, password_salt, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                new.username,
                new.email,
                new.first_name,
                new.last_name,
                salt,
                hash,
                Utc::now().to_rfc3339(),
            ],
        )?;
        let user_id = conn.last_insert_rowid();

        conn.execute(
            "INSERT INTO profiles (user_id) VALUES (?1)",
            params![user_id],
        )?;

        Ok(user_id)
    }

    /// Check credentials. Unknown username and wrong password are
    /// reported separately, as the login form distinguishes them.
    pub fn verify_login(&self, username: &str, password: &str) -> Result<User, StoreError> {
        let conn = self.lock();

        let row: Option<(User, String, String)> = conn
            .query_row(
                "SELECT id, username, email, first_name, last_name, password_salt, password_hash
                 FROM users WHERE username = ?1",
                params![username],
                |row| {
                    Ok((
                        User {
                            id: row.get(0)?,
                            username: row.get(1)?,
                            email: row.get(2)?,
                            first_name: row.get(3)?,
                            last_name: row.get(4)?,
                        },
                        row.get(5)?,
                        row.get(6)?,
                    ))
                },
            )
            .optional()?;

        let (user, salt, stored_hash) = row.ok_or(StoreError::UnknownUsername)?;
        if hash_password(password, &salt) != stored_hash {
            return Err(StoreError::WrongPassword);
        }
        Ok(user)
    }

    /// Establish a login session and return its opaque token.
    pub fn create_session(&self, user_id: i64) -> Result<String, StoreError> {
        let token = Uuid::new_v4().simple().to_string();
        self.lock().execute(
            "INSERT INTO sessions (token, user_id, created_at) VALUES (?1, ?2, ?3)",
            params![token, user_id, Utc::now().to_rfc3339()],
        )?;
        Ok(token)
    }

    /// Resolve a session token to its user, if the session exists.
    pub fn session_user(&self, token: &str) -> Result<Option<User>, StoreError> {
        let user = self
            .lock()
            .query_row(
                "SELECT u.id, u.username, u.email, u.first_name, u.last_name
                 FROM sessions s JOIN users u ON u.id = s.user_id
                 WHERE s.token = ?1",
                params![token],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        email: row.get(2)?,
                        first_name: row.get(3)?,
                        last_name: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    /// Destroy a session. Unknown tokens are a no-op.
    pub fn delete_session(&self, token: &str) -> Result<(), StoreError> {
        self.lock()
            .execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
        Ok(())
    }

    /// Fetch the profile for a user, creating the row if it is missing.
    pub fn profile(&self, user_id: i64) -> Result<Profile, StoreError> {
        let conn = self.lock();

        let existing: Option<Profile> = conn
            .query_row(
                "SELECT phone_number, address, city, state, pincode, bio, date_of_birth
                 FROM profiles WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok(Profile {
                        phone_number: row.get(0)?,
                        address: row.get(1)?,
                        city: row.get(2)?,
                        state: row.get(3)?,
                        pincode: row.get(4)?,
                        bio: row.get(5)?,
                        date_of_birth: row.get(6)?,
                    })
                },
            )
            .optional()?;

        match existing {
            Some(profile) => Ok(profile),
            None => {
                conn.execute(
                    "INSERT INTO profiles (user_id) VALUES (?1)",
                    params![user_id],
                )?;
                Ok(Profile::default())
            }
        }
    }

    /// Apply posted account and profile updates.
    pub fn update_profile(&self, user_id: i64, update: &ProfileUpdate) -> Result<(), StoreError> {
        // Fetch-or-create so an update never targets a missing row.
        drop(self.profile(user_id)?);

        let conn = self.lock();
        conn.execute(
            "UPDATE users SET first_name = ?1, last_name = ?2, email = ?3 WHERE id = ?4",
            params![update.first_name, update.last_name, update.email, user_id],
        )?;
        conn.execute(
            "UPDATE profiles SET phone_number = ?1, address = ?2, city = ?3, state = ?4,
                                 pincode = ?5, bio = ?6, date_of_birth = ?7
             WHERE user_id = ?8",
            params![
                update.profile.phone_number,
                update.profile.address,
                update.profile.city,
                update.profile.state,
                update.profile.pincode,
                update.profile.bio,
                update.profile.date_of_birth,
                user_id,
            ],
        )?;
        Ok(())
    }
}

fn hash_password(password: &str, salt: &str) -> String {
    let mut digest = Sha256::digest(format!("{salt}:{password}").as_bytes());
    for _ in 1..PASSWORD_ROUNDS {
        digest = Sha256::digest(&digest);
    }
    format!("{digest:x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            first_name: "Asha".to_string(),
            last_name: "K".to_string(),
            password: "hunter22".to_string(),
            confirm_password: "hunter22".to_string(),
        }
    }

    #[test]
    fn test_register_and_login() {
        let store = UserStore::open_in_memory().unwrap();
        let id = store.register(&new_user("asha", "asha@example.com")).unwrap();

        let user = store.verify_login("asha", "hunter22").unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.email, "asha@example.com");
    }

    #[test]
    fn test_register_password_mismatch() {
        let store = UserStore::open_in_memory().unwrap();
        let mut user = new_user("asha", "asha@example.com");
        user.confirm_password = "different".to_string();
        assert!(matches!(
            store.register(&user).unwrap_err(),
            StoreError::PasswordMismatch
        ));
    }

    #[test]
    fn test_register_duplicate_username_and_email() {
        let store = UserStore::open_in_memory().unwrap();
        store.register(&new_user("asha", "asha@example.com")).unwrap();

        assert!(matches!(
            store
                .register(&new_user("asha", "other@example.com"))
                .unwrap_err(),
            StoreError::UsernameTaken
        ));
        assert!(matches!(
            store
                .register(&new_user("other", "asha@example.com"))
                .unwrap_err(),
            StoreError::EmailTaken
        ));
    }

    #[test]
    fn test_login_failures_distinguished() {
        let store = UserStore::open_in_memory().unwrap();
        store.register(&new_user("asha", "asha@example.com")).unwrap();

        assert!(matches!(
            store.verify_login("nobody", "hunter22").unwrap_err(),
            StoreError::UnknownUsername
        ));
        assert!(matches!(
            store.verify_login("asha", "wrong").unwrap_err(),
            StoreError::WrongPassword
        ));
    }

    #[test]
    fn test_session_round_trip() {
        let store = UserStore::open_in_memory().unwrap();
        let id = store.register(&new_user("asha", "asha@example.com")).unwrap();

        let token = store.create_session(id).unwrap();
        let user = store.session_user(&token).unwrap().unwrap();
        assert_eq!(user.username, "asha");

        store.delete_session(&token).unwrap();
        assert!(store.session_user(&token).unwrap().is_none());
    }

    #[test]
    fn test_unknown_session_token() {
        let store = UserStore::open_in_memory().unwrap();
        assert!(store.session_user("no-such-token").unwrap().is_none());
    }

    #[test]
    fn test_profile_fetch_or_create_and_update() {
        let store = UserStore::open_in_memory().unwrap();
        let id = store.register(&new_user("asha", "asha@example.com")).unwrap();

        assert_eq!(store.profile(id).unwrap(), Profile::default());

        let update = ProfileUpdate {
            first_name: "Asha".to_string(),
            last_name: "Kumar".to_string(),
            email: "asha.k@example.com".to_string(),
            profile: Profile {
                phone_number: "5550100".to_string(),
                city: "Pune".to_string(),
                ..Profile::default()
            },
        };
        store.update_profile(id, &update).unwrap();

        let profile = store.profile(id).unwrap();
        assert_eq!(profile.phone_number, "5550100");
        assert_eq!(profile.city, "Pune");

        let user = store.verify_login("asha", "hunter22").unwrap();
        assert_eq!(user.email, "asha.k@example.com");
        assert_eq!(user.last_name, "Kumar");
    }

    #[test]
    fn test_password_hash_is_salted() {
        assert_ne!(
            hash_password("secret", "salt-a"),
            hash_password("secret", "salt-b")
        );
        assert_eq!(
            hash_password("secret", "salt-a"),
            hash_password("secret", "salt-a")
        );
    }
}
