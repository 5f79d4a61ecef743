//! Local accounts for the SQLite store.
//!
//! The signed-in user id lives in the kv table under `SESSION_KEY`.

use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use super::database::{format_ts, parse_datetime_fallback, SqliteStore};
use super::traits::Store;
use crate::error::{AuthError, CoreError, Result};
use crate::identity::{
    normalize_email, password_digest, validate_email, validate_sign_up, validate_username,
    IdentityProvider, ProfileUpdate, User,
};
use crate::progression::Progression;

const SESSION_KEY: &str = "session_user_id";

impl SqliteStore {
    fn find_user(&self, column: &str, value: &str) -> Result<Option<(User, String, String)>> {
        let sql = format!(
            "SELECT id, email, username, created_at, password_salt, password_hash
             FROM users WHERE {column} = ?1"
        );
        let row = self
            .conn
            .query_row(&sql, params![value], |row| {
                let created_at: String = row.get(3)?;
                Ok((
                    User {
                        id: row.get(0)?,
                        email: row.get(1)?,
                        username: row.get(2)?,
                        created_at: parse_datetime_fallback(&created_at),
                    },
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })
            .optional()?;
        Ok(row)
    }

    pub fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        Ok(self.find_user("id", user_id)?.map(|(user, _, _)| user))
    }
}

impl IdentityProvider for SqliteStore {
    fn sign_up(&mut self, email: &str, password: &str, username: &str) -> Result<User> {
        validate_sign_up(email, password, username)?;
        let email = normalize_email(email);
        if self.find_user("email", &email)?.is_some() {
            return Err(AuthError::EmailTaken(email).into());
        }

        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            email,
            username: username.trim().to_string(),
            created_at: Utc::now(),
        };
        let salt = uuid::Uuid::new_v4().simple().to_string();

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO users (id, email, username, password_salt, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user.id,
                user.email,
                user.username,
                salt,
                password_digest(&salt, password),
                format_ts(&user.created_at),
            ],
        )?;
        tx.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![SESSION_KEY, user.id],
        )?;
        tx.commit()?;

        self.save_progression(&Progression::new(user.id.clone()))?;
        tracing::info!(user = %user.id, "account created");
        Ok(user)
    }

    fn sign_in(&mut self, email: &str, password: &str) -> Result<User> {
        let email = normalize_email(email);
        let Some((user, salt, hash)) = self.find_user("email", &email)? else {
            return Err(AuthError::InvalidCredentials.into());
        };
        if password_digest(&salt, password) != hash {
            tracing::warn!(email = %email, "rejected sign-in");
            return Err(AuthError::InvalidCredentials.into());
        }
        self.kv_set(SESSION_KEY, &user.id)?;
        Ok(user)
    }

    fn sign_out(&mut self) -> Result<()> {
        self.kv_delete(SESSION_KEY)?;
        Ok(())
    }

    fn current_user(&self) -> Result<Option<User>> {
        match self.kv_get(SESSION_KEY)? {
            Some(id) => self.get_user(&id),
            None => Ok(None),
        }
    }

    fn update_profile(&mut self, update: &ProfileUpdate) -> Result<User> {
        let mut user = self
            .current_user()?
            .ok_or(CoreError::Auth(AuthError::NotSignedIn))?;

        if let Some(ref username) = update.username {
            validate_username(username)?;
            user.username = username.trim().to_string();
        }
        if let Some(ref email) = update.email {
            validate_email(email)?;
            let email = normalize_email(email);
            if email != user.email && self.find_user("email", &email)?.is_some() {
                return Err(AuthError::EmailTaken(email).into());
            }
            user.email = email;
        }

        self.conn.execute(
            "UPDATE users SET username = ?1, email = ?2 WHERE id = ?3",
            params![user.username, user.email, user.id],
        )?;
        Ok(user)
    }
}
