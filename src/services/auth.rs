//! Accounts, credentials and login sessions.

use super::error::ServiceError;
use super::validation::{required_name, ValidationErrors};
use crate::models::User;
use crate::Database;
use anyhow::Result;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::Rng;
use rusqlite::{OptionalExtension, Row};
use std::sync::OnceLock;

pub const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_EMAIL_LENGTH: usize = 254;
const SESSION_TOKEN_BYTES: usize = 32;

const USER_COLUMNS: &str = "id, name, email, password_hash, is_admin, created_at, updated_at";

fn row_to_user(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        password_hash: row.get("password_hash")?,
        is_admin: row.get("is_admin")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Accepts `local@domain.tld`; the message is ready for the `email` field.
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.is_empty() {
        return Err("The email field is required.");
    }
    let well_formed = email.len() <= MAX_EMAIL_LENGTH
        && matches!(
            email.split_once('@'),
            Some((local, domain)) if !local.is_empty() && domain.contains('.')
        );
    if well_formed {
        Ok(())
    } else {
        Err("The email field must be a valid email address.")
    }
}

/// Length plus one lowercase letter, one uppercase letter and one digit.
/// Reports the first rule broken.
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "The password field must be at least {} characters.",
            MIN_PASSWORD_LENGTH
        ));
    }

    let classes = [
        (password.chars().any(|c| c.is_ascii_lowercase()), "lowercase letter"),
        (password.chars().any(|c| c.is_ascii_uppercase()), "uppercase letter"),
        (password.chars().any(|c| c.is_ascii_digit()), "number"),
    ];
    match classes.iter().find(|(present, _)| !present) {
        Some((_, class)) => Err(format!("The password field must contain at least one {}.", class)),
        None => Ok(()),
    }
}

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow::anyhow!("could not hash password: {}", e))
}

// real hash of a throwaway secret, so a miss costs the same as a hit
fn decoy_hash() -> &'static str {
    static DECOY: OnceLock<String> = OnceLock::new();
    DECOY.get_or_init(|| hash_password(&generate_session_token()).unwrap_or_default())
}

fn burn_dummy_hash(password: &str) {
    if let Ok(decoy) = PasswordHash::new(decoy_hash()) {
        let _ = Argon2::default().verify_password(password.as_bytes(), &decoy);
    }
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        burn_dummy_hash(password);
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Opaque cookie value: 32 random bytes, URL-safe base64 without padding.
pub fn generate_session_token() -> String {
    let bytes: [u8; SESSION_TOKEN_BYTES] = OsRng.gen();
    URL_SAFE_NO_PAD.encode(bytes)
}

fn check_password(errors: &mut ValidationErrors, password: &str) {
    if let Err(message) = validate_password(password) {
        errors.add("password", message);
    }
}

/// Creates an account. Problems with any field come back together as a
/// `ServiceError::Validation`; the email is stored lowercase.
pub fn create_user(
    db: &Database,
    name: &str,
    email: &str,
    password: &str,
    is_admin: bool,
) -> Result<i64> {
    let email = email.trim().to_lowercase();

    let mut errors = ValidationErrors::new();
    let name = required_name(&mut errors, "name", Some(name));
    if let Err(message) = validate_email(&email) {
        errors.add("email", message);
    }
    check_password(&mut errors, password);
    errors.into_result()?;

    let conn = db.get()?;
    let taken: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?)",
        [&email],
        |row| row.get(0),
    )?;
    if taken {
        return Err(ServiceError::Validation(ValidationErrors::single(
            "email",
            "The email has already been taken.",
        ))
        .into());
    }

    conn.execute(
        "INSERT INTO users (name, email, password_hash, is_admin) VALUES (?, ?, ?, ?)",
        (&name, &email, hash_password(password)?, is_admin),
    )?;
    let id = conn.last_insert_rowid();
    tracing::info!(id, email = %email, is_admin, "Created user");
    Ok(id)
}

/// Replaces the password of the account with this email; `Ok(false)` when
/// there is no such account.
pub fn update_password(db: &Database, email: &str, password: &str) -> Result<bool> {
    let mut errors = ValidationErrors::new();
    check_password(&mut errors, password);
    errors.into_result()?;

    let conn = db.get()?;
    let changed = conn.execute(
        "UPDATE users SET password_hash = ?, updated_at = CURRENT_TIMESTAMP WHERE email = ?",
        (hash_password(password)?, email.trim().to_lowercase()),
    )?;
    if changed > 0 {
        // other devices have to sign in again
        conn.execute(
            "DELETE FROM sessions WHERE user_id = (SELECT id FROM users WHERE email = ?)",
            [email.trim().to_lowercase()],
        )?;
    }
    Ok(changed > 0)
}

pub fn authenticate(db: &Database, email: &str, password: &str) -> Result<Option<User>> {
    let conn = db.get()?;
    let sql = format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS);
    let user = conn
        .query_row(&sql, [email.trim().to_lowercase()], row_to_user)
        .optional()?;

    match user {
        Some(u) if verify_password(password, &u.password_hash) => Ok(Some(u)),
        Some(_) => Ok(None),
        None => {
            burn_dummy_hash(password);
            Ok(None)
        }
    }
}

/// Opens a session for `user_id` lasting `lifetime_days` and returns its token.
pub fn create_session(db: &Database, user_id: i64, lifetime_days: i64) -> Result<String> {
    let token = generate_session_token();
    let expires = format!("{:+} days", lifetime_days);
    db.get()?.execute(
        "INSERT INTO sessions (user_id, token, expires_at) VALUES (?1, ?2, datetime('now', ?3))",
        (user_id, &token, &expires),
    )?;
    tracing::debug!(user_id, lifetime_days, "Opened session");
    Ok(token)
}

/// The account behind an unexpired session token.
pub fn validate_session(db: &Database, token: &str) -> Result<Option<User>> {
    let sql = format!(
        "SELECT {} FROM users WHERE id = (
             SELECT user_id FROM sessions WHERE token = ?1 AND expires_at > datetime('now'))",
        USER_COLUMNS
    );
    Ok(db.get()?.query_row(&sql, [token], row_to_user).optional()?)
}

pub fn delete_session(db: &Database, token: &str) -> Result<()> {
    db.get()?
        .execute("DELETE FROM sessions WHERE token = ?1", [token])?;
    Ok(())
}

/// Purges sessions past their expiry; returns how many went.
pub fn cleanup_expired_sessions(db: &Database) -> Result<usize> {
    Ok(db
        .get()?
        .execute("DELETE FROM sessions WHERE expires_at <= datetime('now')", [])?)
}

pub fn has_users(db: &Database) -> Result<bool> {
    let any: bool = db
        .get()?
        .query_row("SELECT EXISTS(SELECT 1 FROM users)", [], |row| row.get(0))?;
    Ok(any)
}

pub fn list_users(db: &Database) -> Result<Vec<User>> {
    let conn = db.get()?;
    let sql = format!("SELECT {} FROM users ORDER BY created_at DESC, id DESC", USER_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let users = stmt
        .query_map([], row_to_user)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(users)
}

pub fn get_user(db: &Database, id: i64) -> Result<Option<User>> {
    let conn = db.get()?;
    let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
    Ok(conn.query_row(&sql, [id], row_to_user).optional()?)
}

/// Profile update. Only the display name is editable from the admin UI.
pub fn update_profile_name(db: &Database, id: i64, name: Option<&str>) -> Result<User> {
    let mut errors = ValidationErrors::new();
    let name = required_name(&mut errors, "name", name);
    errors.into_result()?;

    let conn = db.get()?;
    let affected = conn.execute(
        "UPDATE users SET name = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
        (&name, id),
    )?;
    drop(conn);
    if affected == 0 {
        return Err(ServiceError::NotFound("user").into());
    }

    get_user(db, id)?.ok_or_else(|| ServiceError::NotFound("user").into())
}

pub fn delete_user_by_email(db: &Database, email: &str) -> Result<bool> {
    let conn = db.get()?;
    let affected = conn.execute(
        "DELETE FROM users WHERE email = ?",
        [email.trim().to_lowercase()],
    )?;
    Ok(affected > 0)
}
