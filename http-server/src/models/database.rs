use ledger::types::UserId;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::lock;

struct Credentials {
    user_id: UserId,
    salt: String,
    password_hash: String,
}

// Login credentials and bearer sessions; balances live in the ledger
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    credentials: Arc<Mutex<HashMap<String, Credentials>>>,
    sessions: Arc<Mutex<HashMap<String, UserId>>>,
}

fn random_hex(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill_bytes(&mut buf);
    hex::encode(buf)
}

// Salted SHA-256 of the password
fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_credentials(&self, email: &str, user_id: UserId, password: &str) {
        let salt = random_hex(16);
        let password_hash = hash_password(&salt, password);
        lock(&self.credentials).insert(
            normalize_email(email),
            Credentials {
                user_id,
                salt,
                password_hash,
            },
        );
    }

    // Returns the account's user id when the password matches
    pub fn verify_password(&self, email: &str, password: &str) -> Option<UserId> {
        let credentials = lock(&self.credentials);
        let stored = credentials.get(&normalize_email(email))?;
        (hash_password(&stored.salt, password) == stored.password_hash).then_some(stored.user_id)
    }

    pub fn create_session(&self, user_id: UserId) -> String {
        let session_id = random_hex(32);
        lock(&self.sessions).insert(session_id.clone(), user_id);
        session_id
    }

    pub fn get_user_id_by_session(&self, session_id: &str) -> Option<UserId> {
        lock(&self.sessions).get(session_id).copied()
    }

    pub fn end_session(&self, session_id: &str) -> bool {
        lock(&self.sessions).remove(session_id).is_some()
    }
}
