//! In-memory user accounts.
//!
//! Signup is where the credential validation rules are enforced
//! authoritatively; the SPA runs the same checks for early feedback.
//! Token and session handling live outside this service, so the registry
//! only answers "is this email/password pair good".

use rand::distributions::Alphanumeric;
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::error::{Result, SampleFlowError};
use crate::validation;

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Debug)]
pub struct User {
    pub email: String,
    salt: String,
    password_hash: String,
}

impl User {
    pub fn check_password(&self, password: &str) -> bool {
        self.password_hash == hash_password(&self.salt, password)
    }
}

#[derive(Debug, Default)]
pub struct UserRegistry {
    users: Vec<User>,
}

impl UserRegistry {
    pub fn new() -> UserRegistry {
        UserRegistry { users: Vec::new() }
    }

    /// Registers a new account. Email domain and password strength are
    /// checked here, on the authoritative side.
    pub fn signup(&mut self, email: &str, password: &str) -> Result<()> {
        validation::check_email(email)?;
        validation::check_password(password)?;
        if self.users.iter().any(|u| u.email == email) {
            return Err(SampleFlowError::DuplicateUser(email.to_string()));
        }
        let salt: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(16)
            .map(char::from)
            .collect();
        let password_hash = hash_password(&salt, password);
        info!("New signup for {}", email);
        self.users.push(User {
            email: email.to_string(),
            salt,
            password_hash,
        });
        Ok(())
    }

    pub fn get(&self, email: &str) -> Option<&User> {
        self.users.iter().find(|u| u.email == email)
    }
}
