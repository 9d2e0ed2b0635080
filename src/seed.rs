use thiserror::Error;

use crate::{
    models::NewUser,
    password::{self, PasswordError},
    repository::{RepoError, Repository},
};

/// Password shared by every demo account.
pub const DEMO_PASSWORD: &str = "password123";

/// (email, display name) of the demo accounts.
pub const DEMO_USERS: [(&str, &str); 2] = [
    ("john@example.com", "John Doe"),
    ("jane@example.com", "Jane Smith"),
];

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to hash demo password")]
    Hash(#[from] PasswordError),
    #[error("failed to insert demo users")]
    Repo(#[from] RepoError),
}

/// seed_demo_users
///
/// Inserts the demo accounts in one transaction, only if the users table is empty.
/// Returns how many users were inserted (0 when seeding was skipped).
pub async fn seed_demo_users(repo: &dyn Repository) -> Result<usize, SeedError> {
    if repo.count_users().await? > 0 {
        tracing::info!("users already exist, skipping seed");
        return Ok(0);
    }

    // One hash (and salt) per account, computed before the transaction opens.
    let mut users = Vec::with_capacity(DEMO_USERS.len());
    for (email, name) in DEMO_USERS {
        users.push(NewUser {
            email: email.to_string(),
            password_hash: password::hash_password_blocking(DEMO_PASSWORD.to_string()).await?,
            name: name.to_string(),
        });
    }

    let mut tx = repo.begin().await?;
    for user in users {
        tx.create_user(user).await?;
    }
    tx.commit().await?;

    tracing::info!(count = DEMO_USERS.len(), "seeded demo users");
    Ok(DEMO_USERS.len())
}
