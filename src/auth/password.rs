use anyhow::Context;
use tracing::error;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Salted bcrypt hash of `plain` at the given work factor.
pub fn hash_password(plain: &str, cost: u32) -> anyhow::Result<String> {
    bcrypt::hash(plain, cost)
        .map_err(|e| {
            error!(error = %e, "bcrypt hash error");
            e
        })
        .context("hash password")
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    bcrypt::verify(plain, hash)
        .map_err(|e| {
            error!(error = %e, "bcrypt verify error");
            e
        })
        .context("verify password")
}
