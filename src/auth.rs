// src/auth.rs
//! Admin access: a static bearer token for the consultation log and
//! email/password login against the admin directory.

use axum::http::{header::AUTHORIZATION, HeaderMap};
use sha2::{Digest, Sha256};

use crate::store::{AdminDirectory, StoreResult};

pub fn sha256_hex(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    let mut out = String::with_capacity(64);
    for b in digest.iter() {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

// Compare digests so the comparison time does not depend on where the inputs differ.
fn digest_eq(a: &str, b: &str) -> bool {
    Sha256::digest(a.as_bytes()) == Sha256::digest(b.as_bytes())
}

/// True when `Authorization: Bearer <token>` matches `expected`.
/// With no configured token every request is rejected.
pub fn bearer_matches(headers: &HeaderMap, expected: Option<&str>) -> bool {
    let Some(token) = expected else {
        return false;
    };
    let Some(value) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    digest_eq(value, &format!("Bearer {token}"))
}

/// Check credentials. `Ok(false)` covers both unknown email and wrong password.
pub async fn verify_login<A>(directory: &A, email: &str, password: &str) -> StoreResult<bool>
where
    A: AdminDirectory + ?Sized,
{
    let Some(admin) = directory.find_admin(email.trim()).await? else {
        return Ok(false);
    };
    Ok(digest_eq(
        &sha256_hex(password),
        &admin.password_sha256.to_ascii_lowercase(),
    ))
}
