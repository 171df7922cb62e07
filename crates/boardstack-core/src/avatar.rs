//! Gravatar URLs.

use sha2::{Digest, Sha256};

const GRAVATAR_BASE: &str = "https://www.gravatar.com/avatar";

/// Avatar URL for `email`, hashed as Gravatar expects (trimmed, lowercase).
pub fn gravatar_url(email: &str) -> String {
    let digest = Sha256::digest(email.trim().to_lowercase().as_bytes());
    format!("{}/{}?d=identicon", GRAVATAR_BASE, hex::encode(digest))
}
