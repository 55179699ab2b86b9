use sha2::{Digest, Sha256};

/// SHA-256 over the headline set, independent of order and duplicates.
pub fn headline_digest(headlines: &[String]) -> String {
    let mut unique: Vec<&str> = headlines.iter().map(|h| h.trim()).collect();
    unique.sort_unstable();
    unique.dedup();

    let mut hasher = Sha256::new();
    for headline in unique {
        hasher.update(headline.as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}
