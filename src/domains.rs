//! Disposable domain pool and address generation.
//!
//! Address generation is purely local: no network call is made when creating
//! a new disposable address. The provider accepts any local part on its
//! domains, so an address exists as soon as someone mails it.
//!
//! # Example
//!
//! ```
//! use mailwatch::domains;
//!
//! assert!(domains::is_pool_domain("esiix.com"));
//! assert!(!domains::is_pool_domain("gmail.com"));
//!
//! let email = domains::generate_address(Some("abc"));
//! assert!(email.starts_with("abc"));
//! ```

use rand::seq::SliceRandom;
use rand::Rng;

/// Domains served by the upstream provider.
pub const DOMAINS: [&str; 7] = [
    "1secmail.com",
    "1secmail.org",
    "1secmail.net",
    "esiix.com",
    "wwjmp.com",
    "xojxe.com",
    "yoggm.com",
];

/// Target local-part length when filling with random characters.
const TARGET_LOCAL_LEN: usize = 8;

/// Minimum number of random characters appended after a prefix.
const MIN_RANDOM_CHARS: usize = 4;

const LOCAL_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Returns `true` if the domain belongs to the provider's pool.
#[must_use]
pub fn is_pool_domain(domain: &str) -> bool {
    DOMAINS.iter().any(|d| d.eq_ignore_ascii_case(domain))
}

/// Picks a random domain from the pool.
#[must_use]
pub fn random_domain() -> &'static str {
    DOMAINS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(DOMAINS[0])
}

/// Generates a random local part, optionally starting with a prefix.
///
/// Fills up to [`TARGET_LOCAL_LEN`] characters, always appending at least
/// [`MIN_RANDOM_CHARS`] random characters so two calls with the same prefix
/// collide only by chance.
#[must_use]
pub fn generate_local_part(prefix: Option<&str>) -> String {
    let mut local = prefix.unwrap_or_default().to_string();
    let fill = TARGET_LOCAL_LEN
        .saturating_sub(local.len())
        .max(MIN_RANDOM_CHARS);

    let mut rng = rand::thread_rng();
    for _ in 0..fill {
        let idx = rng.gen_range(0..LOCAL_CHARS.len());
        local.push(LOCAL_CHARS[idx] as char);
    }

    local
}

/// Generates a full disposable address on a random pool domain.
#[must_use]
pub fn generate_address(prefix: Option<&str>) -> String {
    format!("{}@{}", generate_local_part(prefix), random_domain())
}
