/// Credential handling: digest passhash, input validation, login check
use crate::db::user_repo;
use crate::error::Result;
use crate::models::User;
use lazy_static::lazy_static;
use regex::Regex;
use sha2::{Digest, Sha512};
use sqlx::PgPool;

lazy_static! {
    static ref ACCOUNT_NAME_RE: Regex =
        Regex::new(r"^[0-9a-zA-Z_]{3,}$").expect("invalid account name regex");
    static ref PASSWORD_RE: Regex =
        Regex::new(r"^[0-9a-zA-Z_]{6,}$").expect("invalid password regex");
}

/// Lowercase hex SHA-512 of the input.
pub fn digest(src: &str) -> String {
    hex::encode(Sha512::digest(src.as_bytes()))
}

fn calculate_salt(account_name: &str) -> String {
    digest(account_name)
}

/// Salted passhash: `sha512(password ":" sha512(account_name))`.
pub fn calculate_passhash(account_name: &str, password: &str) -> String {
    digest(&format!("{}:{}", password, calculate_salt(account_name)))
}

/// Account names are word characters, 3 or more; passwords 6 or more.
pub fn validate_user(account_name: &str, password: &str) -> bool {
    ACCOUNT_NAME_RE.is_match(account_name) && PASSWORD_RE.is_match(password)
}

/// Check credentials against active users. Wrong name and wrong password are
/// indistinguishable to the caller.
pub async fn try_login(
    pool: &PgPool,
    account_name: &str,
    password: &str,
) -> Result<Option<User>> {
    let Some(user) = user_repo::find_active_by_account_name(pool, account_name).await? else {
        return Ok(None);
    };

    if calculate_passhash(&user.account_name, password) == user.passhash {
        Ok(Some(user))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_lowercase_hex_sha512() {
        let d = digest("hello");
        assert_eq!(d.len(), 128);
        assert_eq!(d, d.to_lowercase());
        // SHA-512("hello"), well-known vector
        assert!(d.starts_with("9b71d224bd62f378"));
    }

    #[test]
    fn passhash_is_deterministic_and_salted_by_account_name() {
        let a = calculate_passhash("alice", "secret_password");
        let b = calculate_passhash("alice", "secret_password");
        let c = calculate_passhash("bob", "secret_password");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn validate_user_enforces_shape_and_length() {
        assert!(validate_user("abc", "secret"));
        assert!(validate_user("user_123", "longer_password"));
        assert!(!validate_user("ab", "secret"));
        assert!(!validate_user("abc", "short"));
        assert!(!validate_user("has space", "secret"));
        assert!(!validate_user("abc", "pass word"));
    }
}
