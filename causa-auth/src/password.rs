use bcrypt::hash;

use crate::error::AuthError;

pub use bcrypt::DEFAULT_COST;

pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    hash(password, cost).map_err(|e| AuthError::Hash(e.to_string()))
}

/// Login checks happen upstream; tests use this to confirm what was stored.
#[cfg(test)]
pub(crate) fn verify_password(password: &str, hashed: &str) -> bool {
    bcrypt::verify(password, hashed).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_verify_and_never_echo_the_password() {
        let hashed = hash_password("s3cret!", 4).unwrap();
        assert_ne!(hashed, "s3cret!");
        assert!(verify_password("s3cret!", &hashed));
        assert!(!verify_password("wrong", &hashed));
        assert!(!verify_password("s3cret!", "not-a-hash"));
    }
}
