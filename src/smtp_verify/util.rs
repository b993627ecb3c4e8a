use rand::{Rng, distributions::Alphanumeric};

/// Lowercase alphanumeric token, at least 6 characters.
pub fn random_token(len: usize) -> String {
    let length = len.clamp(6, 32);
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(|byte| char::from(byte).to_ascii_lowercase())
        .collect()
}

/// Splits `local@domain` on the last `@`.
pub(crate) fn split_address(address: &str) -> Option<(&str, &str)> {
    address
        .rsplit_once('@')
        .filter(|(local, domain)| !local.is_empty() && !domain.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_lowercase_alphanumeric() {
        let token = random_token(8);
        assert_eq!(token.len(), 8);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        );
    }

    #[test]
    fn token_length_is_clamped() {
        assert_eq!(random_token(0).len(), 6);
        assert_eq!(random_token(100).len(), 32);
    }

    #[test]
    fn split_address_requires_both_parts() {
        assert_eq!(split_address("ana@acme.com"), Some(("ana", "acme.com")));
        assert_eq!(split_address("ana@"), None);
        assert_eq!(split_address("@acme.com"), None);
        assert_eq!(split_address("ana"), None);
    }
}
