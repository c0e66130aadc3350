use secrecy::SecretString;

/// Secrets shared across actions. The refresh hash key falls back to the
/// signing secret when not set, so single-secret deployments stay simple.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub jwt_secret: SecretString,
    pub refresh_hash_key: SecretString,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(jwt_secret: SecretString, refresh_hash_key: Option<SecretString>) -> Self {
        let refresh_hash_key = refresh_hash_key.unwrap_or_else(|| jwt_secret.clone());

        Self {
            jwt_secret,
            refresh_hash_key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_global_args_fallback() {
        let args = GlobalArgs::new(SecretString::from("signing-secret"), None);
        assert_eq!(args.jwt_secret.expose_secret(), "signing-secret");
        assert_eq!(args.refresh_hash_key.expose_secret(), "signing-secret");
    }

    #[test]
    fn test_global_args_dedicated_hash_key() {
        let args = GlobalArgs::new(
            SecretString::from("signing-secret"),
            Some(SecretString::from("hash-key")),
        );
        assert_eq!(args.jwt_secret.expose_secret(), "signing-secret");
        assert_eq!(args.refresh_hash_key.expose_secret(), "hash-key");
    }
}
