//! Per-provider API credentials, loaded once at startup.

use std::fmt;

use crate::factory::ProviderKind;

/// The `user_id` / `user_secret` pair a provider expects as request headers.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub user_id: String,
    user_secret: String,
}

impl Credentials {
    pub fn new(user_id: impl Into<String>, user_secret: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            user_secret: user_secret.into(),
        }
    }

    pub fn user_secret(&self) -> &str {
        &self.user_secret
    }

    pub fn is_empty(&self) -> bool {
        self.user_id.is_empty() && self.user_secret.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user_id", &self.user_id)
            .field("user_secret", &"***")
            .finish()
    }
}

/// Credentials for every known provider.
#[derive(Debug, Clone, Default)]
pub struct ProviderCredentials {
    pub hsbc: Credentials,
    pub adcb: Credentials,
}

impl ProviderCredentials {
    pub fn for_kind(&self, kind: ProviderKind) -> &Credentials {
        match kind {
            ProviderKind::Hsbc => &self.hsbc,
            ProviderKind::Adcb => &self.adcb,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_secret() {
        let creds = Credentials::new("merchant", "s3cr3t");
        let printed = format!("{:?}", creds);
        assert!(printed.contains("merchant"));
        assert!(!printed.contains("s3cr3t"));
    }
}
