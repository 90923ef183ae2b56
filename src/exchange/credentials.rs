//! API credentials and the required-credential gate.

use std::collections::BTreeSet;

use serde::Deserialize;

use crate::error::CredentialError;

/// A credential a client may require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Credential {
    ApiKey,
    Secret,
    Uid,
    Login,
    Password,
    Twofa,
    PrivateKey,
    WalletAddress,
    Token,
}

impl Credential {
    pub const ALL: [Credential; 9] = [
        Credential::ApiKey,
        Credential::Secret,
        Credential::Uid,
        Credential::Login,
        Credential::Password,
        Credential::Twofa,
        Credential::PrivateKey,
        Credential::WalletAddress,
        Credential::Token,
    ];

    /// Key as used in settings files (`apiKey`, `privateKey`, ...).
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::ApiKey => "apiKey",
            Self::Secret => "secret",
            Self::Uid => "uid",
            Self::Login => "login",
            Self::Password => "password",
            Self::Twofa => "twofa",
            Self::PrivateKey => "privateKey",
            Self::WalletAddress => "walletAddress",
            Self::Token => "token",
        }
    }

    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|credential| credential.key() == key)
    }

    /// Environment variable consulted for this credential,
    /// e.g. `KRAKEN_APIKEY`.
    #[must_use]
    pub fn env_var(self, exchange_id: &str) -> String {
        format!("{}_{}", exchange_id, self.key()).to_uppercase()
    }
}

/// Credentials a client insists on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequiredCredentials(BTreeSet<Credential>);

impl RequiredCredentials {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, credential: Credential) -> Self {
        self.0.insert(credential);
        self
    }

    #[must_use]
    pub fn contains(&self, credential: Credential) -> bool {
        self.0.contains(&credential)
    }

    pub fn iter(&self) -> impl Iterator<Item = Credential> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Credential> for RequiredCredentials {
    fn from_iter<I: IntoIterator<Item = Credential>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'de> Deserialize<'de> for RequiredCredentials {
    /// Accepts the `{ "apiKey": true, "secret": false }` map form.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = std::collections::HashMap::<String, bool>::deserialize(deserializer)?;
        Ok(raw
            .into_iter()
            .filter(|(_, required)| *required)
            .filter_map(|(key, _)| Credential::from_key(&key))
            .collect())
    }
}

/// Credential values held by a client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: Option<String>,
    pub secret: Option<String>,
    pub uid: Option<String>,
    pub login: Option<String>,
    pub password: Option<String>,
    pub twofa: Option<String>,
    pub private_key: Option<String>,
    pub wallet_address: Option<String>,
    pub token: Option<String>,
}

impl Credentials {
    #[must_use]
    pub fn get(&self, credential: Credential) -> Option<&str> {
        let value = match credential {
            Credential::ApiKey => &self.api_key,
            Credential::Secret => &self.secret,
            Credential::Uid => &self.uid,
            Credential::Login => &self.login,
            Credential::Password => &self.password,
            Credential::Twofa => &self.twofa,
            Credential::PrivateKey => &self.private_key,
            Credential::WalletAddress => &self.wallet_address,
            Credential::Token => &self.token,
        };
        value.as_deref()
    }

    pub fn set(&mut self, credential: Credential, value: String) {
        let slot = match credential {
            Credential::ApiKey => &mut self.api_key,
            Credential::Secret => &mut self.secret,
            Credential::Uid => &mut self.uid,
            Credential::Login => &mut self.login,
            Credential::Password => &mut self.password,
            Credential::Twofa => &mut self.twofa,
            Credential::PrivateKey => &mut self.private_key,
            Credential::WalletAddress => &mut self.wallet_address,
            Credential::Token => &mut self.token,
        };
        *slot = Some(value);
    }

    /// True when the client can attempt authenticated calls: it holds a
    /// private key or a non-empty API key.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        let present = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.is_empty());
        present(&self.private_key) || present(&self.api_key)
    }

    /// Fail on the first required credential that is absent or empty.
    pub fn check_required(
        &self,
        exchange: &str,
        required: &RequiredCredentials,
    ) -> Result<(), CredentialError> {
        for credential in required.iter() {
            if self.get(credential).map_or(true, str::is_empty) {
                return Err(CredentialError::Missing {
                    exchange: exchange.to_string(),
                    credential: credential.key(),
                });
            }
        }
        Ok(())
    }
}
