use parse_display::{Display, FromStr};
use serde::{Deserialize, Serialize};

use crate::StoreError;


/// Environment variable read by [`RegistryMode::from_env`].
pub const REGISTRY_MODE_ENV: &str = "SIGSYNC_REGISTRY_MODE";

/// Lifetime of the registry that stores are bound to.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, FromStr, Serialize, Deserialize,
)]
#[display(style = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RegistryMode {
    /// One registry shared by every caller on the thread, for long-lived processes.
    ///
    /// Repeated initialisation (for example a module being set up again after a reload)
    /// reuses the existing registry.
    #[default]
    Process,

    /// A fresh registry per unit of work, so that state never leaks between requests.
    Request,
}

impl RegistryMode {
    /// Reads the mode from `SIGSYNC_REGISTRY_MODE`, or returns the default when it is unset.
    pub fn from_env() -> Result<Self, StoreError> {
        match std::env::var(REGISTRY_MODE_ENV) {
            Ok(value) => Self::parse(&value),
            Err(std::env::VarError::NotPresent) => Ok(Self::default()),
            Err(std::env::VarError::NotUnicode(value)) => Err(StoreError::InvalidMode(
                value.to_string_lossy().into_owned(),
            )),
        }
    }

    pub fn parse(s: &str) -> Result<Self, StoreError> {
        s.trim()
            .parse()
            .map_err(|_| StoreError::InvalidMode(s.to_string()))
    }
}

/// Key and initial value of a store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig<T> {
    pub key: String,
    pub initial: T,
}

impl<T> SyncConfig<T> {
    pub fn new(key: impl Into<String>, initial: T) -> Self {
        Self {
            key: key.into(),
            initial,
        }
    }
}
