//! Key resolution against the remote key set
//!
//! The resolver is the innermost stage of the lookup chain. Every call makes
//! exactly one round trip to the key source.

use crate::error::{Error, Result};
use crate::jwks::jwk::{Jwk, SigningKey};
use crate::jwks::{filter_signing_keys, select_signing_key};
use crate::lookup::Lookup;
use crate::source::KeySource;
use async_trait::async_trait;

/// Resolves keys straight from the endpoint, without caching
pub(crate) struct Resolver {
    source: KeySource,
}

impl Resolver {
    pub(crate) fn new(source: KeySource) -> Self {
        Self { source }
    }

    /// Fetch every published key
    pub(crate) async fn get_keys(&self) -> Result<Vec<Jwk>> {
        tracing::debug!(uri = self.source.uri(), "fetching keys");
        match self.source.fetch().await {
            Ok(set) => Ok(set.keys),
            Err(err) => {
                tracing::debug!(uri = self.source.uri(), error = %err, "failed to fetch keys");
                Err(err)
            }
        }
    }

    /// Fetch the keys usable for signature verification
    pub(crate) async fn get_signing_keys(&self) -> Result<Vec<SigningKey>> {
        let keys = self.get_keys().await?;
        if keys.is_empty() {
            return Err(Error::Jwks(
                "The JWKS endpoint did not contain any keys".into(),
            ));
        }

        let signing_keys = filter_signing_keys(&keys);
        if signing_keys.is_empty() {
            return Err(Error::Jwks(
                "The JWKS endpoint did not contain any signing keys".into(),
            ));
        }

        tracing::debug!(count = signing_keys.len(), "signing keys");
        Ok(signing_keys)
    }

    /// Fetch the signing key matching `kid`
    pub(crate) async fn get_signing_key(&self, kid: Option<&str>) -> Result<SigningKey> {
        let keys = self.get_signing_keys().await?;
        let key = select_signing_key(&keys, kid);
        if key.is_err() {
            tracing::warn!(kid, "no signing key matches the requested kid");
        }
        key
    }
}

#[async_trait]
impl Lookup for Resolver {
    async fn lookup(&self, kid: Option<&str>) -> Result<SigningKey> {
        self.get_signing_key(kid).await
    }
}
