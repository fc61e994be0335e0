//! Time-limited display URLs.
//!
//! URLs have the form `{base}/{key}?expires={unix-secs}&sig={hex}` where the
//! signature is a BLAKE3 keyed hash over `"{key}\n{expires}"`. Anyone holding
//! the signing key can verify a URL without a lookup.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use thiserror::Error;
use tracing::trace;

use notekeep_core::defaults::URL_SIGNING_CONTEXT;
use notekeep_core::{Error, Result};

/// Why a display URL was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UrlVerifyError {
    #[error("URL is not under the configured base")]
    ForeignBase,

    #[error("URL is missing the {0} parameter")]
    MissingParam(&'static str),

    #[error("URL has a malformed {0} parameter")]
    MalformedParam(&'static str),

    #[error("URL signature does not match")]
    BadSignature,

    #[error("URL expired at {0}")]
    Expired(DateTime<Utc>),
}

/// Issues and checks signed display URLs.
#[derive(Clone)]
pub struct UrlSigner {
    key: [u8; 32],
    base_url: String,
    ttl: Duration,
}

impl UrlSigner {
    /// Create a signer whose key is derived from `secret`.
    pub fn new(secret: &str, base_url: impl Into<String>, ttl: Duration) -> Self {
        Self {
            key: blake3::derive_key(URL_SIGNING_CONTEXT, secret.as_bytes()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ttl,
        }
    }

    /// Create a signer with a random key. URLs it issues stop verifying
    /// once the process exits.
    pub fn ephemeral(base_url: impl Into<String>, ttl: Duration) -> Self {
        let mut key = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut key);
        Self {
            key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a URL for `key` valid until `now + ttl`.
    ///
    /// Fails with [`Error::Storage`] when the expiry is not representable.
    pub fn sign(&self, key: &str, now: DateTime<Utc>) -> Result<String> {
        let expires = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| {
                Error::Storage(format!("display URL expiry for {} is out of range", key))
            })?
            .timestamp();
        let sig = self.signature(key, expires);
        trace!(subsystem = "storage", component = "url_signer", image_key = %key, expires, "Signed display URL");
        Ok(format!("{}/{}?expires={}&sig={}", self.base_url, key, expires, sig))
    }

    /// Check a URL issued by [`sign`](Self::sign) and return the storage key
    /// it grants access to.
    pub fn verify(
        &self,
        url: &str,
        now: DateTime<Utc>,
    ) -> std::result::Result<String, UrlVerifyError> {
        let rest = url
            .strip_prefix(&self.base_url)
            .and_then(|r| r.strip_prefix('/'))
            .ok_or(UrlVerifyError::ForeignBase)?;
        let (key, query) = rest
            .split_once('?')
            .ok_or(UrlVerifyError::MissingParam("expires"))?;

        let mut expires = None;
        let mut sig = None;
        for pair in query.split('&') {
            match pair.split_once('=') {
                Some(("expires", v)) => expires = Some(v),
                Some(("sig", v)) => sig = Some(v),
                _ => {}
            }
        }
        let expires: i64 = expires
            .ok_or(UrlVerifyError::MissingParam("expires"))?
            .parse()
            .map_err(|_| UrlVerifyError::MalformedParam("expires"))?;
        let sig = sig.ok_or(UrlVerifyError::MissingParam("sig"))?;
        let sig_bytes = hex::decode(sig).map_err(|_| UrlVerifyError::MalformedParam("sig"))?;
        let sig_bytes: [u8; 32] = sig_bytes
            .try_into()
            .map_err(|_| UrlVerifyError::MalformedParam("sig"))?;

        // blake3::Hash equality is constant-time.
        if blake3::Hash::from(sig_bytes) != self.mac(key, expires) {
            return Err(UrlVerifyError::BadSignature);
        }

        if now.timestamp() >= expires {
            let at = DateTime::<Utc>::from_timestamp(expires, 0).unwrap_or(now);
            return Err(UrlVerifyError::Expired(at));
        }

        Ok(key.to_string())
    }

    fn mac(&self, key: &str, expires: i64) -> blake3::Hash {
        let message = format!("{}\n{}", key, expires);
        blake3::keyed_hash(&self.key, message.as_bytes())
    }

    fn signature(&self, key: &str, expires: i64) -> String {
        self.mac(key, expires).to_hex().to_string()
    }
}

impl std::fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlSigner")
            .field("base_url", &self.base_url)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
