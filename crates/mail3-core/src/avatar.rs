//! Address → avatar image resolution.
//!
//! Lookups never fail from the caller's point of view: any remote error, a
//! missing avatar, or the server's default image all end in
//! `UsePlaceholder(Default)`.

use std::sync::Arc;

use tokio::sync::watch;

use crate::address::{classify, AddressKind};
use crate::api::{ApiError, AvatarSource};
use crate::config::ClientConfig;
use crate::models::{AvatarResult, PlaceholderKind};
use crate::store::{AvatarCache, AvatarEntry, Claim};

pub struct AddressResolver {
    source: Arc<dyn AvatarSource>,
    cache: Arc<AvatarCache>,
    alias_suffixes: Vec<String>,
    default_avatar_url: String,
}

impl AddressResolver {
    pub fn new(source: Arc<dyn AvatarSource>, cache: Arc<AvatarCache>, config: &ClientConfig) -> Self {
        Self {
            source,
            cache,
            alias_suffixes: config.alias_suffixes.clone(),
            default_avatar_url: config.default_avatar_url.clone(),
        }
    }

    pub fn cache(&self) -> &Arc<AvatarCache> {
        &self.cache
    }

    pub fn classify(&self, address: &str) -> AddressKind {
        classify(address, self.alias_suffixes.as_slice())
    }

    /// Current cached result without starting a lookup.
    pub fn peek(&self, address: &str) -> Option<AvatarResult> {
        self.cache.get(address.trim())
    }

    /// Use `url` for `address` from now on. No remote call is made.
    pub fn set_override(&self, address: &str, url: &str) {
        self.cache
            .set(address.trim(), AvatarEntry::Provided(url.to_string()));
    }

    /// Resolve with an optional caller-supplied image, which bypasses the lookup.
    pub async fn resolve_with(&self, address: &str, src: Option<&str>) -> AvatarResult {
        match src.filter(|s| !s.is_empty()) {
            Some(url) => {
                self.set_override(address, url);
                AvatarResult::UseProvidedOverride(url.to_string())
            }
            None => self.resolve(address).await,
        }
    }

    /// Resolve `address` to a terminal [`AvatarResult`].
    ///
    /// Concurrent calls for the same address share one remote lookup. The
    /// lookup runs on its own task, so it settles the cache even if every
    /// caller waiting on it is dropped.
    pub async fn resolve(&self, address: &str) -> AvatarResult {
        let address = address.trim();
        let kind = self.classify(address);
        if kind == AddressKind::Unsupported {
            return self
                .cache
                .insert_if_absent(address, AvatarEntry::Empty(PlaceholderKind::Unsupported));
        }

        match self.cache.claim(address) {
            Claim::Cached(result) => result,
            Claim::InFlight(rx) => self.settle(address, rx).await,
            Claim::Leader(rx) => {
                let source = self.source.clone();
                let cache = self.cache.clone();
                let default_avatar_url = self.default_avatar_url.clone();
                let key = address.to_string();
                tokio::spawn(async move {
                    let entry = lookup(source.as_ref(), &default_avatar_url, kind, &key).await;
                    cache.complete(&key, entry);
                });
                self.settle(address, rx).await
            }
        }
    }

    async fn settle(&self, address: &str, mut rx: watch::Receiver<AvatarEntry>) -> AvatarResult {
        match rx.wait_for(|entry| !entry.is_resolving()).await {
            Ok(entry) => entry.result(),
            // Cache was cleared under us; whatever is there now wins.
            Err(_) => self
                .cache
                .get(address)
                .filter(AvatarResult::is_terminal)
                .unwrap_or(AvatarResult::UsePlaceholder(PlaceholderKind::Default)),
        }
    }
}

async fn lookup(
    source: &dyn AvatarSource,
    default_avatar_url: &str,
    kind: AddressKind,
    address: &str,
) -> AvatarEntry {
    match fetch(source, kind, address).await {
        Ok(Some(url)) if url != default_avatar_url => AvatarEntry::Resolved(url),
        Ok(_) => {
            tracing::debug!(address, "avatar: no custom avatar");
            AvatarEntry::Empty(PlaceholderKind::Default)
        }
        Err(e) => {
            tracing::warn!(address, error = %e, "avatar: lookup failed, using placeholder");
            AvatarEntry::Empty(PlaceholderKind::Default)
        }
    }
}

async fn fetch(
    source: &dyn AvatarSource,
    kind: AddressKind,
    address: &str,
) -> Result<Option<String>, ApiError> {
    let canonical = match kind {
        AddressKind::Primitive => address.to_string(),
        AddressKind::Alias => source.primitive_address(address).await?,
        AddressKind::Unsupported => return Ok(None),
    };
    source.avatar(&canonical).await
}
