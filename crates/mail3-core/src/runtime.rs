use std::sync::Arc;

use anyhow::{Context, Result};
use futures::future::join_all;

use crate::api::Mail3Api;
use crate::avatar::AddressResolver;
use crate::config::ClientConfig;
use crate::feed::FeedPaginator;
use crate::models::AvatarResult;
use crate::share::ArticleShare;
use crate::store::AvatarCache;

/// One HTTP client, one avatar cache and one feed, wired from a [`ClientConfig`].
pub struct Mail3Runtime {
    config: ClientConfig,
    api: Arc<Mail3Api>,
    resolver: AddressResolver,
    feed: FeedPaginator,
}

impl Mail3Runtime {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let api = Arc::new(Mail3Api::new(&config).context("Failed to build API client")?);
        Ok(Self::with_api(config, api))
    }

    pub fn with_api(config: ClientConfig, api: Arc<Mail3Api>) -> Self {
        let cache = Arc::new(AvatarCache::new());
        let resolver = AddressResolver::new(api.clone(), cache, &config);
        let feed = FeedPaginator::new(api.clone());
        Self {
            config,
            api,
            resolver,
            feed,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn api(&self) -> &Arc<Mail3Api> {
        &self.api
    }

    pub fn resolver(&self) -> &AddressResolver {
        &self.resolver
    }

    pub fn feed(&self) -> &FeedPaginator {
        &self.feed
    }

    /// Resolve several avatars concurrently. Results keep the input order;
    /// repeated addresses share one lookup.
    pub async fn resolve_avatars(&self, addresses: &[String]) -> Vec<(String, AvatarResult)> {
        let lookups = addresses.iter().map(|address| async move {
            let result = self.resolver.resolve(address).await;
            (address.clone(), result)
        });
        join_all(lookups).await
    }

    pub fn article_share(&self, article_id: &str, text: &str) -> ArticleShare {
        ArticleShare::new(self.api.clone(), self.config.app_base(), article_id, text)
    }
}
