//! Cursor pagination over the subscription message feed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::api::{ApiError, FeedSource};
use crate::models::{FeedItem, FeedPage};
use crate::store::{FeedStatus, FeedStore};

const CHANGE_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("Failed to load feed page: {0}")]
    Fetch(#[from] ApiError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// A page was fetched and appended
    Loaded(FeedPage),
    /// Another request for this feed is still outstanding; nothing was sent
    InFlight,
    /// The last page had no cursor; nothing was sent
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedChange {
    PageLoaded { items: usize, has_more: bool },
    UnreadCount(u32),
    Reset,
}

/// Clears the in-flight flag when a request finishes or is dropped.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct FeedPaginator {
    source: Arc<dyn FeedSource>,
    store: Mutex<FeedStore>,
    in_flight: AtomicBool,
    changes: broadcast::Sender<FeedChange>,
}

impl FeedPaginator {
    pub fn new(source: Arc<dyn FeedSource>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            source,
            store: Mutex::new(FeedStore::default()),
            in_flight: AtomicBool::new(false),
            changes,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FeedChange> {
        self.changes.subscribe()
    }

    // ===== Getters =====

    pub fn status(&self) -> FeedStatus {
        self.store.lock().status()
    }

    pub fn items(&self) -> Vec<FeedItem> {
        self.store.lock().flattened()
    }

    pub fn unread_count(&self) -> u32 {
        self.store.lock().unread_count()
    }

    pub fn next_cursor(&self) -> Option<String> {
        self.store.lock().next_cursor().map(str::to_string)
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Whether an infinite-scroll consumer should request another page.
    /// False while loading, for an empty feed, and once the cursor is exhausted.
    pub fn should_auto_fetch(&self) -> bool {
        !self.is_loading() && self.status() == FeedStatus::Ready { has_more: true }
    }

    // ===== Operations =====

    /// Initialize the unread counter from server data.
    pub fn set_unread_count(&self, count: u32) {
        self.store.lock().set_unread_count(count);
        self.notify(FeedChange::UnreadCount(count));
    }

    /// Fetch the next page and append it.
    ///
    /// On failure the feed is left untouched so the caller can retry.
    pub async fn load_next(&self) -> Result<LoadOutcome, FeedError> {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            tracing::debug!("feed: load skipped, request in flight");
            return Ok(LoadOutcome::InFlight);
        };

        let cursor = {
            let store = self.store.lock();
            if !store.has_more() {
                return Ok(LoadOutcome::Exhausted);
            }
            store.next_cursor().map(str::to_string)
        };

        let page = self.fetch(cursor.as_deref()).await?;
        let (items, has_more) = (page.items.len(), page.has_more());
        let page = self.store.lock().push_page(page).clone();
        self.notify(FeedChange::PageLoaded { items, has_more });
        Ok(LoadOutcome::Loaded(page))
    }

    /// Reload from the first page, keeping the local "opened" state of items
    /// that come back.
    pub async fn refresh(&self) -> Result<LoadOutcome, FeedError> {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            return Ok(LoadOutcome::InFlight);
        };

        let page = self.fetch(None).await?;
        let (items, has_more) = (page.items.len(), page.has_more());
        let page = {
            let mut store = self.store.lock();
            store.reset();
            store.push_page(page).clone()
        };
        self.notify(FeedChange::Reset);
        self.notify(FeedChange::PageLoaded { items, has_more });
        Ok(LoadOutcome::Loaded(page))
    }

    /// Mark an item as opened. Idempotent; returns whether the unread counter changed.
    pub fn mark_opened(&self, item_id: &str) -> bool {
        let (changed, count) = {
            let mut store = self.store.lock();
            (store.mark_opened(item_id), store.unread_count())
        };
        if changed {
            self.notify(FeedChange::UnreadCount(count));
        }
        changed
    }

    async fn fetch(&self, cursor: Option<&str>) -> Result<FeedPage, FeedError> {
        match self.source.messages(cursor).await {
            Ok(page) => {
                tracing::debug!(
                    cursor = cursor.unwrap_or_default(),
                    items = page.items.len(),
                    has_more = page.has_more(),
                    "feed: page loaded"
                );
                Ok(page)
            }
            Err(e) => {
                tracing::warn!(cursor = cursor.unwrap_or_default(), error = %e, "feed: page load failed");
                Err(e.into())
            }
        }
    }

    fn notify(&self, change: FeedChange) {
        let _ = self.changes.send(change);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::{HashMap, VecDeque};
    use tokio::sync::Notify;

    /// Serves pages keyed by cursor ("" = first page) and records requests.
    #[derive(Default)]
    struct FakeFeed {
        pages: HashMap<String, FeedPage>,
        failures: Mutex<VecDeque<String>>,
        requests: Mutex<Vec<Option<String>>>,
        gate: Option<Arc<Notify>>,
    }

    impl FakeFeed {
        fn page(mut self, cursor: &str, items: &[(&str, bool)], next: Option<&str>) -> Self {
            let items = items.iter().map(|(id, seen)| FeedItem::new(*id, *seen)).collect();
            self.pages.insert(cursor.to_string(), FeedPage::new(items, next));
            self
        }

        fn fail_next(&self, cursor: &str) {
            self.failures.lock().push_back(cursor.to_string());
        }

        fn requests(&self) -> Vec<Option<String>> {
            self.requests.lock().clone()
        }
    }

    #[async_trait]
    impl FeedSource for FakeFeed {
        async fn messages(&self, cursor: Option<&str>) -> Result<FeedPage, ApiError> {
            self.requests.lock().push(cursor.map(str::to_string));
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            let key = cursor.unwrap_or_default();
            {
                let mut failures = self.failures.lock();
                if failures.front().map(String::as_str) == Some(key) {
                    failures.pop_front();
                    return Err(ApiError::Status { status: 503, body: "unavailable".into() });
                }
            }
            Ok(self.pages.get(key).cloned().unwrap_or_default())
        }
    }

    fn ids(paginator: &FeedPaginator) -> Vec<String> {
        paginator.items().into_iter().map(|i| i.id).collect()
    }

    #[tokio::test]
    async fn test_pages_are_appended_in_order() {
        let feed = Arc::new(
            FakeFeed::default()
                .page("", &[("a", true), ("b", true)], Some("c1"))
                .page("c1", &[("c", true)], None),
        );
        let paginator = FeedPaginator::new(feed.clone());

        paginator.load_next().await.unwrap();
        paginator.load_next().await.unwrap();

        assert_eq!(ids(&paginator), vec!["a", "b", "c"]);
        assert_eq!(feed.requests(), vec![None, Some("c1".to_string())]);
    }

    #[tokio::test]
    async fn test_empty_page_with_cursor_keeps_going() {
        let feed = Arc::new(
            FakeFeed::default()
                .page("", &[], Some("c1"))
                .page("c1", &[("a", true)], None),
        );
        let paginator = FeedPaginator::new(feed);

        paginator.load_next().await.unwrap();
        assert_eq!(paginator.status(), FeedStatus::Empty);
        assert!(!paginator.should_auto_fetch());

        let outcome = paginator.load_next().await.unwrap();
        assert!(matches!(outcome, LoadOutcome::Loaded(_)));
        assert_eq!(paginator.status(), FeedStatus::Ready { has_more: false });

        assert_eq!(paginator.load_next().await.unwrap(), LoadOutcome::Exhausted);
    }

    #[tokio::test]
    async fn test_concurrent_load_is_dropped() {
        let gate = Arc::new(Notify::new());
        let feed = Arc::new(FakeFeed {
            gate: Some(gate.clone()),
            ..FakeFeed::default().page("", &[("a", false)], Some("c1"))
        });
        let paginator = FeedPaginator::new(feed.clone());

        let release = async {
            tokio::task::yield_now().await;
            gate.notify_one();
        };
        let (first, second, _) = tokio::join!(paginator.load_next(), paginator.load_next(), release);

        assert!(matches!(first.unwrap(), LoadOutcome::Loaded(_)));
        assert_eq!(second.unwrap(), LoadOutcome::InFlight);
        assert_eq!(feed.requests().len(), 1);
        assert!(!paginator.is_loading());
    }

    #[tokio::test]
    async fn test_failure_leaves_state_unchanged() {
        let feed = Arc::new(
            FakeFeed::default()
                .page("", &[("a", true)], Some("c1"))
                .page("c1", &[("b", true)], None),
        );
        let paginator = FeedPaginator::new(feed.clone());
        paginator.load_next().await.unwrap();

        feed.fail_next("c1");
        assert!(paginator.load_next().await.is_err());
        assert_eq!(ids(&paginator), vec!["a"]);
        assert_eq!(paginator.next_cursor().as_deref(), Some("c1"));
        assert!(!paginator.is_loading());

        paginator.load_next().await.unwrap();
        assert_eq!(ids(&paginator), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_first_page_failure_stays_loading() {
        let feed = Arc::new(FakeFeed::default().page("", &[("a", true)], None));
        feed.fail_next("");
        let paginator = FeedPaginator::new(feed);

        assert!(paginator.load_next().await.is_err());
        assert_eq!(paginator.status(), FeedStatus::Loading);
    }

    #[tokio::test]
    async fn test_mark_opened_is_idempotent() {
        let feed = Arc::new(FakeFeed::default().page("", &[("a", false), ("b", true)], None));
        let paginator = FeedPaginator::new(feed);
        paginator.set_unread_count(1);
        paginator.load_next().await.unwrap();

        assert!(!paginator.mark_opened("b"));
        assert_eq!(paginator.unread_count(), 1);

        assert!(paginator.mark_opened("a"));
        assert!(!paginator.mark_opened("a"));
        assert_eq!(paginator.unread_count(), 0);
    }

    #[tokio::test]
    async fn test_refresh_keeps_opened_items() {
        let feed = Arc::new(
            FakeFeed::default()
                .page("", &[("a", false), ("b", false)], Some("c1"))
                .page("c1", &[("c", false)], None),
        );
        let paginator = FeedPaginator::new(feed);
        paginator.set_unread_count(3);
        paginator.load_next().await.unwrap();
        paginator.load_next().await.unwrap();
        paginator.mark_opened("a");

        paginator.refresh().await.unwrap();
        assert_eq!(ids(&paginator), vec!["a", "b"]);
        assert!(!paginator.mark_opened("a"));
        assert_eq!(paginator.unread_count(), 2);
    }

    #[tokio::test]
    async fn test_refresh_remembers_items_on_later_pages() {
        let feed = Arc::new(
            FakeFeed::default()
                .page("", &[("a", false)], Some("c1"))
                .page("c1", &[("c", false)], None),
        );
        let paginator = FeedPaginator::new(feed);
        paginator.set_unread_count(2);
        paginator.load_next().await.unwrap();
        paginator.load_next().await.unwrap();
        assert!(paginator.mark_opened("c"));
        assert_eq!(paginator.unread_count(), 1);

        paginator.refresh().await.unwrap();
        match paginator.load_next().await.unwrap() {
            LoadOutcome::Loaded(page) => assert!(!page.items[0].is_unread()),
            other => panic!("expected a page, got {:?}", other),
        }

        assert!(!paginator.mark_opened("c"));
        assert_eq!(paginator.unread_count(), 1);
    }

    #[tokio::test]
    async fn test_change_notifications() {
        let feed = Arc::new(FakeFeed::default().page("", &[("a", false)], None));
        let paginator = FeedPaginator::new(feed);
        let mut changes = paginator.subscribe();

        paginator.set_unread_count(1);
        paginator.load_next().await.unwrap();
        paginator.mark_opened("a");
        paginator.mark_opened("a");

        assert_eq!(changes.try_recv().unwrap(), FeedChange::UnreadCount(1));
        assert_eq!(
            changes.try_recv().unwrap(),
            FeedChange::PageLoaded { items: 1, has_more: false }
        );
        assert_eq!(changes.try_recv().unwrap(), FeedChange::UnreadCount(0));
        assert!(changes.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_read_then_paginate_to_end() {
        let feed = Arc::new(
            FakeFeed::default()
                .page("", &[("a", false)], Some("x"))
                .page("x", &[("b", true)], None),
        );
        let paginator = FeedPaginator::new(feed.clone());
        paginator.set_unread_count(1);

        paginator.load_next().await.unwrap();
        assert_eq!(paginator.unread_count(), 1);
        assert!(paginator.should_auto_fetch());

        paginator.mark_opened("a");
        assert_eq!(paginator.unread_count(), 0);

        paginator.load_next().await.unwrap();
        assert_eq!(ids(&paginator), vec!["a", "b"]);
        assert!(paginator.next_cursor().is_none());

        assert_eq!(paginator.load_next().await.unwrap(), LoadOutcome::Exhausted);
        assert_eq!(feed.requests().len(), 2);
    }
}
