use std::collections::HashSet;

use crate::models::{FeedItem, FeedPage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    /// No page has been loaded yet
    Loading,
    /// First page arrived and the feed has no items
    Empty,
    Ready { has_more: bool },
}

/// Loaded pages and read/unread bookkeeping for the subscription feed.
///
/// Pages are append-only. Items are not de-duplicated across pages; the
/// server is trusted not to repeat items across cursors.
///
/// Ids opened locally are remembered for the whole session, across
/// [`reset`](Self::reset), and applied to every page as it arrives.
#[derive(Debug, Default)]
pub struct FeedStore {
    pages: Vec<FeedPage>,
    unread_count: u32,
    opened: HashSet<String>,
}

impl FeedStore {
    pub fn new(unread_count: u32) -> Self {
        Self {
            pages: Vec::new(),
            unread_count,
            opened: HashSet::new(),
        }
    }

    // ===== Getters =====

    pub fn pages(&self) -> &[FeedPage] {
        &self.pages
    }

    /// All loaded items in server order.
    pub fn items(&self) -> impl Iterator<Item = &FeedItem> {
        self.pages.iter().flat_map(|p| p.items.iter())
    }

    pub fn flattened(&self) -> Vec<FeedItem> {
        self.items().cloned().collect()
    }

    pub fn item_count(&self) -> usize {
        self.pages.iter().map(|p| p.items.len()).sum()
    }

    pub fn get(&self, id: &str) -> Option<&FeedItem> {
        self.items().find(|i| i.id == id)
    }

    pub fn unread_count(&self) -> u32 {
        self.unread_count
    }

    /// Cursor for the next request. `None` before the first page and after the last.
    pub fn next_cursor(&self) -> Option<&str> {
        self.pages.last().and_then(|p| p.next_cursor.as_deref())
    }

    pub fn is_started(&self) -> bool {
        !self.pages.is_empty()
    }

    pub fn has_more(&self) -> bool {
        !self.is_started() || self.next_cursor().is_some()
    }

    pub fn status(&self) -> FeedStatus {
        if !self.is_started() {
            FeedStatus::Loading
        } else if self.item_count() == 0 {
            FeedStatus::Empty
        } else {
            FeedStatus::Ready {
                has_more: self.next_cursor().is_some(),
            }
        }
    }

    // ===== Mutations =====

    pub fn set_unread_count(&mut self, count: u32) {
        self.unread_count = count;
    }

    /// Append a page, flagging items already opened this session.
    /// Returns the page as stored.
    pub fn push_page(&mut self, mut page: FeedPage) -> &FeedPage {
        for item in page.items.iter_mut() {
            if self.opened.contains(&item.id) {
                item.clicked_locally = true;
            }
        }
        self.pages.push(page);
        &self.pages[self.pages.len() - 1]
    }

    pub fn is_opened(&self, id: &str) -> bool {
        self.opened.contains(id)
    }

    /// Mark an item as opened locally. Returns whether the unread counter changed.
    ///
    /// Every loaded copy of the id is flagged. Only the first open of an id the
    /// server reported unseen decrements the counter.
    pub fn mark_opened(&mut self, id: &str) -> bool {
        let mut found = false;
        let mut was_unread = false;
        for item in self
            .pages
            .iter_mut()
            .flat_map(|p| p.items.iter_mut())
            .filter(|i| i.id == id)
        {
            found = true;
            was_unread |= item.is_unread();
            item.clicked_locally = true;
        }

        if !found || !self.opened.insert(id.to_string()) {
            return false;
        }
        if was_unread && self.unread_count > 0 {
            self.unread_count -= 1;
            return true;
        }
        false
    }

    /// Drop all pages. Opened ids are kept.
    pub fn reset(&mut self) {
        self.pages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(items: &[(&str, bool)], cursor: Option<&str>) -> FeedPage {
        FeedPage::new(
            items.iter().map(|(id, seen)| FeedItem::new(*id, *seen)).collect(),
            cursor,
        )
    }

    #[test]
    fn test_status_transitions() {
        let mut store = FeedStore::new(0);
        assert_eq!(store.status(), FeedStatus::Loading);
        assert!(store.has_more());

        store.push_page(page(&[], Some("c1")));
        assert_eq!(store.status(), FeedStatus::Empty);
        assert!(store.has_more());

        store.push_page(page(&[("a", true)], None));
        assert_eq!(store.status(), FeedStatus::Ready { has_more: false });
        assert!(!store.has_more());
    }

    #[test]
    fn test_items_preserve_page_order() {
        let mut store = FeedStore::new(0);
        store.push_page(page(&[("a", true), ("b", true)], Some("c1")));
        store.push_page(page(&[("c", true)], None));
        let ids: Vec<_> = store.items().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let mut store = FeedStore::new(0);
        store.push_page(page(&[("a", true)], Some("c1")));
        store.push_page(page(&[("a", true)], None));
        assert_eq!(store.item_count(), 2);
    }

    #[test]
    fn test_mark_opened_decrements_once() {
        let mut store = FeedStore::new(2);
        store.push_page(page(&[("a", false), ("b", false)], None));

        assert!(store.mark_opened("a"));
        assert!(!store.mark_opened("a"));
        assert_eq!(store.unread_count(), 1);
        assert!(!store.get("a").unwrap().is_unread());
    }

    #[test]
    fn test_mark_opened_seen_item_keeps_count() {
        let mut store = FeedStore::new(1);
        store.push_page(page(&[("a", true)], None));

        assert!(!store.mark_opened("a"));
        assert_eq!(store.unread_count(), 1);
        assert!(store.get("a").unwrap().clicked_locally);
    }

    #[test]
    fn test_mark_opened_never_underflows() {
        let mut store = FeedStore::new(0);
        store.push_page(page(&[("a", false)], None));
        assert!(!store.mark_opened("a"));
        assert_eq!(store.unread_count(), 0);
    }

    #[test]
    fn test_mark_opened_unknown_id() {
        let mut store = FeedStore::new(3);
        assert!(!store.mark_opened("missing"));
        assert_eq!(store.unread_count(), 3);
    }

    #[test]
    fn test_reset_keeps_opened_ids() {
        let mut store = FeedStore::new(1);
        store.push_page(page(&[("a", false), ("b", true)], Some("c1")));
        store.mark_opened("a");

        store.reset();
        assert_eq!(store.status(), FeedStatus::Loading);
        assert!(store.is_opened("a"));
        assert!(!store.is_opened("b"));

        let stored = store.push_page(page(&[("a", false), ("b", false)], None));
        assert!(stored.items[0].clicked_locally);
        assert!(!stored.items[1].clicked_locally);
        assert!(!store.mark_opened("a"));
        assert_eq!(store.unread_count(), 0);
    }

    #[test]
    fn test_mark_opened_flags_every_copy() {
        let mut store = FeedStore::new(2);
        store.push_page(page(&[("a", false)], Some("c1")));
        store.push_page(page(&[("a", false), ("b", false)], None));

        assert!(store.mark_opened("a"));
        assert_eq!(store.unread_count(), 1);
        assert!(store.items().filter(|i| i.id == "a").all(|i| !i.is_unread()));
        assert!(!store.mark_opened("a"));
        assert_eq!(store.unread_count(), 1);
    }
}
