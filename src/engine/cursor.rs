use super::model::{ContentItem, ItemId};

/// Position marker for the progress strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Seen,
    Current,
    Upcoming,
}

/// Ordered item sequence plus the current position.
///
/// Invariant: `0 <= cursor <= items.len()`. The active item is the one at
/// `cursor`; there is none once the cursor reaches the end.
#[derive(Debug, Default)]
pub struct FeedCursor {
    items: Vec<ContentItem>,
    cursor: usize,
}

impl FeedCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the sequence wholesale and rewind to the first item.
    pub fn load(&mut self, items: Vec<ContentItem>) {
        self.items = items;
        self.cursor = 0;
    }

    /// Move to the next item. Silently does nothing when exhausted.
    pub fn advance(&mut self) {
        if self.cursor < self.items.len() {
            self.cursor += 1;
        }
    }

    pub fn current(&self) -> Option<&ContentItem> {
        self.items.get(self.cursor)
    }

    pub fn current_id(&self) -> Option<&ItemId> {
        self.current().map(|item| &item.id)
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.items.len()
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }

    pub fn is_active(&self, id: &ItemId) -> bool {
        self.current_id() == Some(id)
    }

    /// Mutable access for in-place counter updates. Order is never changed.
    pub fn get_mut(&mut self, id: &ItemId) -> Option<&mut ContentItem> {
        self.items.iter_mut().find(|item| &item.id == id)
    }

    pub fn get(&self, id: &ItemId) -> Option<&ContentItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    pub fn progress(&self) -> Vec<Progress> {
        (0..self.items.len())
            .map(|i| match i.cmp(&self.cursor) {
                std::cmp::Ordering::Less => Progress::Seen,
                std::cmp::Ordering::Equal => Progress::Current,
                std::cmp::Ordering::Greater => Progress::Upcoming,
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::engine::model::{ItemCategory, Profile, UserId};

    pub(crate) fn item(id: &str) -> ContentItem {
        let owner_id = UserId::new(format!("owner-{id}"));
        ContentItem {
            id: ItemId::new(id),
            owner_id: owner_id.clone(),
            media_ref: format!("media/{id}"),
            title: Some(format!("Pitch {id}")),
            view_count: 0,
            like_count: 0,
            liked_by_viewer: false,
            category: ItemCategory::Pitch,
            owner: Profile::placeholder(owner_id),
        }
    }

    #[test]
    fn test_load_resets_cursor() {
        let mut cursor = FeedCursor::new();
        cursor.load(vec![item("a"), item("b")]);
        cursor.advance();
        assert_eq!(cursor.position(), 1);

        cursor.load(vec![item("c")]);
        assert_eq!(cursor.position(), 0);
        assert_eq!(cursor.current_id().map(ItemId::as_str), Some("c"));
    }

    #[test]
    fn test_advance_clamps_at_end() {
        let mut cursor = FeedCursor::new();
        cursor.load(vec![item("a"), item("b")]);
        cursor.advance();
        cursor.advance();
        assert!(cursor.is_exhausted());
        assert!(cursor.current().is_none());

        cursor.advance();
        assert_eq!(cursor.position(), 2);
    }

    #[test]
    fn test_empty_feed_is_exhausted() {
        let mut cursor = FeedCursor::new();
        cursor.load(Vec::new());
        assert!(cursor.is_exhausted());
        cursor.advance();
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_only_item_at_cursor_is_active() {
        let mut cursor = FeedCursor::new();
        cursor.load(vec![item("a"), item("b"), item("c")]);
        cursor.advance();
        let active: Vec<_> = cursor
            .items()
            .iter()
            .filter(|i| cursor.is_active(&i.id))
            .map(|i| i.id.as_str())
            .collect();
        assert_eq!(active, vec!["b"]);
    }

    #[test]
    fn test_progress_markers() {
        let mut cursor = FeedCursor::new();
        cursor.load(vec![item("a"), item("b"), item("c")]);
        cursor.advance();
        assert_eq!(
            cursor.progress(),
            vec![Progress::Seen, Progress::Current, Progress::Upcoming]
        );
    }
}
