//! In-memory copy of the caller's bookmarks and categories.
//!
//! Nothing here is reconciled against the service: after a mutation the
//! caller either applies the same change locally or calls
//! [`ViewState::refresh`] to re-fetch both lists.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use super::{BookmarkApi, CategoryApi, ClientError};
use crate::model::{Bookmark, Category};

pub trait Entry: Clone {
    fn key(&self) -> &str;
    fn name(&self) -> &str;
    fn created(&self) -> DateTime<Utc>;
}

impl Entry for Bookmark {
    fn key(&self) -> &str {
        &self.bookmark_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn created(&self) -> DateTime<Utc> {
        self.create_date
    }
}

impl Entry for Category {
    fn key(&self) -> &str {
        &self.category_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn created(&self) -> DateTime<Utc> {
        self.create_date
    }
}

/// Display order: name (case-insensitive), then creation date.
fn display_order<T: Entry>(a: &T, b: &T) -> Ordering {
    a.name()
        .to_lowercase()
        .cmp(&b.name().to_lowercase())
        .then_with(|| a.created().cmp(&b.created()))
}

#[derive(Debug, Clone)]
pub struct Collection<T> {
    items: Vec<T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Entry> Collection<T> {
    /// Raw items in insertion order.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// A sorted copy; the stored order is left alone.
    pub fn get(&self) -> Vec<T> {
        let mut sorted = self.items.clone();
        sorted.sort_by(display_order);
        sorted
    }

    pub fn find(&self, key: &str) -> Option<&T> {
        self.items.iter().find(|item| item.key() == key)
    }

    pub fn add(&mut self, items: Vec<T>) {
        self.items.extend(items);
    }

    /// Replaces the item with the same key, or appends it if unseen.
    pub fn update(&mut self, item: T) {
        match self.items.iter_mut().find(|existing| existing.key() == item.key()) {
            Some(existing) => *existing = item,
            None => self.items.push(item),
        }
    }

    pub fn delete(&mut self, keys: &[String]) {
        self.items.retain(|item| !keys.iter().any(|k| k == item.key()));
    }

    pub fn set(&mut self, items: Vec<T>) {
        self.items = items;
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub bookmarks: Collection<Bookmark>,
    pub categories: Collection<Category>,
}

impl ViewState {
    /// Drops the categories and every bookmark filed under them.
    pub fn delete_categories(&mut self, ids: &[String]) {
        self.categories.delete(ids);
        self.bookmarks.items.retain(|b| !ids.contains(&b.category_id));
    }

    /// Sorted bookmarks in any of `category_ids`; an empty selection means
    /// all bookmarks.
    pub fn bookmarks_in(&self, category_ids: &[String]) -> Vec<Bookmark> {
        let mut selected: Vec<Bookmark> = self
            .bookmarks
            .items
            .iter()
            .filter(|b| category_ids.is_empty() || category_ids.contains(&b.category_id))
            .cloned()
            .collect();
        selected.sort_by(display_order);
        selected
    }

    pub fn category_name(&self, category_id: &str) -> Option<&str> {
        self.categories.find(category_id).map(|c| c.name.as_str())
    }

    pub async fn refresh<A>(&mut self, api: &A) -> Result<(), ClientError>
    where
        A: BookmarkApi + CategoryApi + ?Sized,
    {
        let categories = api.list_categories().await?;
        let bookmarks = api.list_bookmarks().await?;
        tracing::debug!(
            categories = categories.len(),
            bookmarks = bookmarks.len(),
            "refreshed view state"
        );

        self.categories.set(categories);
        self.bookmarks.set(bookmarks);
        Ok(())
    }
}
