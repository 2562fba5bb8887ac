//! In-memory book collection and the operations over it.
//!
//! The free functions ([`group_by_category`], [`search`], [`stats`]) are
//! pure and work on any slice. [`Catalog`] owns the loaded collection and
//! writes the whole file back after every mutation.

use std::collections::BTreeMap;

use serde::Serialize;
use uuid::Uuid;

use crate::error::{LibrisError, Result};
use crate::models::{Book, BookDraft, Category};
use crate::storage::json_store::JsonStore;

/// Shortest id prefix accepted by [`Catalog::resolve_id`].
pub const MIN_ID_PREFIX: usize = 4;

// ─── Grouping ──────────────────────────────────────────────

/// Books partitioned by shelf. Every [`Category`] is present, in
/// enumeration order, even when it holds no books.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CategoryGroups<'a> {
    groups: BTreeMap<Category, Vec<&'a Book>>,
}

impl<'a> CategoryGroups<'a> {
    pub fn get(&self, category: Category) -> &[&'a Book] {
        self.groups.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, &[&'a Book])> + '_ {
        self.groups.iter().map(|(c, books)| (*c, books.as_slice()))
    }

    /// Total number of books across all groups.
    pub fn total(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }
}

/// Partition `books` by category, keeping collection order inside each group.
///
/// Books whose category string is not a known [`Category`] are filed under
/// [`Category::FALLBACK`].
pub fn group_by_category(books: &[Book]) -> CategoryGroups<'_> {
    let mut groups: BTreeMap<Category, Vec<&Book>> =
        Category::ALL.iter().map(|c| (*c, Vec::new())).collect();
    for book in books {
        groups.entry(book.shelf()).or_default().push(book);
    }
    CategoryGroups { groups }
}

// ─── Search ────────────────────────────────────────────────

/// Books whose title or category contains `query`, ignoring case.
///
/// Results keep collection order. The query is used as given, whitespace
/// included; an empty query matches nothing.
pub fn search<'a>(books: &'a [Book], query: &str) -> Vec<&'a Book> {
    let needle = query.to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    books
        .iter()
        .filter(|b| {
            b.title.to_lowercase().contains(&needle) || b.category.to_lowercase().contains(&needle)
        })
        .collect()
}

// ─── Stats ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub total_books: usize,
    pub per_category: BTreeMap<Category, usize>,
    /// Books whose stored category is outside the fixed set.
    pub uncategorized: usize,
    pub oldest_year: Option<i32>,
    pub newest_year: Option<i32>,
}

pub fn stats(books: &[Book]) -> CatalogStats {
    let groups = group_by_category(books);
    CatalogStats {
        total_books: books.len(),
        per_category: groups.iter().map(|(c, b)| (c, b.len())).collect(),
        uncategorized: books
            .iter()
            .filter(|b| Category::from_canonical(&b.category).is_none())
            .count(),
        oldest_year: books.iter().map(|b| b.publish_year).min(),
        newest_year: books.iter().map(|b| b.publish_year).max(),
    }
}

// ─── Catalog ───────────────────────────────────────────────

/// The loaded collection bound to its backing file.
///
/// Mutations persist immediately. If the write fails the in-memory
/// collection is rolled back so memory and disk agree.
#[derive(Debug)]
pub struct Catalog {
    store: JsonStore,
    books: Vec<Book>,
}

impl Catalog {
    /// Load the collection from `store`.
    pub fn open(store: JsonStore) -> Result<Self> {
        let books = store.load()?;
        Ok(Self { store, books })
    }

    pub fn store(&self) -> &JsonStore {
        &self.store
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    pub fn get(&self, id: &Uuid) -> Option<&Book> {
        self.books.iter().find(|b| b.id == *id)
    }

    /// Resolve a full id or a unique id prefix (dashes optional).
    pub fn resolve_id(&self, input: &str) -> Result<Uuid> {
        let input = input.trim();
        if let Ok(id) = Uuid::parse_str(input) {
            return self
                .get(&id)
                .map(|b| b.id)
                .ok_or_else(|| LibrisError::BookNotFound(input.to_string()));
        }

        let prefix = input.replace('-', "").to_lowercase();
        if prefix.len() < MIN_ID_PREFIX {
            return Err(LibrisError::Validation(format!(
                "id prefix '{input}' is too short (need at least {MIN_ID_PREFIX} characters)"
            )));
        }

        let mut hits = self
            .books
            .iter()
            .filter(|b| b.id.simple().to_string().starts_with(&prefix));
        match (hits.next(), hits.next()) {
            (Some(book), None) => Ok(book.id),
            (Some(_), Some(_)) => Err(LibrisError::AmbiguousId(input.to_string())),
            (None, _) => Err(LibrisError::BookNotFound(input.to_string())),
        }
    }

    /// First book with exactly this title in `category`.
    pub fn find_by_title(&self, title: &str, category: Category) -> Option<&Book> {
        self.books.iter().find(|b| b.matches_pair(title, category))
    }

    /// Append a new book built from `draft`. No duplicate check.
    pub fn add(&mut self, draft: BookDraft) -> Result<&Book> {
        let snapshot = self.books.clone();
        self.books.push(Book::new(draft));
        self.commit(snapshot)?;

        let idx = self.books.len() - 1;
        let book = &self.books[idx];
        tracing::info!(id = %book.id, title = %book.title, "added book");
        Ok(book)
    }

    /// Overwrite every editable field of book `id` in place.
    pub fn update(&mut self, id: &Uuid, draft: BookDraft) -> Result<&Book> {
        let idx = self.position(id)?;
        let snapshot = self.books.clone();
        self.books[idx].apply(draft);
        self.commit(snapshot)?;

        let book = &self.books[idx];
        tracing::info!(id = %book.id, title = %book.title, "updated book");
        Ok(book)
    }

    /// Remove book `id` and return it.
    pub fn remove(&mut self, id: &Uuid) -> Result<Book> {
        let idx = self.position(id)?;
        let snapshot = self.books.clone();
        let removed = self.books.remove(idx);
        self.commit(snapshot)?;

        tracing::info!(id = %removed.id, title = %removed.title, "removed book");
        Ok(removed)
    }

    /// Remove every book matching the `(title, category)` pair.
    ///
    /// Duplicates are all removed. Returns how many books went away; the
    /// file is only rewritten when that is non-zero.
    pub fn remove_by_title(&mut self, title: &str, category: Category) -> Result<usize> {
        let snapshot = self.books.clone();
        self.books.retain(|b| !b.matches_pair(title, category));
        let removed = snapshot.len() - self.books.len();
        if removed == 0 {
            return Ok(0);
        }
        self.commit(snapshot)?;

        tracing::info!(title, category = %category, removed, "removed books by title");
        Ok(removed)
    }

    pub fn group_by_category(&self) -> CategoryGroups<'_> {
        group_by_category(&self.books)
    }

    pub fn search(&self, query: &str) -> Vec<&Book> {
        search(&self.books, query)
    }

    pub fn stats(&self) -> CatalogStats {
        stats(&self.books)
    }

    fn position(&self, id: &Uuid) -> Result<usize> {
        self.books
            .iter()
            .position(|b| b.id == *id)
            .ok_or_else(|| LibrisError::BookNotFound(id.to_string()))
    }

    /// Persist the current collection, restoring `snapshot` on failure.
    fn commit(&mut self, snapshot: Vec<Book>) -> Result<()> {
        if let Err(e) = self.store.save(&self.books) {
            tracing::warn!(
                path = %self.store.path().display(),
                error = %e,
                "save failed, rolling back"
            );
            self.books = snapshot;
            return Err(e);
        }
        Ok(())
    }
}
