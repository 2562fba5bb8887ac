use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{LibrisError, Result};
use crate::models::Category;

/// Year assigned to records written before `publish_year` existed.
pub const DEFAULT_PUBLISH_YEAR: i32 = 2000;
pub const MIN_PUBLISH_YEAR: i32 = 1000;
pub const MAX_PUBLISH_YEAR: i32 = 2100;

// ─── Book ───────────────────────────────────────────────────

/// One catalog entry.
///
/// `category` is kept as the raw stored string so values outside
/// [`Category::ALL`] survive a load/save cycle untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub link: String,
    pub category: String,
    pub publish_year: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Book {
    /// Create a new book with a fresh id from caller-supplied values.
    pub fn new(draft: BookDraft) -> Self {
        Self {
            id: Uuid::now_v7(),
            title: draft.title,
            author: draft.author,
            link: draft.link,
            category: draft.category.as_str().to_string(),
            publish_year: draft.publish_year,
            added_at: Some(Utc::now()),
            updated_at: None,
        }
    }

    /// Overwrite every user-editable field. `id` and `added_at` are kept.
    pub fn apply(&mut self, draft: BookDraft) {
        self.title = draft.title;
        self.author = draft.author;
        self.link = draft.link;
        self.category = draft.category.as_str().to_string();
        self.publish_year = draft.publish_year;
        self.updated_at = Some(Utc::now());
    }

    /// The shelf this book is grouped under.
    pub fn shelf(&self) -> Category {
        Category::from_stored(&self.category)
    }

    /// Legacy `(title, category)` identity.
    pub fn matches_pair(&self, title: &str, category: Category) -> bool {
        self.title == title && self.category == category.as_str()
    }

    /// First eight characters of the id, for list output.
    pub fn short_id(&self) -> String {
        self.id.simple().to_string()[..8].to_string()
    }
}

// ─── BookDraft ──────────────────────────────────────────────

/// Field values for creating or editing a book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDraft {
    pub title: String,
    pub author: String,
    pub link: String,
    pub category: Category,
    pub publish_year: i32,
}

impl BookDraft {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        link: impl Into<String>,
        category: Category,
        publish_year: i32,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            link: link.into(),
            category,
            publish_year,
        }
    }

    /// Start an edit from the book's current values.
    pub fn from_book(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            link: book.link.clone(),
            category: book.shelf(),
            publish_year: book.publish_year,
        }
    }

    /// Input checks a front-end runs before calling add or update.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("title", &self.title),
            ("author", &self.author),
            ("link", &self.link),
        ] {
            if value.trim().is_empty() {
                return Err(LibrisError::Validation(format!("{field} must not be empty")));
            }
        }
        if !(MIN_PUBLISH_YEAR..=MAX_PUBLISH_YEAR).contains(&self.publish_year) {
            return Err(LibrisError::Validation(format!(
                "publish year {} is outside {MIN_PUBLISH_YEAR}..={MAX_PUBLISH_YEAR}",
                self.publish_year
            )));
        }
        Ok(())
    }
}

// ─── Tests ─────────────────────────────────────────────────
