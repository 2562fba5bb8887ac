use nucleo_matcher::pattern::{AtomKind, CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Config, Matcher, Utf32Str};

use crate::models::Book;

/// A scored fuzzy match.
#[derive(Debug, Clone)]
pub struct SearchResult<'a> {
    pub book: &'a Book,
    pub score: u32,
}

/// Ranked fuzzy search over title, author and category, using nucleo-matcher.
///
/// The plain substring search lives in [`crate::catalog::search`]; this is
/// the forgiving variant for typos and partial words.
pub struct FuzzySearcher {
    matcher: Matcher,
}

impl FuzzySearcher {
    pub fn new() -> Self {
        Self {
            matcher: Matcher::new(Config::DEFAULT),
        }
    }

    /// Matching books, best score first. Ties keep collection order.
    pub fn search<'a>(&mut self, query: &str, books: &'a [Book]) -> Vec<SearchResult<'a>> {
        if query.trim().is_empty() {
            return books
                .iter()
                .map(|book| SearchResult { book, score: 0 })
                .collect();
        }

        let pattern = Pattern::new(
            query,
            CaseMatching::Ignore,
            Normalization::Smart,
            AtomKind::Fuzzy,
        );
        let mut buf = Vec::new();
        let mut results: Vec<SearchResult<'a>> = Vec::new();

        for book in books {
            let searchable = format!("{} {} {}", book.title, book.author, book.category);
            let haystack = Utf32Str::new(&searchable, &mut buf);
            if let Some(score) = pattern.score(haystack, &mut self.matcher) {
                results.push(SearchResult { book, score });
            }
        }

        // stable sort keeps insertion order among equal scores
        results.sort_by(|a, b| b.score.cmp(&a.score));
        results
    }
}

impl Default for FuzzySearcher {
    fn default() -> Self {
        Self::new()
    }
}
