//! Question list queries: the recent feed and title-prefix search.
//!
//! Prefix search is a range scan over titles: a term `t` matches every title
//! `s` with `t <= s <= t + '\u{f8ff}'`. The sentinel is a high private-use
//! code point, so any title that starts with `t` sorts below the upper bound.
//! This gives neither substring matching nor relevance ranking; matching is
//! case sensitive.

use std::cmp::Ordering;

use super::question::Question;

/// Feed size when no limit is configured.
pub const DEFAULT_FEED_LIMIT: usize = 50;

/// Upper-bound sentinel appended to a prefix term.
pub const PREFIX_SENTINEL: char = '\u{f8ff}';

/// Which questions a list query selects.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QuestionFilter {
    /// Every question, newest first.
    All,
    /// Titles in `[prefix, prefix + '\u{f8ff}']`, ordered by title.
    TitlePrefix(String),
}

/// A bounded question list query.
///
/// # Examples
/// ```
/// use quorum::domain::{QuestionFilter, QuestionListQuery};
///
/// let query = QuestionListQuery::from_search("  Why ", 50);
/// assert_eq!(query.filter(), &QuestionFilter::TitlePrefix("Why".into()));
/// assert_eq!(query.upper_bound().as_deref(), Some("Why\u{f8ff}"));
/// assert_eq!(QuestionListQuery::from_search("   ", 50).filter(), &QuestionFilter::All);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuestionListQuery {
    filter: QuestionFilter,
    limit: usize,
}

impl QuestionListQuery {
    /// Newest questions first.
    pub fn feed(limit: usize) -> Self {
        Self {
            filter: QuestionFilter::All,
            limit,
        }
    }

    /// Build a query from a raw search box value. Blank terms select the
    /// feed.
    pub fn from_search(term: &str, limit: usize) -> Self {
        let trimmed = term.trim();
        if trimmed.is_empty() {
            return Self::feed(limit);
        }
        Self {
            filter: QuestionFilter::TitlePrefix(trimmed.to_owned()),
            limit,
        }
    }

    pub fn filter(&self) -> &QuestionFilter {
        &self.filter
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Inclusive lower bound of the title range, for prefix queries.
    pub fn lower_bound(&self) -> Option<&str> {
        match &self.filter {
            QuestionFilter::All => None,
            QuestionFilter::TitlePrefix(term) => Some(term.as_str()),
        }
    }

    /// Inclusive upper bound of the title range, for prefix queries.
    pub fn upper_bound(&self) -> Option<String> {
        self.lower_bound().map(|term| {
            let mut bound = String::with_capacity(term.len() + PREFIX_SENTINEL.len_utf8());
            bound.push_str(term);
            bound.push(PREFIX_SENTINEL);
            bound
        })
    }

    /// Whether `question` falls inside the query range.
    pub fn matches(&self, question: &Question) -> bool {
        match (self.lower_bound(), self.upper_bound()) {
            (Some(lower), Some(upper)) => {
                let title = question.title.as_ref();
                lower <= title && title <= upper.as_str()
            }
            _ => true,
        }
    }

    /// Result ordering for this query.
    pub fn compare(&self, a: &Question, b: &Question) -> Ordering {
        let newest_first = b.created_at.cmp(&a.created_at);
        match self.filter {
            QuestionFilter::All => newest_first.then_with(|| a.id.cmp(&b.id)),
            QuestionFilter::TitlePrefix(_) => a
                .title
                .cmp(&b.title)
                .then(newest_first)
                .then_with(|| a.id.cmp(&b.id)),
        }
    }

    /// Filter, order and truncate a full question set.
    pub fn evaluate<I>(&self, questions: I) -> Vec<Question>
    where
        I: IntoIterator<Item = Question>,
    {
        let mut selected: Vec<Question> = questions
            .into_iter()
            .filter(|q| self.matches(q))
            .collect();
        selected.sort_by(|a, b| self.compare(a, b));
        selected.truncate(self.limit);
        selected
    }
}

impl Default for QuestionListQuery {
    fn default() -> Self {
        Self::feed(DEFAULT_FEED_LIMIT)
    }
}
