// Feedback data model, submission validation, and the filtered list view.
//
// Everything here is pure: the board controller owns the item collection and
// calls into this module to validate form input and to derive what the list
// should show for the active sentiment filter and search query.

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum length of the name field, in characters.
pub const NAME_LIMIT: usize = 50;

/// Maximum length of the message field, in characters.
pub const MESSAGE_LIMIT: usize = 500;

// ---------------------------------------------------------------------------
// FeedbackItem
// ---------------------------------------------------------------------------

/// A single feedback entry as returned by the backend.
///
/// `sentiment` and `summary` are filled in by the server some time after
/// creation and are only observed through a later list refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackItem {
    pub id: i64,
    pub name: String,
    pub message: String,
    #[serde(default)]
    pub sentiment: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub created_at: String,
}

impl FeedbackItem {
    /// The recognised sentiment class, if the server assigned a known one.
    pub fn sentiment_kind(&self) -> Option<Sentiment> {
        self.sentiment.as_deref().and_then(Sentiment::parse)
    }

    /// Sentiment label to show as a badge.
    ///
    /// Neutral (and missing) sentiment is never badged; it still takes part
    /// in filtering and search.
    pub fn badge(&self) -> Option<&str> {
        let raw = self.sentiment.as_deref()?;
        if raw.is_empty() || raw.eq_ignore_ascii_case(Sentiment::Neutral.as_str()) {
            return None;
        }
        Some(raw)
    }

    /// Up to two upper-cased initials from the name, or `?`.
    pub fn initials(&self) -> String {
        let initials: String = self
            .name
            .split_whitespace()
            .take(2)
            .filter_map(|word| word.chars().next())
            .flat_map(char::to_uppercase)
            .collect();
        if initials.is_empty() {
            "?".to_string()
        } else {
            initials
        }
    }

    /// `created_at` rendered in the local timezone, or the raw server string
    /// when it cannot be parsed.
    pub fn local_time(&self) -> String {
        match parse_timestamp(&self.created_at) {
            Some(ts) => ts
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M")
                .to_string(),
            None => self.created_at.clone(),
        }
    }

    /// Case-insensitive substring match of an already lower-cased query
    /// against name, message and summary.
    fn contains_query(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.message.to_lowercase().contains(needle)
            || self
                .summary
                .as_deref()
                .unwrap_or("")
                .to_lowercase()
                .contains(needle)
    }
}

/// Parse a server timestamp. The backend emits RFC 3339 with a `Z` suffix;
/// older rows may lack the offset, in which case UTC is assumed.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

// ---------------------------------------------------------------------------
// Sentiment
// ---------------------------------------------------------------------------

/// Server-assigned classification of a feedback message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sentiment {
    Positive,
    Neutral,
    Mixed,
    Negative,
}

impl Sentiment {
    pub fn as_str(self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Mixed => "mixed",
            Sentiment::Negative => "negative",
        }
    }

    /// Case-insensitive parse; unknown labels yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        [
            Sentiment::Positive,
            Sentiment::Neutral,
            Sentiment::Mixed,
            Sentiment::Negative,
        ]
        .into_iter()
        .find(|s| raw.eq_ignore_ascii_case(s.as_str()))
    }
}

/// Active sentiment filter for the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SentimentFilter {
    #[default]
    All,
    Only(Sentiment),
}

impl SentimentFilter {
    /// The filter options offered in the UI, in display order.
    ///
    /// Neutral is deliberately absent: neutral items are reached through
    /// `All` or through search.
    pub const PILLS: [SentimentFilter; 4] = [
        SentimentFilter::All,
        SentimentFilter::Only(Sentiment::Positive),
        SentimentFilter::Only(Sentiment::Mixed),
        SentimentFilter::Only(Sentiment::Negative),
    ];

    pub fn label(self) -> &'static str {
        match self {
            SentimentFilter::All => "All",
            SentimentFilter::Only(s) => s.as_str(),
        }
    }

    /// Whether the item's sentiment passes this filter.
    pub fn matches(self, item: &FeedbackItem) -> bool {
        match self {
            SentimentFilter::All => true,
            SentimentFilter::Only(wanted) => item
                .sentiment
                .as_deref()
                .unwrap_or("")
                .eq_ignore_ascii_case(wanted.as_str()),
        }
    }

    /// Next pill in display order, wrapping to `All`.
    pub fn next(self) -> Self {
        let idx = Self::PILLS.iter().position(|p| *p == self);
        match idx {
            Some(i) if i + 1 < Self::PILLS.len() => Self::PILLS[i + 1],
            _ => SentimentFilter::All,
        }
    }
}

// ---------------------------------------------------------------------------
// Submission validation
// ---------------------------------------------------------------------------

/// Client-side rejection of a submission, raised before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please fill in both fields.")]
    MissingField,

    #[error("Name ≤ {name}; Message ≤ {message}.", name = NAME_LIMIT, message = MESSAGE_LIMIT)]
    TooLong,
}

/// A validated submission with trimmed fields, ready to be posted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub name: String,
    pub message: String,
}

/// Validate raw form input.
///
/// Emptiness is judged after trimming; length limits are counted in
/// characters on the raw field values.
pub fn validate_submission(name: &str, message: &str) -> Result<Submission, ValidationError> {
    let trimmed_name = name.trim();
    let trimmed_message = message.trim();

    if trimmed_name.is_empty() || trimmed_message.is_empty() {
        return Err(ValidationError::MissingField);
    }
    if name.chars().count() > NAME_LIMIT || message.chars().count() > MESSAGE_LIMIT {
        return Err(ValidationError::TooLong);
    }

    Ok(Submission {
        name: trimmed_name.to_string(),
        message: trimmed_message.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// Whether an item passes both the sentiment filter and the search query.
///
/// The query is trimmed and compared case-insensitively; an empty query
/// matches everything.
pub fn item_matches(item: &FeedbackItem, filter: SentimentFilter, query: &str) -> bool {
    if !filter.matches(item) {
        return false;
    }
    let needle = query.trim().to_lowercase();
    needle.is_empty() || item.contains_query(&needle)
}

/// Indices of the items passing `filter` and `query`, in collection order.
pub fn filter_items(items: &[FeedbackItem], filter: SentimentFilter, query: &str) -> Vec<usize> {
    items
        .iter()
        .enumerate()
        .filter(|(_, item)| item_matches(item, filter, query))
        .map(|(i, _)| i)
        .collect()
}

/// Memoized filtered view keyed on (items revision, filter, query).
///
/// The owner bumps its revision counter whenever the item collection
/// changes; lookups with an unchanged key reuse the previous result.
#[derive(Debug, Default)]
pub struct FilterMemo {
    key: Option<(u64, SentimentFilter, String)>,
    indices: Vec<usize>,
    recomputations: u64,
}

impl FilterMemo {
    /// Indices into `items` of the entries that pass the filter and query.
    pub fn indices(
        &mut self,
        revision: u64,
        items: &[FeedbackItem],
        filter: SentimentFilter,
        query: &str,
    ) -> &[usize] {
        let fresh = matches!(
            &self.key,
            Some((rev, f, q)) if *rev == revision && *f == filter && q == query
        );
        if !fresh {
            self.indices = filter_items(items, filter, query);
            self.key = Some((revision, filter, query.to_string()));
            self.recomputations += 1;
        }
        &self.indices
    }

    /// How many times the view has actually been recomputed.
    pub fn recomputations(&self) -> u64 {
        self.recomputations
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
