//! Search over decoded localization records

use crate::error::{Error, Result};
use crate::formats::localiz::LocalizationRecord;

/// Which field of a record to match against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchField {
    Key,
    #[default]
    Text,
}

/// A record search
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    /// Value to look for
    pub text: String,
    pub field: SearchField,
    pub case_sensitive: bool,
    /// Only records of this locale (compared case-insensitively)
    pub locale: Option<String>,
    /// Maximum number of matches returned
    pub limit: Option<usize>,
}

impl SearchQuery {
    /// Search record text for `text`, case-insensitively
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_field(mut self, field: SearchField) -> Self {
        self.field = field;
        self
    }

    #[must_use]
    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    #[must_use]
    pub fn with_locale(mut self, locale: Option<String>) -> Self {
        self.locale = locale;
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    fn field_of<'a>(&self, record: &'a LocalizationRecord) -> &'a str {
        match self.field {
            SearchField::Key => &record.key,
            SearchField::Text => &record.text,
        }
    }

    fn locale_matches(&self, record: &LocalizationRecord) -> bool {
        self.locale
            .as_deref()
            .is_none_or(|locale| locale.eq_ignore_ascii_case(&record.locale))
    }
}

/// Find records matching `query`, in record order.
///
/// A key search returns the exact key matches when there are any, and falls
/// back to substring matches otherwise.
///
/// # Errors
/// Returns [`Error::InvalidSearch`] if the query text is blank.
pub fn search_records<'a>(
    records: &'a [LocalizationRecord],
    query: &SearchQuery,
) -> Result<Vec<&'a LocalizationRecord>> {
    if query.text.trim().is_empty() {
        return Err(Error::InvalidSearch(
            "the search value shouldn't be empty".to_string(),
        ));
    }

    let needle = if query.case_sensitive {
        query.text.clone()
    } else {
        query.text.to_lowercase()
    };
    let normalize = |value: &str| {
        if query.case_sensitive {
            value.to_string()
        } else {
            value.to_lowercase()
        }
    };

    let candidates = records.iter().filter(|record| query.locale_matches(record));
    let limit = query.limit.unwrap_or(usize::MAX);

    if query.field == SearchField::Key {
        let exact: Vec<_> = candidates
            .clone()
            .filter(|record| normalize(query.field_of(record)) == needle)
            .take(limit)
            .collect();
        if !exact.is_empty() {
            tracing::debug!("{} exact key matches for {:?}", exact.len(), query.text);
            return Ok(exact);
        }
    }

    let matches: Vec<_> = candidates
        .filter(|record| normalize(query.field_of(record)).contains(&needle))
        .take(limit)
        .collect();
    tracing::debug!("{} matches for {:?}", matches.len(), query.text);
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<LocalizationRecord> {
        vec![
            LocalizationRecord::new("ENG", "MENU_START", "Start the game"),
            LocalizationRecord::new("FRE", "MENU_START", "Commencer la partie"),
            LocalizationRecord::new("ENG", "MENU_START_HINT", "Press start"),
            LocalizationRecord::new("ENG", "MENU_QUIT", "Quit the game"),
        ]
    }

    #[test]
    fn test_text_search_is_case_insensitive_by_default() {
        let records = records();
        let hits = search_records(&records, &SearchQuery::new("START")).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[1].key, "MENU_START_HINT");
    }

    #[test]
    fn test_case_sensitive() {
        let records = records();
        let query = SearchQuery::new("START").with_case_sensitive(true);
        assert!(search_records(&records, &query).unwrap().is_empty());
    }

    #[test]
    fn test_key_search_prefers_exact() {
        let records = records();
        let query = SearchQuery::new("menu_start").with_field(SearchField::Key);
        let hits = search_records(&records, &query).unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|r| r.key == "MENU_START"));

        let query = SearchQuery::new("MENU_").with_field(SearchField::Key);
        assert_eq!(search_records(&records, &query).unwrap().len(), 4);
    }

    #[test]
    fn test_locale_and_limit() {
        let records = records();
        let query = SearchQuery::new("game")
            .with_locale(Some("eng".to_string()))
            .with_limit(Some(1));
        let hits = search_records(&records, &query).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].key, "MENU_START");
    }

    #[test]
    fn test_blank_query_rejected() {
        assert!(matches!(
            search_records(&records(), &SearchQuery::new("  ")),
            Err(Error::InvalidSearch(_))
        ));
    }
}
