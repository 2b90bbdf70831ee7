use std::collections::HashSet;

use crate::services::import::{BusinessRecord, StatusFilter, PAGE_SIZE};

/// In-memory state for one import session: the parsed records plus the
/// current preview view (search, status filter, page) and row selection.
///
/// Derived views are rebuilt from the full record set on every read instead
/// of mutated in place, so `filtered`/`page_slice` stay pure functions of
/// (records, view state).
#[derive(Debug)]
pub struct ImportSession {
    pub file_name: Option<String>,
    pub records: Vec<BusinessRecord>,
    pub search_term: String,
    pub status_filter: StatusFilter,
    pub page: usize,
    pub selection: HashSet<usize>,
    pub parsing: bool,
    pub submitting: bool,
}

impl Default for ImportSession {
    fn default() -> Self {
        Self {
            file_name: None,
            records: Vec::new(),
            search_term: String::new(),
            status_filter: StatusFilter::All,
            page: 1,
            selection: HashSet::new(),
            parsing: false,
            submitting: false,
        }
    }
}

impl ImportSession {
    /// Install a freshly parsed record set, resetting the view and selection.
    pub fn replace_records(&mut self, file_name: String, records: Vec<BusinessRecord>) {
        self.file_name = Some(file_name);
        self.records = records;
        self.search_term.clear();
        self.status_filter = StatusFilter::All;
        self.page = 1;
        self.selection.clear();
    }

    /// Discard everything, including any stale busy flags.
    pub fn clear(&mut self) {
        *self = ImportSession::default();
    }

    /// Records matching the current search term and status filter, in
    /// original row order.
    pub fn filtered(&self) -> Vec<BusinessRecord> {
        self.records
            .iter()
            .filter(|record| record.status_matches(self.status_filter))
            .filter(|record| matches_search(record, &self.search_term))
            .cloned()
            .collect()
    }

    /// Counts of the three mutually exclusive preview buckets:
    /// (valid-with-website, invalid, valid-without-website).
    pub fn status_counts(&self) -> (usize, usize, usize) {
        let mut valid = 0;
        let mut invalid = 0;
        let mut no_website = 0;

        for record in &self.records {
            if !record.is_valid {
                invalid += 1;
            } else if record.has_website {
                valid += 1;
            } else {
                no_website += 1;
            }
        }

        (valid, invalid, no_website)
    }

    /// Fixed-size window over an already-filtered record list. `page` is
    /// 1-based; a page past the end is empty rather than clamped.
    pub fn page_slice(records: &[BusinessRecord], page: usize) -> &[BusinessRecord] {
        let page = page.max(1);
        let start = (page - 1) * PAGE_SIZE;
        if start >= records.len() {
            return &[];
        }
        let end = (start + PAGE_SIZE).min(records.len());
        &records[start..end]
    }

    pub fn total_pages(count: usize) -> usize {
        (count + PAGE_SIZE - 1) / PAGE_SIZE
    }
}

/// Case-insensitive substring match against the string form of every
/// business field. An empty term matches everything.
fn matches_search(record: &BusinessRecord, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    let needle = term.to_lowercase();
    record
        .search_fields()
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}
