//! List view engine: filter, sort and paginate a snapshot
//!
//! Every admin list (exams, notes, important dates, papers, ...) renders the
//! same pipeline over the latest snapshot of its collection:
//!
//! ```text
//! snapshot ──▶ filter(text) ──▶ filter_flag(status) ──▶ sort(key) ──▶ paginate(page, size)
//! ```
//!
//! The pipeline is pure. [`ViewState`] holds the user-controlled inputs and
//! applies the page reset and clamping rules when they change.

use crate::core::query::{PaginatedResponse, PaginationMeta};
use crate::core::record::Record;
use crate::core::field;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Named comparator selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    /// Reverse-chronological by creation time
    #[default]
    Newest,
    /// Chronological by creation time
    Oldest,
    /// Ascending by the collection's date field
    #[serde(alias = "examDateAsc")]
    DateAsc,
    /// Descending by the collection's date field
    #[serde(alias = "examDateDesc")]
    DateDesc,
    /// Ascending by the collection's title field
    #[serde(alias = "title")]
    TitleAsc,
    /// Descending by the collection's title field
    TitleDesc,
}

impl SortKey {
    /// Every sort key, in menu order
    pub const ALL: [SortKey; 6] = [
        SortKey::Newest,
        SortKey::Oldest,
        SortKey::DateAsc,
        SortKey::DateDesc,
        SortKey::TitleAsc,
        SortKey::TitleDesc,
    ];

    /// Parse a wire name; unknown names select [`SortKey::Newest`]
    pub fn parse(name: &str) -> Self {
        match name.trim() {
            "oldest" => SortKey::Oldest,
            "dateAsc" | "examDateAsc" => SortKey::DateAsc,
            "dateDesc" | "examDateDesc" => SortKey::DateDesc,
            "titleAsc" | "title" => SortKey::TitleAsc,
            "titleDesc" => SortKey::TitleDesc,
            _ => SortKey::Newest,
        }
    }

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Newest => "newest",
            SortKey::Oldest => "oldest",
            SortKey::DateAsc => "dateAsc",
            SortKey::DateDesc => "dateDesc",
            SortKey::TitleAsc => "titleAsc",
            SortKey::TitleDesc => "titleDesc",
        }
    }
}

/// Filter on a boolean flag field (e.g. a banner's `isActive`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagFilter {
    #[default]
    All,
    Active,
    Inactive,
}

impl FlagFilter {
    /// Parse a wire name; unknown names select [`FlagFilter::All`]
    pub fn parse(name: &str) -> Self {
        match name.trim() {
            "active" => FlagFilter::Active,
            "inactive" => FlagFilter::Inactive,
            _ => FlagFilter::All,
        }
    }

    fn accepts(&self, flag: bool) -> bool {
        match self {
            FlagFilter::All => true,
            FlagFilter::Active => flag,
            FlagFilter::Inactive => !flag,
        }
    }
}

/// Fields a collection designates for searching and sorting
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFields {
    /// Text fields searched by the free-text filter
    pub search: Vec<String>,
    /// Field compared by the title sort keys
    pub title: Option<String>,
    /// Field compared by the date sort keys
    pub date: Option<String>,
    /// Boolean field tested by the flag filter
    pub flag: Option<String>,
}

/// Records whose search fields contain `text`, case-insensitively
///
/// Blank text matches everything and keeps snapshot order.
pub fn filter<'a>(snapshot: &'a [Record], text: &str, search: &[String]) -> Vec<&'a Record> {
    let term = text.trim().to_lowercase();
    if term.is_empty() {
        return snapshot.iter().collect();
    }

    snapshot
        .iter()
        .filter(|record| {
            search
                .iter()
                .any(|name| record.text(name).to_lowercase().contains(&term))
        })
        .collect()
}

/// Records whose flag field passes `flag`
///
/// Collections without a flag field are returned unchanged.
pub fn filter_flag<'a>(
    matches: Vec<&'a Record>,
    field: Option<&str>,
    flag: FlagFilter,
) -> Vec<&'a Record> {
    match field {
        Some(name) if flag != FlagFilter::All => matches
            .into_iter()
            .filter(|record| flag.accepts(record.flag(name)))
            .collect(),
        _ => matches,
    }
}

/// Compare two records under a sort key
pub fn compare(a: &Record, b: &Record, key: SortKey, fields: &ListFields) -> Ordering {
    let date = |r: &Record| {
        fields
            .date
            .as_deref()
            .map(|name| field::epoch_millis(r.get(name)))
            .unwrap_or(0)
    };
    let title = |r: &Record| {
        fields
            .title
            .as_deref()
            .map(|name| r.text(name).to_lowercase())
            .unwrap_or_default()
    };

    match key {
        SortKey::Newest => b.created_millis().cmp(&a.created_millis()),
        SortKey::Oldest => a.created_millis().cmp(&b.created_millis()),
        SortKey::DateAsc => date(a).cmp(&date(b)),
        SortKey::DateDesc => date(b).cmp(&date(a)),
        SortKey::TitleAsc => title(a).cmp(&title(b)),
        SortKey::TitleDesc => title(b).cmp(&title(a)),
    }
}

/// Stable sort under `key`; equal records keep their relative order
pub fn sort<'a>(mut matches: Vec<&'a Record>, key: SortKey, fields: &ListFields) -> Vec<&'a Record> {
    matches.sort_by(|a, b| compare(a, b, key, fields));
    matches
}

/// Slice one page out of an ordered result set
///
/// The page is clamped into `[1, total_pages]` before slicing.
pub fn paginate<T: Clone>(ordered: &[T], page: usize, page_size: usize) -> PaginatedResponse<T> {
    let pagination = PaginationMeta::new(page, page_size, ordered.len());
    PaginatedResponse {
        data: ordered[pagination.range()].to_vec(),
        pagination,
    }
}

/// User-controlled inputs of one list view
///
/// Changing the filter, sort key, flag filter or page size resets the page
/// to 1. Rendering clamps the page down to the last page when the result set
/// has shrunk, so the user stays as close as possible to where they were.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    filter_text: String,
    sort_key: SortKey,
    flag: FlagFilter,
    page: usize,
    page_size: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(10)
    }
}

impl ViewState {
    /// Fresh view: no filter, newest first, page 1
    pub fn new(page_size: usize) -> Self {
        Self {
            filter_text: String::new(),
            sort_key: SortKey::default(),
            flag: FlagFilter::default(),
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn filter_text(&self) -> &str {
        &self.filter_text
    }

    pub fn sort_key(&self) -> SortKey {
        self.sort_key
    }

    pub fn flag(&self) -> FlagFilter {
        self.flag
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Change the filter text; returns whether it changed
    pub fn set_filter(&mut self, text: &str) -> bool {
        if self.filter_text == text {
            return false;
        }
        self.filter_text = text.to_string();
        self.page = 1;
        true
    }

    /// Change the sort key; returns whether it changed
    pub fn set_sort(&mut self, key: SortKey) -> bool {
        if self.sort_key == key {
            return false;
        }
        self.sort_key = key;
        self.page = 1;
        true
    }

    /// Change the flag filter; returns whether it changed
    pub fn set_flag(&mut self, flag: FlagFilter) -> bool {
        if self.flag == flag {
            return false;
        }
        self.flag = flag;
        self.page = 1;
        true
    }

    /// Change the page size; returns whether it changed
    pub fn set_page_size(&mut self, page_size: usize) -> bool {
        let page_size = page_size.max(1);
        if self.page_size == page_size {
            return false;
        }
        self.page_size = page_size;
        self.page = 1;
        true
    }

    /// Request a page; the next render clamps it into range
    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    /// Derive the page to display without touching the state
    pub fn view(&self, snapshot: &[Record], fields: &ListFields) -> PaginatedResponse<Record> {
        let matches = filter(snapshot, &self.filter_text, &fields.search);
        let matches = filter_flag(matches, fields.flag.as_deref(), self.flag);
        let ordered = sort(matches, self.sort_key, fields);

        let pagination = PaginationMeta::new(self.page, self.page_size, ordered.len());
        PaginatedResponse {
            data: ordered[pagination.range()]
                .iter()
                .map(|record| (*record).clone())
                .collect(),
            pagination,
        }
    }

    /// Derive the page to display and keep the clamped page number
    pub fn render(&mut self, snapshot: &[Record], fields: &ListFields) -> PaginatedResponse<Record> {
        let page = self.view(snapshot, fields);
        self.page = page.pagination.page;
        page
    }
}
