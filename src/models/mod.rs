//! Core data models for records, searches and import reports.

mod import;
mod record;
mod search;

pub use import::{ImportDetail, ImportResult, ImportStatus, DETAIL_TITLE_LIMIT};
pub use record::{
    today, truncate_chars, truncate_description, Record, RecordBuilder, DEFAULT_CREATOR,
    DEFAULT_TITLE, DESCRIPTION_LIMIT, ELLIPSIS, NO_DESCRIPTION,
};
pub use search::{parse_limit, SearchQuery, DEFAULT_LIMIT, MAX_PAGE_SIZE};
