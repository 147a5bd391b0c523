// src/models/page.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sort direction for paginated listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl Order {
    /// SQL keyword for an ORDER BY clause.
    pub fn sql(&self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql())
    }
}

/// Position of a page within the full result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    /// 1-based page number.
    pub page: i64,
    /// Page size.
    pub take: i64,
    /// Total number of matching rows.
    pub item_count: i64,
    pub page_count: i64,
    pub has_previous_page: bool,
    pub has_next_page: bool,
}

/// A bounded slice of a larger result set plus its position metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, page: i64, take: i64, item_count: i64) -> Self {
        let page_count = if take > 0 {
            (item_count + take - 1) / take
        } else {
            0
        };

        Self {
            data,
            meta: PageMeta {
                page,
                take,
                item_count,
                page_count,
                has_previous_page: page > 1,
                has_next_page: page < page_count,
            },
        }
    }
}
