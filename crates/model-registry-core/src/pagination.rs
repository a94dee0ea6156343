//! Pagination envelopes and list options

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::filter::FilterQuery;

/// One page of a list response
///
/// The registry names the cursor `nextPageToken`; the catalog uses
/// `next_page_token`. Both are accepted, and a body carrying both spellings
/// takes the first non-empty one, camelCase first. An empty token marks the
/// last page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// Number of items on this page
    pub size: i64,
    /// Requested page size
    pub page_size: i64,
    /// Cursor for the next page
    pub next_page_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageRepr<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    #[serde(default)]
    size: i64,
    #[serde(default)]
    page_size: Option<i64>,
    #[serde(default, rename = "page_size")]
    page_size_snake: Option<i64>,
    #[serde(default)]
    next_page_token: Option<String>,
    #[serde(default, rename = "next_page_token")]
    next_page_token_snake: Option<String>,
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Page<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = PageRepr::<T>::deserialize(deserializer)?;
        let next_page_token = [repr.next_page_token, repr.next_page_token_snake]
            .into_iter()
            .flatten()
            .find(|t| !t.is_empty())
            .unwrap_or_default();
        Ok(Page {
            items: repr.items,
            size: repr.size,
            page_size: repr.page_size.or(repr.page_size_snake).unwrap_or_default(),
            next_page_token,
        })
    }
}

impl<T> Page<T> {
    pub fn has_more(&self) -> bool {
        !self.next_page_token.is_empty()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            size: self.size,
            page_size: self.page_size,
            next_page_token: self.next_page_token,
        }
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            size: 0,
            page_size: 0,
            next_page_token: String::new(),
        }
    }
}

/// Query types that can be advanced to the next page
pub trait PageCursor: Clone {
    fn set_page_token(&mut self, token: String);
}

/// Registry sort field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderBy {
    CreateTime,
    LastUpdateTime,
    Id,
    Name,
}

impl OrderBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderBy::CreateTime => "CREATE_TIME",
            OrderBy::LastUpdateTime => "LAST_UPDATE_TIME",
            OrderBy::Id => "ID",
            OrderBy::Name => "NAME",
        }
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "CREATE_TIME" => Ok(OrderBy::CreateTime),
            "LAST_UPDATE_TIME" => Ok(OrderBy::LastUpdateTime),
            "ID" => Ok(OrderBy::Id),
            "NAME" => Ok(OrderBy::Name),
            other => Err(format!("unknown order field: {}", other)),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ASC" => Ok(SortOrder::Asc),
            "DESC" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order: {}", other)),
        }
    }
}

/// Paging, ordering and filtering for registry list calls
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListOptions {
    pub page_size: Option<u32>,
    pub page_token: Option<String>,
    pub order_by: Option<OrderBy>,
    pub sort_order: Option<SortOrder>,
    pub filter_query: Option<FilterQuery>,
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn with_page_token(mut self, token: impl Into<String>) -> Self {
        self.page_token = Some(token.into());
        self
    }

    pub fn with_order(mut self, order_by: OrderBy, sort_order: SortOrder) -> Self {
        self.order_by = Some(order_by);
        self.sort_order = Some(sort_order);
        self
    }

    pub fn with_filter(mut self, filter: impl Into<FilterQuery>) -> Self {
        self.filter_query = Some(filter.into());
        self
    }

    /// Registry query parameters (`pageSize`, `pageToken`, `orderBy`,
    /// `sortOrder`, `filterQuery`)
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(size) = self.page_size {
            query.push(("pageSize", size.to_string()));
        }
        if let Some(token) = self.page_token.as_ref().filter(|t| !t.is_empty()) {
            query.push(("pageToken", token.clone()));
        }
        if let Some(order_by) = self.order_by {
            query.push(("orderBy", order_by.to_string()));
        }
        if let Some(sort_order) = self.sort_order {
            query.push(("sortOrder", sort_order.to_string()));
        }
        if let Some(filter) = &self.filter_query {
            query.push(("filterQuery", filter.to_query_string()));
        }
        query
    }

    /// Catalog query parameters (`page_size`, `next_page_token`, `order_by`,
    /// `sort_order`, `filterQuery`)
    pub fn to_catalog_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(size) = self.page_size {
            query.push(("page_size", size.to_string()));
        }
        if let Some(token) = self.page_token.as_ref().filter(|t| !t.is_empty()) {
            query.push(("next_page_token", token.clone()));
        }
        if let Some(order_by) = self.order_by {
            query.push(("order_by", order_by.to_string()));
        }
        if let Some(sort_order) = self.sort_order {
            query.push(("sort_order", sort_order.to_string()));
        }
        if let Some(filter) = &self.filter_query {
            query.push(("filterQuery", filter.to_query_string()));
        }
        query
    }
}

impl PageCursor for ListOptions {
    fn set_page_token(&mut self, token: String) {
        self.page_token = Some(token);
    }
}
