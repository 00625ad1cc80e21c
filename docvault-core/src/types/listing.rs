//! Listing queries and results.
//!
//! A listing is identified by its full query shape: owner, optional filter
//! and limit. Two queries that differ in any field are different listings.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_LISTING_LIMIT, MAX_LISTING_LIMIT};
use crate::error::{Result, VaultError};
use crate::types::{DocumentSummary, UserId};

/// Document attribute a listing can be filtered on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterField {
    /// Exact name match
    Name,
    /// Exact MIME type match
    Mime,
    /// File vs. structured documents
    File,
    /// Public vs. private documents
    Public,
}

impl FilterField {
    /// Query-string spelling of the field.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterField::Name => "name",
            FilterField::Mime => "mime",
            FilterField::File => "file",
            FilterField::Public => "public",
        }
    }

    fn is_boolean(&self) -> bool {
        matches!(self, FilterField::File | FilterField::Public)
    }
}

impl FromStr for FilterField {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(FilterField::Name),
            "mime" => Ok(FilterField::Mime),
            "file" => Ok(FilterField::File),
            "public" => Ok(FilterField::Public),
            other => Err(VaultError::invalid_input(format!("unsupported filter key '{other}'"))),
        }
    }
}

/// A single `field = value` listing filter.
///
/// Boolean fields store their value in canonical form (`true`/`false`) so
/// `True` and `true` describe the same listing.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListingFilter {
    field: FilterField,
    value: String,
}

impl ListingFilter {
    /// Creates a filter, validating boolean values.
    pub fn new(field: FilterField, value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        let value = if field.is_boolean() {
            parse_bool(&value)?.to_string()
        } else {
            value
        };
        Ok(Self { field, value })
    }

    /// Parses a filter from raw query parameters.
    pub fn parse(key: &str, value: &str) -> Result<Self> {
        Self::new(key.parse()?, value)
    }

    /// Filtered attribute.
    pub fn field(&self) -> FilterField {
        self.field
    }

    /// Canonical filter value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns true if the summary satisfies this filter.
    pub fn matches(&self, summary: &DocumentSummary) -> bool {
        match self.field {
            FilterField::Name => summary.name == self.value,
            FilterField::Mime => summary.mime == self.value,
            FilterField::File => summary.file.to_string() == self.value,
            FilterField::Public => summary.public.to_string() == self.value,
        }
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(VaultError::invalid_input(format!("expected a boolean, got '{other}'"))),
    }
}

/// Full shape of a listing query.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListingQuery {
    /// Owner whose documents are listed
    pub owner: UserId,
    /// Optional attribute filter
    pub filter: Option<ListingFilter>,
    /// Maximum number of entries
    pub limit: usize,
}

impl ListingQuery {
    /// Creates a query, applying the default and maximum limit.
    pub fn new(owner: UserId, filter: Option<ListingFilter>, limit: Option<usize>) -> Self {
        let limit = match limit {
            None | Some(0) => DEFAULT_LISTING_LIMIT,
            Some(n) => n.min(MAX_LISTING_LIMIT),
        };
        Self { owner, filter, limit }
    }

    /// Creates a query for every matching document of `owner`.
    pub fn unbounded(owner: UserId, filter: Option<ListingFilter>) -> Self {
        Self {
            owner,
            filter,
            limit: usize::MAX,
        }
    }
}

/// Ordered listing result, sorted by name then creation time.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    /// Document summaries
    pub documents: Vec<DocumentSummary>,
}

impl Listing {
    /// Wraps summaries into a listing.
    pub fn new(documents: Vec<DocumentSummary>) -> Self {
        Self { documents }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns true if the listing is empty.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
