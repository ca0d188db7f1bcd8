//! Build the one search this check makes
//!
//! The query is always the same shape: documents newer than `from` whose
//! message field contains the message phrase and whose hostname field
//! contains the hostname phrase, newest first, one page of `PAGE_SIZE`.

use serde_json::{json, Value};

use crate::args::Args;

/// How many documents to fetch. The total hit count is independent of this.
pub(crate) const PAGE_SIZE: usize = 100;

/// `field >= from`, with no upper bound
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RangeFilter {
    pub field: String,
    pub from: String,
}

impl RangeFilter {
    fn to_json(&self) -> Value {
        json!({
            "range": {
                &self.field: {
                    "from": self.from,
                    "to": null,
                    "include_lower": true,
                    "include_upper": true,
                }
            }
        })
    }
}

/// `field` contains `phrase` as a contiguous run of words
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PhraseFilter {
    pub field: String,
    pub phrase: String,
}

impl PhraseFilter {
    fn to_json(&self) -> Value {
        json!({
            "match_phrase": {
                &self.field: { "query": self.phrase }
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SearchQuery {
    pub index: String,
    /// Empty for typeless searches
    pub item_type: String,
    pub time_range: RangeFilter,
    pub message: PhraseFilter,
    pub hostname: PhraseFilter,
    /// Sorted descending
    pub sort_field: String,
    pub size: usize,
}

impl SearchQuery {
    pub fn from_args(args: &Args) -> SearchQuery {
        SearchQuery {
            index: args.index.clone(),
            item_type: args.item_type.clone(),
            time_range: RangeFilter {
                field: args.field_timestamp.clone(),
                from: args.from.clone(),
            },
            message: PhraseFilter {
                field: args.field_message.clone(),
                phrase: args.message.clone(),
            },
            hostname: PhraseFilter {
                field: args.field_hostname.clone(),
                phrase: args.hostname.clone(),
            },
            sort_field: args.field_timestamp.clone(),
            size: PAGE_SIZE,
        }
    }

    /// The filters that must all match
    pub fn clauses(&self) -> Vec<Value> {
        vec![
            self.time_range.to_json(),
            self.message.to_json(),
            self.hostname.to_json(),
        ]
    }

    /// The request body sent to `_search`
    pub fn body(&self) -> Value {
        json!({
            "query": { "bool": { "must": self.clauses() } },
            "sort": [ { &self.sort_field: { "order": "desc" } } ],
            "size": self.size,
        })
    }
}
