//! Interact with Elasticsearch
//!
//! This module sends the search built by `query` and decodes what comes
//! back. There is a single blocking request, no sniffing of the cluster and
//! no retries: any failure is the caller's to report.

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::query::SearchQuery;

#[derive(Debug, Error)]
pub(crate) enum SearchError {
    #[error("couldn't build a search url from {0}")]
    Url(Url),
    #[error("{0}")]
    Http(#[from] reqwest::Error),
    #[error("elasticsearch returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("elasticsearch returned invalid json: {source}\n{body}")]
    Json {
        source: serde_json::Error,
        body: String,
    },
}

impl SearchError {
    /// One line, suitable for the status line
    pub fn short_display(&self) -> String {
        match *self {
            SearchError::Url(ref url) => format!("Invalid elasticsearch url {}", url),
            SearchError::Http(ref e) => e.to_string(),
            SearchError::Status { status, .. } => format!("Elasticsearch returned {}", status),
            SearchError::Json { .. } => "Error parsing json from elasticsearch".to_owned(),
        }
    }
}

/// Anything that can run a `SearchQuery`
pub(crate) trait SearchBackend {
    fn search(&self, query: &SearchQuery) -> Result<SearchResult, SearchError>;
}

/// The body of a `_search` response, minus everything we don't look at
#[derive(Debug, Deserialize, PartialEq)]
pub(crate) struct SearchResult {
    pub hits: Hits,
}

impl SearchResult {
    /// Every document that matched, not just the ones returned
    pub fn total_hits(&self) -> u64 {
        self.hits.total.count()
    }
}

#[derive(Debug, Deserialize, PartialEq)]
pub(crate) struct Hits {
    pub total: TotalHits,
    #[serde(default)]
    pub hits: Vec<Hit>,
}

/// Older servers send a bare number, newer ones an object
#[derive(Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub(crate) enum TotalHits {
    Count(u64),
    Tracked {
        value: u64,
        #[serde(default)]
        relation: Option<String>,
    },
}

impl TotalHits {
    pub fn count(&self) -> u64 {
        match *self {
            TotalHits::Count(n) => n,
            TotalHits::Tracked { value, .. } => value,
        }
    }

    /// The server stopped counting, there are at least `count()` matches
    pub fn is_lower_bound(&self) -> bool {
        match *self {
            TotalHits::Tracked {
                relation: Some(ref r),
                ..
            } => r == "gte",
            _ => false,
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
pub(crate) struct Hit {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(rename = "_source", default)]
    pub source: Value,
}

#[derive(Debug, Error)]
#[error("couldn't decode document {id}: {source}")]
pub(crate) struct DecodeError {
    pub id: String,
    pub source: serde_json::Error,
}

#[derive(Deserialize)]
struct LogLine {
    message: String,
}

impl Hit {
    /// The `message` of this document
    pub fn message(&self) -> Result<String, DecodeError> {
        serde_json::from_value::<LogLine>(self.source.clone())
            .map(|line| line.message)
            .map_err(|source| DecodeError {
                id: self.id.clone().unwrap_or_else(|| "<no id>".to_owned()),
                source,
            })
    }
}

/// A connection to one Elasticsearch node
pub(crate) struct Elastic {
    base: Url,
    auth: Option<(String, String)>,
    client: Client,
}

impl Elastic {
    pub fn new(base: Url, auth: Option<(&str, &str)>) -> Result<Elastic, SearchError> {
        Ok(Elastic {
            base,
            auth: auth.map(|(user, pass)| (user.to_owned(), pass.to_owned())),
            client: Client::builder().build()?,
        })
    }

    pub fn has_auth(&self) -> bool {
        self.auth.is_some()
    }

    /// `{base}/{index}/{type}/_search`, the type is left out when empty
    pub fn search_url(&self, query: &SearchQuery) -> Result<Url, SearchError> {
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| SearchError::Url(self.base.clone()))?;
            segments.pop_if_empty().push(&query.index);
            if !query.item_type.is_empty() {
                segments.push(&query.item_type);
            }
            segments.push("_search");
        }
        Ok(url)
    }
}

impl SearchBackend for Elastic {
    fn search(&self, query: &SearchQuery) -> Result<SearchResult, SearchError> {
        let url = self.search_url(query)?;
        let mut request = self.client.post(url.clone()).json(&query.body());
        if let Some((ref user, ref pass)) = self.auth {
            request = request.basic_auth(user, Some(pass));
        }

        debug!(%url, "sending search");
        let response = request.send()?;
        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(SearchError::Status { status, body });
        }

        let result: SearchResult =
            serde_json::from_str(&body).map_err(|source| SearchError::Json { source, body })?;
        info!(
            total = result.total_hits(),
            returned = result.hits.hits.len(),
            "search complete"
        );
        Ok(result)
    }
}
