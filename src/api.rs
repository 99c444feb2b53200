use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_API_URL: &str = "https://en.wikipedia.org/w/api.php";
pub const DEFAULT_USER_AGENT: &str = "WikipediaMobileAnalysis/1.0 (Research Project)";

/// Timestamp format used by the Action API, e.g. `2025-10-06T00:00:00Z`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// One revision of a page, as consumed by the progression tracker.
///
/// Sequences are ordered oldest first. Fields the API did not return are
/// the empty string / empty list; absence is never an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Revision {
    pub text: String,
    pub timestamp: CompactString,
    pub user: CompactString,
    pub tags: Vec<CompactString>,
    pub comment: CompactString,
}

/// A page-creation event from the recent-changes feed.
///
/// Field names follow the `list=recentchanges` response so the persisted
/// article list mirrors the wire shape; absent fields default on read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCreation {
    #[serde(default, rename = "type")]
    pub change_type: CompactString,
    #[serde(default)]
    pub ns: i32,
    #[serde(default)]
    pub title: CompactString,
    #[serde(default)]
    pub pageid: u64,
    #[serde(default)]
    pub revid: u64,
    #[serde(default)]
    pub old_revid: u64,
    #[serde(default)]
    pub rcid: u64,
    #[serde(default)]
    pub user: CompactString,
    #[serde(default)]
    pub userid: u64,
    #[serde(default)]
    pub oldlen: u64,
    #[serde(default)]
    pub newlen: u64,
    #[serde(default)]
    pub timestamp: CompactString,
    #[serde(default)]
    pub comment: CompactString,
    #[serde(default)]
    pub tags: Vec<CompactString>,
}

/// A registered change tag, from `list=tags`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagInfo {
    #[serde(default)]
    pub name: CompactString,
    #[serde(default)]
    pub displayname: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub hitcount: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("MediaWiki error {code}: {info}")]
    MediaWiki { code: CompactString, info: String },
}

/// Connection settings for [`WikiClient`].
///
/// `rate_limit_ms` is the minimum gap between any two requests; retries use
/// exponential backoff on `retry_delay_ms` with jitter.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub user_agent: String,
    pub timeout_ms: u64,
    pub rate_limit_ms: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_ms: 30_000,
            rate_limit_ms: 500,
            max_retries: 3,
            retry_delay_ms: 1_000,
        }
    }
}

/// Blocking client for the MediaWiki Action API.
///
/// Every request carries `format=json&formatversion=2`, respects the
/// configured rate limit, and retries transient failures (timeouts,
/// connection errors, HTTP 408/429/5xx) with exponential backoff.
pub struct WikiClient {
    http: reqwest::blocking::Client,
    config: ClientConfig,
    last_request_at: Option<Instant>,
}

impl WikiClient {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self {
            http,
            config,
            last_request_at: None,
        })
    }

    /// Fetch the registered change tags (name, display name, description,
    /// hit count). A single request; the tag registry fits in one batch.
    pub fn list_change_tags(&mut self) -> Result<Vec<TagInfo>, ApiError> {
        let params = [
            ("action", "query".to_string()),
            ("list", "tags".to_string()),
            ("tglimit", "500".to_string()),
            ("tgprop", "name|displayname|description|hitcount".to_string()),
        ];
        let response: ApiResponse<TagsQuery> = self.request(&params)?;
        Ok(response.query.map(|q| q.tags).unwrap_or_default())
    }

    /// Fetch all page creations carrying `tag` in the main namespace
    /// between `oldest` and `newest`, following continuation tokens.
    pub fn new_pages_tagged(
        &mut self,
        tag: &str,
        newest: DateTime<Utc>,
        oldest: DateTime<Utc>,
    ) -> Result<Vec<PageCreation>, ApiError> {
        let mut pages = Vec::new();
        let mut continuation: Option<Map<String, Value>> = None;

        loop {
            let response: ApiResponse<ChangesQuery> = {
                let mut params = vec![
                    ("action", "query".to_string()),
                    ("list", "recentchanges".to_string()),
                    ("rctype", "new".to_string()),
                    ("rctag", tag.to_string()),
                    ("rcnamespace", "0".to_string()),
                    // recentchanges iterates newest to oldest
                    ("rcstart", newest.format(TIMESTAMP_FORMAT).to_string()),
                    ("rcend", oldest.format(TIMESTAMP_FORMAT).to_string()),
                    ("rclimit", "500".to_string()),
                    (
                        "rcprop",
                        "title|timestamp|ids|tags|user|userid|sizes|comment".to_string(),
                    ),
                ];
                if let Some(tokens) = &continuation {
                    for (key, value) in tokens {
                        params.push((key.as_str(), continuation_value(value)));
                    }
                }
                self.request(&params)?
            };

            if let Some(query) = response.query {
                tracing::debug!(
                    message = "recent changes batch",
                    tag,
                    batch = query.recentchanges.len()
                );
                pages.extend(query.recentchanges);
            }
            match response.continuation {
                Some(next) => continuation = Some(next),
                None => break,
            }
        }

        Ok(pages)
    }

    /// Fetch the complete revision history of `title`, oldest first,
    /// following continuation tokens. A missing page yields an empty
    /// sequence.
    pub fn page_revisions(&mut self, title: &str) -> Result<Vec<Revision>, ApiError> {
        let mut revisions = Vec::new();
        let mut continuation: Option<Map<String, Value>> = None;

        loop {
            let response: ApiResponse<RevisionsQuery> = {
                let mut params = vec![
                    ("action", "query".to_string()),
                    ("prop", "revisions".to_string()),
                    ("titles", title.to_string()),
                    (
                        "rvprop",
                        "ids|timestamp|user|userid|size|tags|comment|content".to_string(),
                    ),
                    ("rvlimit", "500".to_string()),
                    ("rvslots", "main".to_string()),
                    ("rvdir", "newer".to_string()),
                ];
                if let Some(tokens) = &continuation {
                    for (key, value) in tokens {
                        params.push((key.as_str(), continuation_value(value)));
                    }
                }
                self.request(&params)?
            };

            if let Some(query) = response.query {
                if let Some(page) = query.pages.into_iter().next() {
                    if page.missing {
                        tracing::warn!(message = "page does not exist", title);
                        return Ok(Vec::new());
                    }
                    revisions.extend(page.revisions.into_iter().map(WireRevision::into_revision));
                }
            }
            match response.continuation {
                Some(next) => continuation = Some(next),
                None => break,
            }
        }

        Ok(revisions)
    }

    /// Query every tag over the last `days` days and reduce the union to
    /// unique pages created with both a mobile and a visual-editor tag.
    ///
    /// A failing tag query is logged and skipped so one bad tag cannot sink
    /// the whole search; if every tag fails the last error is returned.
    pub fn find_mobile_ve_pages(
        &mut self,
        tags: &[String],
        days: i64,
    ) -> Result<Vec<PageCreation>, ApiError> {
        let newest = Utc::now();
        let oldest = newest - chrono::Duration::days(days);

        let mut all_pages = Vec::new();
        let mut succeeded = 0usize;
        let mut last_error = None;

        for tag in tags {
            match self.new_pages_tagged(tag, newest, oldest) {
                Ok(pages) => {
                    tracing::info!(
                        message = "tag query complete",
                        tag = tag.as_str(),
                        pages = pages.len()
                    );
                    succeeded += 1;
                    all_pages.extend(pages);
                }
                Err(err) => {
                    tracing::warn!(
                        message = "tag query failed, skipping",
                        tag = tag.as_str(),
                        error = %err
                    );
                    last_error = Some(err);
                }
            }
        }

        if succeeded == 0 {
            if let Some(err) = last_error {
                return Err(err);
            }
        }

        Ok(filter_mobile_ve(dedupe_by_pageid(all_pages)))
    }

    fn request<Q: DeserializeOwned>(
        &mut self,
        params: &[(&str, String)],
    ) -> Result<ApiResponse<Q>, ApiError> {
        let mut attempt = 0u32;
        loop {
            self.apply_rate_limit();

            let result = self
                .http
                .get(self.config.api_url.as_str())
                .query(&[("format", "json"), ("formatversion", "2")])
                .query(params)
                .send();

            let response = match result {
                Ok(response) => response,
                Err(err) => {
                    if is_retryable_error(&err) && attempt < self.config.max_retries {
                        tracing::warn!(
                            message = "request failed, retrying",
                            error = %err,
                            attempt
                        );
                        self.wait_before_retry(attempt);
                        attempt += 1;
                        continue;
                    }
                    return Err(err.into());
                }
            };

            let status = response.status();
            if !status.is_success() {
                if is_retryable_status(status) && attempt < self.config.max_retries {
                    tracing::warn!(
                        message = "retryable HTTP status",
                        status = status.as_u16(),
                        attempt
                    );
                    self.wait_before_retry(attempt);
                    attempt += 1;
                    continue;
                }
                return Err(ApiError::Status(status.as_u16()));
            }

            let parsed: ApiResponse<Q> = response.json()?;
            if let Some(error) = parsed.error {
                return Err(ApiError::MediaWiki {
                    code: error.code,
                    info: error.info,
                });
            }
            if let Some(warnings) = &parsed.warnings {
                tracing::warn!(message = "API returned warnings", warnings = %warnings);
            }
            return Ok(parsed);
        }
    }

    fn apply_rate_limit(&mut self) {
        if let Some(last) = self.last_request_at {
            let min_gap = Duration::from_millis(self.config.rate_limit_ms);
            let elapsed = last.elapsed();
            if elapsed < min_gap {
                thread::sleep(min_gap - elapsed);
            }
        }
        self.last_request_at = Some(Instant::now());
    }

    fn wait_before_retry(&self, attempt: u32) {
        let base = self
            .config
            .retry_delay_ms
            .saturating_mul(1u64 << attempt.min(6));
        let jitter = rand::thread_rng().gen_range(0..=base / 4);
        thread::sleep(Duration::from_millis(base.saturating_add(jitter)));
    }
}

/// Tags whose name mentions mobile editing or the visual editor.
pub fn mobile_ve_tags(tags: &[TagInfo]) -> Vec<&TagInfo> {
    tags.iter()
        .filter(|tag| {
            let name = tag.name.to_lowercase();
            name.contains("mobile") || name.contains("visual")
        })
        .collect()
}

/// Drop duplicate page creations, keeping the first occurrence of each
/// page id.
pub fn dedupe_by_pageid(pages: Vec<PageCreation>) -> Vec<PageCreation> {
    let mut seen = rustc_hash::FxHashSet::default();
    pages
        .into_iter()
        .filter(|page| seen.insert(page.pageid))
        .collect()
}

/// Keep only pages whose tag list carries both a mobile and a
/// visual-editor tag (lowercase substring match, as tag names vary).
pub fn filter_mobile_ve(pages: Vec<PageCreation>) -> Vec<PageCreation> {
    pages
        .into_iter()
        .filter(|page| {
            let has_mobile = page
                .tags
                .iter()
                .any(|tag| tag.to_lowercase().contains("mobile"));
            let has_ve = page
                .tags
                .iter()
                .any(|tag| tag.to_lowercase().contains("visual"));
            has_mobile && has_ve
        })
        .collect()
}

fn continuation_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_retryable_status(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 408 | 429) || status.is_server_error()
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

#[derive(Debug, Deserialize)]
struct ApiResponse<Q> {
    error: Option<WireError>,
    #[serde(default)]
    warnings: Option<Value>,
    query: Option<Q>,
    #[serde(default, rename = "continue")]
    continuation: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct WireError {
    #[serde(default)]
    code: CompactString,
    #[serde(default)]
    info: String,
}

#[derive(Debug, Deserialize)]
struct TagsQuery {
    #[serde(default)]
    tags: Vec<TagInfo>,
}

#[derive(Debug, Deserialize)]
struct ChangesQuery {
    #[serde(default)]
    recentchanges: Vec<PageCreation>,
}

#[derive(Debug, Deserialize)]
struct RevisionsQuery {
    #[serde(default)]
    pages: Vec<WirePage>,
}

#[derive(Debug, Default, Deserialize)]
struct WirePage {
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    revisions: Vec<WireRevision>,
}

#[derive(Debug, Default, Deserialize)]
struct WireRevision {
    #[serde(default)]
    timestamp: Option<CompactString>,
    #[serde(default)]
    user: Option<CompactString>,
    #[serde(default)]
    comment: Option<String>,
    #[serde(default)]
    tags: Vec<CompactString>,
    #[serde(default)]
    slots: WireSlots,
}

#[derive(Debug, Default, Deserialize)]
struct WireSlots {
    #[serde(default)]
    main: WireSlot,
}

#[derive(Debug, Default, Deserialize)]
struct WireSlot {
    #[serde(default)]
    content: Option<String>,
}

impl WireRevision {
    /// Absent wire fields become empty defaults; the tracker never sees
    /// missing metadata.
    fn into_revision(self) -> Revision {
        Revision {
            text: self.slots.main.content.unwrap_or_default(),
            timestamp: self.timestamp.unwrap_or_default(),
            user: self.user.unwrap_or_default(),
            tags: self.tags,
            comment: self.comment.map(CompactString::from).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_with_tags(pageid: u64, tags: &[&str]) -> PageCreation {
        PageCreation {
            pageid,
            title: CompactString::from("Example"),
            tags: tags.iter().map(|t| CompactString::from(*t)).collect(),
            ..PageCreation::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.rate_limit_ms, 500);
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn test_retryable_status() {
        for code in [408u16, 429, 500, 502, 503, 504] {
            let status = reqwest::StatusCode::from_u16(code).unwrap();
            assert!(is_retryable_status(status), "{code} should be retryable");
        }
        for code in [400u16, 403, 404] {
            let status = reqwest::StatusCode::from_u16(code).unwrap();
            assert!(!is_retryable_status(status), "{code} should not retry");
        }
    }

    #[test]
    fn test_dedupe_keeps_first_occurrence() {
        let pages = vec![
            page_with_tags(1, &["mobile edit"]),
            page_with_tags(2, &[]),
            page_with_tags(1, &["visualeditor"]),
        ];
        let unique = dedupe_by_pageid(pages);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].pageid, 1);
        assert_eq!(unique[0].tags.len(), 1);
        assert_eq!(unique[0].tags[0], "mobile edit");
    }

    #[test]
    fn test_filter_requires_both_tag_families() {
        let pages = vec![
            page_with_tags(1, &["mobile edit", "visualeditor"]),
            page_with_tags(2, &["mobile edit"]),
            page_with_tags(3, &["visualeditor"]),
            page_with_tags(4, &["Mobile web edit", "VisualEditor"]),
            page_with_tags(5, &[]),
        ];
        let filtered = filter_mobile_ve(pages);
        let ids: Vec<u64> = filtered.iter().map(|p| p.pageid).collect();
        assert_eq!(ids, vec![1, 4]);
    }

    #[test]
    fn test_mobile_ve_tag_names() {
        let tags = vec![
            TagInfo {
                name: "mobile edit".into(),
                ..TagInfo::default()
            },
            TagInfo {
                name: "mw-reverted".into(),
                ..TagInfo::default()
            },
            TagInfo {
                name: "visualeditor-wikitext".into(),
                ..TagInfo::default()
            },
        ];
        let relevant = mobile_ve_tags(&tags);
        assert_eq!(relevant.len(), 2);
        assert_eq!(relevant[0].name, "mobile edit");
        assert_eq!(relevant[1].name, "visualeditor-wikitext");
    }

    #[test]
    fn test_wire_revision_defaults() {
        let revision = WireRevision::default().into_revision();
        assert_eq!(revision.text, "");
        assert_eq!(revision.timestamp, "");
        assert_eq!(revision.user, "");
        assert!(revision.tags.is_empty());
        assert_eq!(revision.comment, "");
    }

    #[test]
    fn test_deserialize_recentchanges_response() {
        let body = r#"{
            "batchcomplete": true,
            "continue": { "rccontinue": "20251006000000|123", "continue": "-||" },
            "query": {
                "recentchanges": [
                    {
                        "type": "new",
                        "ns": 0,
                        "title": "Example Town",
                        "pageid": 77,
                        "revid": 1234,
                        "old_revid": 0,
                        "rcid": 99,
                        "user": "Editor",
                        "userid": 42,
                        "oldlen": 0,
                        "newlen": 2048,
                        "timestamp": "2025-10-06T12:34:56Z",
                        "comment": "created",
                        "tags": ["mobile edit", "visualeditor"]
                    }
                ]
            }
        }"#;
        let response: ApiResponse<ChangesQuery> = serde_json::from_str(body).unwrap();
        let query = response.query.unwrap();
        assert_eq!(query.recentchanges.len(), 1);
        let page = &query.recentchanges[0];
        assert_eq!(page.title, "Example Town");
        assert_eq!(page.newlen, 2048);
        assert_eq!(page.change_type, "new");

        let continuation = response.continuation.unwrap();
        assert_eq!(
            continuation_value(&continuation["rccontinue"]),
            "20251006000000|123"
        );
        assert_eq!(continuation_value(&continuation["continue"]), "-||");
    }

    #[test]
    fn test_deserialize_revisions_response() {
        let body = r#"{
            "query": {
                "pages": [
                    {
                        "pageid": 77,
                        "title": "Example Town",
                        "revisions": [
                            {
                                "revid": 1234,
                                "timestamp": "2025-10-06T12:34:56Z",
                                "user": "Editor",
                                "comment": "created",
                                "tags": ["mobile edit"],
                                "slots": { "main": { "content": "== History ==" } }
                            },
                            {
                                "revid": 1235,
                                "slots": { "main": {} }
                            }
                        ]
                    }
                ]
            }
        }"#;
        let response: ApiResponse<RevisionsQuery> = serde_json::from_str(body).unwrap();
        let pages = response.query.unwrap().pages;
        let revisions: Vec<Revision> = pages
            .into_iter()
            .flat_map(|p| p.revisions)
            .map(WireRevision::into_revision)
            .collect();
        assert_eq!(revisions.len(), 2);
        assert_eq!(revisions[0].text, "== History ==");
        assert_eq!(revisions[0].user, "Editor");
        // second revision has no content or metadata; defaults apply
        assert_eq!(revisions[1].text, "");
        assert_eq!(revisions[1].user, "");
    }

    #[test]
    fn test_deserialize_error_response() {
        let body = r#"{
            "error": { "code": "badtag", "info": "Unrecognized tag." }
        }"#;
        let response: ApiResponse<TagsQuery> = serde_json::from_str(body).unwrap();
        let error = response.error.unwrap();
        assert_eq!(error.code, "badtag");
        assert_eq!(error.info, "Unrecognized tag.");
        assert!(response.query.is_none());
    }

    #[test]
    fn test_continuation_value_types() {
        assert_eq!(continuation_value(&Value::String("abc".into())), "abc");
        assert_eq!(continuation_value(&Value::from(17)), "17");
    }

    #[test]
    fn test_missing_page_marker() {
        let body = r#"{
            "query": { "pages": [ { "title": "Nope", "missing": true } ] }
        }"#;
        let response: ApiResponse<RevisionsQuery> = serde_json::from_str(body).unwrap();
        let pages = response.query.unwrap().pages;
        assert!(pages[0].missing);
        assert!(pages[0].revisions.is_empty());
    }
}
