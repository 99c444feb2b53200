// SPDX-License-Identifier: MPL-2.0
//! # wikimve
//!
//! Analysis of Wikipedia articles created with the mobile visual editor: find newly created
//! pages through their change tags, dissect the wikitext structure of every revision, and
//! track how articles grow from first save onwards.
//!
//! ## Overview
//!
//! `wikimve` is a Rust library (and command-line tool) for studying article creation on the
//! mobile web. Wikipedia tags every edit with the platform and editor that produced it
//! (`mobile edit`, `visualeditor`, ...), so the set of articles born in the mobile visual
//! editor is recoverable from the public recent-changes feed. This crate fetches those pages
//! from the MediaWiki Action API, analyzes the structure of each revision (sections,
//! templates, references, links), and derives progression signals such as when an infobox or
//! the first reference appeared.
//!
//! **Key Features:**
//!
//! - **Structural analysis**: A single pass over wikitext counts sections, templates,
//!   references, categories, images, wikilinks and external links, and measures the lead.
//! - **Progression tracking**: Cross-revision signals over a page history: first appearance
//!   of key features, section additions in order, growth per revision.
//! - **Tag-based discovery**: Queries the recent-changes feed per change tag and reduces the
//!   union to pages carrying both a mobile and a visual-editor tag.
//! - **Aggregate statistics and reporting**: Length distributions, creator leaderboards,
//!   creation-time histograms, and a markdown report.
//!
//! ## Getting Started
//!
//! ### Installation
//!
//! Add `wikimve` to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! wikimve = "0.1.0"
//! ```
//!
//! ### Analyzing wikitext
//!
//! [`analysis::analyze`] is a pure function from wikitext to its structural summary:
//!
//! ```rust
//! use wikimve::analysis::analyze;
//!
//! let analysis = analyze(
//!     "{{Infobox town}}\nLead paragraph.\n\n== History ==\nFounded long ago.<ref>source</ref>",
//! );
//! assert!(analysis.has_infobox);
//! assert_eq!(analysis.sections.len(), 1);
//! assert_eq!(analysis.sections[0].title, "History");
//! assert_eq!(analysis.reference_count, 1);
//! ```
//!
//! ### Tracking a revision history
//!
//! [`progression::track`] consumes a revision sequence, oldest first, and derives the
//! cross-revision signals:
//!
//! ```rust
//! use wikimve::api::Revision;
//! use wikimve::progression::track;
//!
//! let revisions = vec![
//!     Revision {
//!         text: "A stub.".to_string(),
//!         ..Revision::default()
//!     },
//!     Revision {
//!         text: "A stub.\n\n== History ==\nNow with a past.".to_string(),
//!         ..Revision::default()
//!     },
//! ];
//! let record = track(&revisions);
//! assert_eq!(record.total_revisions, 2);
//! assert_eq!(record.progression.sections_added_order[0].section, "History");
//! assert_eq!(record.progression.sections_added_order[0].revision, 2);
//! ```
//!
//! ### Fetching from the live API
//!
//! [`api::WikiClient`] talks to the Action API with rate limiting and retries built in:
//!
//! ```no_run
//! use wikimve::api::{ClientConfig, WikiClient};
//!
//! fn main() -> Result<(), wikimve::api::ApiError> {
//!     let mut client = WikiClient::new(ClientConfig::default())?;
//!     let pages = client.find_mobile_ve_pages(
//!         &["mobile edit".to_string(), "visualeditor".to_string()],
//!         30,
//!     )?;
//!     for page in pages.iter().take(5) {
//!         println!("{} by {} ({} bytes)", page.title, page.user, page.newlen);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ### Statistics and reports
//!
//! ```rust
//! use wikimve::api::PageCreation;
//! use wikimve::{report, stats};
//!
//! let pages = vec![PageCreation {
//!     user: "Alice".into(),
//!     newlen: 812,
//!     ..PageCreation::default()
//! }];
//! let summary = stats::summarize(&pages);
//! let markdown = report::render_report(&summary, 30, chrono::Utc::now());
//! assert!(markdown.contains("Total articles analyzed: 1"));
//! ```
//!
//! ## Modules and API
//!
//! ### `analysis` Module
//!
//! **Purpose**: Structural analysis of a single wikitext revision.
//!
//! The central type is [`analysis::ContentAnalysis`]; its field names are the stable JSON
//! shape of the persisted dataset. `analyze` is total: any input string, including the empty
//! one, produces a well-formed analysis.
//!
//! ### `progression` Module
//!
//! **Purpose**: Cross-revision tracking over a page history.
//!
//! [`progression::track`] records the first revision at which an infobox, reference,
//! category or image appeared (1-based, never overwritten) and the section titles newly
//! introduced at each step, in document order. Section novelty is decided against the
//! immediately preceding revision only, so a section that is removed and later restored is
//! recorded again.
//!
//! ### `api` Module
//!
//! **Purpose**: MediaWiki Action API access.
//!
//! [`api::WikiClient`] wraps a blocking `reqwest` client with the polite-bot plumbing:
//! a descriptive user agent, a minimum gap between requests, exponential-backoff retries for
//! transient failures, and transparent `continue` handling for paginated queries.
//!
//! ### `stats` and `report` Modules
//!
//! **Purpose**: Dataset-level aggregates and the markdown report over them.
//!
//! ## Persistence
//!
//! All persisted artifacts are plain JSON written with `serde_json`: the article list
//! (`Vec<api::PageCreation>`, mirroring the recent-changes wire fields) and the detailed
//! analyses (`Vec<progression::ArticleAnalysis>`). Optional progression markers serialize as
//! `null` when the feature never appeared, and consumers treat absent fields as defaults, so
//! datasets written by older versions stay readable.
//!
//! ## Logging and Error Handling
//!
//! - Uses the `tracing` crate for logging; recoverable anomalies (a failing tag query, an
//!   unparseable timestamp) are logged and skipped rather than escalated.
//! - Network and API failures surface as [`api::ApiError`]; the pure analysis path has no
//!   error cases by construction.
//!
//! ## Limitations
//!
//! - **Marker heuristics**: Wikitext is matched textually (`{{Infobox`, `[[Category:`,
//!   `<ref`), not parsed. Unusual capitalization or localized prefixes on non-English wikis
//!   will not be recognized.
//! - **Recent changes horizon**: The recent-changes feed only reaches back about 30 days, so
//!   discovery is limited to recently created articles.
//!
//! ## Dependencies
//!
//! - **`compact_str`**: Used in the public API for efficient handling of short strings
//!   (titles, usernames, tags).
//!
//! ## Licensing
//!
//! This project is licensed under the Mozilla Public License 2.0.

pub mod analysis;
pub mod api;
pub mod progression;
pub mod report;
pub mod stats;
#[cfg(test)]
mod test_support;
pub mod utils;
