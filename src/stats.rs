use chrono::{Datelike, NaiveDateTime, Timelike};
use compact_str::CompactString;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::api::{PageCreation, TIMESTAMP_FORMAT};
use crate::progression::ProgressionRecord;

/// How many creators the leaderboard keeps.
pub const TOP_CREATORS: usize = 10;

pub const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Distribution of initial article lengths in bytes.
///
/// `median` is the upper median (element at `len / 2` of the sorted
/// sequence). An empty input produces the all-zero distribution.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LengthStats {
    pub count: usize,
    pub average: f64,
    pub median: u64,
    pub min: u64,
    pub max: u64,
    pub under_500: usize,
    pub from_500_to_1999: usize,
    pub from_2000_to_4999: usize,
    pub at_least_5000: usize,
}

impl LengthStats {
    pub fn from_lengths(mut lengths: Vec<u64>) -> Self {
        if lengths.is_empty() {
            return Self::default();
        }
        lengths.sort_unstable();

        let count = lengths.len();
        let sum: u64 = lengths.iter().sum();
        let mut stats = Self {
            count,
            average: sum as f64 / count as f64,
            median: lengths[count / 2],
            min: lengths[0],
            max: lengths[count - 1],
            ..Self::default()
        };
        for length in lengths {
            match length {
                0..=499 => stats.under_500 += 1,
                500..=1999 => stats.from_500_to_1999 += 1,
                2000..=4999 => stats.from_2000_to_4999 += 1,
                _ => stats.at_least_5000 += 1,
            }
        }
        stats
    }
}

/// Article creators ranked by page count, ties broken by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreatorStats {
    pub unique: usize,
    pub top: Vec<(CompactString, usize)>,
}

impl CreatorStats {
    pub fn from_pages(pages: &[PageCreation]) -> Self {
        let mut counts: FxHashMap<&CompactString, usize> = FxHashMap::default();
        for page in pages {
            *counts.entry(&page.user).or_default() += 1;
        }

        let unique = counts.len();
        let mut top: Vec<(CompactString, usize)> = counts
            .into_iter()
            .map(|(name, count)| (name.clone(), count))
            .collect();
        top.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top.truncate(TOP_CREATORS);

        Self { unique, top }
    }
}

/// When articles were created: hour-of-day and Monday-first weekday
/// histograms. Timestamps that fail to parse are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreationTimes {
    pub by_hour: [usize; 24],
    pub by_weekday: [usize; 7],
}

impl CreationTimes {
    pub fn from_pages(pages: &[PageCreation]) -> Self {
        let mut times = Self::default();
        for page in pages {
            let Ok(when) = NaiveDateTime::parse_from_str(&page.timestamp, TIMESTAMP_FORMAT)
            else {
                tracing::debug!(
                    message = "skipping unparseable timestamp",
                    timestamp = page.timestamp.as_str()
                );
                continue;
            };
            times.by_hour[when.hour() as usize] += 1;
            times.by_weekday[when.weekday().num_days_from_monday() as usize] += 1;
        }
        times
    }
}

/// Everything the dataset-level report needs, computed in one pass set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub total_pages: usize,
    pub lengths: LengthStats,
    pub creators: CreatorStats,
    pub times: CreationTimes,
}

pub fn summarize(pages: &[PageCreation]) -> DatasetSummary {
    DatasetSummary {
        total_pages: pages.len(),
        lengths: LengthStats::from_lengths(pages.iter().map(|p| p.newlen).collect()),
        creators: CreatorStats::from_pages(pages),
        times: CreationTimes::from_pages(pages),
    }
}

/// Per-article split of edits by platform and editor, from revision tags.
///
/// A revision counts as mobile when any tag mentions "mobile", and as a
/// visual-editor edit when any tag mentions "visual"; the two axes are
/// independent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlatformUsage {
    pub total_revisions: usize,
    pub mobile_edits: usize,
    pub desktop_edits: usize,
    pub ve_edits: usize,
    pub source_edits: usize,
    pub unique_contributors: usize,
}

pub fn platform_usage(record: &ProgressionRecord) -> PlatformUsage {
    let mut usage = PlatformUsage {
        total_revisions: record.total_revisions,
        ..PlatformUsage::default()
    };
    let mut contributors = rustc_hash::FxHashSet::default();

    for analysis in &record.revision_analyses {
        let mobile = analysis
            .tags
            .iter()
            .any(|tag| tag.to_lowercase().contains("mobile"));
        let visual = analysis
            .tags
            .iter()
            .any(|tag| tag.to_lowercase().contains("visual"));
        if mobile {
            usage.mobile_edits += 1;
        } else {
            usage.desktop_edits += 1;
        }
        if visual {
            usage.ve_edits += 1;
        } else {
            usage.source_edits += 1;
        }
        contributors.insert(&analysis.user);
    }
    usage.unique_contributors = contributors.len();
    usage
}

/// Size change per revision over the first `limit` revisions. The first
/// entry is the initial size; later entries may be negative when an edit
/// shrank the article.
pub fn growth_steps(record: &ProgressionRecord, limit: usize) -> Vec<i64> {
    let mut steps = Vec::new();
    let mut previous = 0i64;
    for analysis in record.revision_analyses.iter().take(limit) {
        let chars = analysis.total_chars as i64;
        steps.push(chars - previous);
        previous = chars;
    }
    steps
}
