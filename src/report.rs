use chrono::{DateTime, Utc};

use crate::analysis::ContentAnalysis;
use crate::progression::ProgressionRecord;
use crate::stats::{growth_steps, platform_usage, DatasetSummary, WEEKDAY_NAMES};

/// How many revisions the growth table shows before eliding the rest.
pub const GROWTH_WINDOW: usize = 10;

const GENERATED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render the dataset-level markdown report.
///
/// Sections with nothing to say (an empty length distribution, hours with
/// no creations) are omitted rather than zero-filled.
pub fn render_report(summary: &DatasetSummary, days: i64, generated: DateTime<Utc>) -> String {
    let mut lines = Vec::new();

    lines.push("# Mobile Visual Editor Article Creation Analysis Report".to_string());
    lines.push(String::new());
    lines.push(format!("Generated: {}", generated.format(GENERATED_FORMAT)));
    lines.push(String::new());
    lines.push("## Executive Summary".to_string());
    lines.push(String::new());
    lines.push(format!(
        "- Total articles analyzed: {}",
        summary.total_pages
    ));
    lines.push(format!("- Date range: last {days} days"));
    lines.push("- Platform: mobile web visual editor".to_string());
    lines.push(String::new());
    lines.push("## Key Findings".to_string());

    let lengths = &summary.lengths;
    if lengths.count > 0 {
        lines.push(String::new());
        lines.push("### Initial Article Length".to_string());
        lines.push(String::new());
        lines.push(format!("- Average: {:.0} bytes", lengths.average));
        lines.push(format!("- Median: {} bytes", lengths.median));
        lines.push(format!("- Range: {} to {} bytes", lengths.min, lengths.max));
        lines.push(String::new());
        let category = if lengths.average < 500.0 {
            "as **stubs** - very short articles that need expansion."
        } else if lengths.average < 2000.0 {
            "as **short articles** - basic but incomplete coverage."
        } else {
            "as **substantial articles** - relatively complete from the start."
        };
        lines.push(format!(
            "Articles created this way typically start {category}"
        ));
        lines.push(String::new());
        lines.push(format!(
            "- Very short (<500 bytes): {} ({:.1}%)",
            lengths.under_500,
            percent(lengths.under_500, lengths.count)
        ));
        lines.push(format!(
            "- Short (500-2000 bytes): {} ({:.1}%)",
            lengths.from_500_to_1999,
            percent(lengths.from_500_to_1999, lengths.count)
        ));
        lines.push(format!(
            "- Medium (2000-5000 bytes): {} ({:.1}%)",
            lengths.from_2000_to_4999,
            percent(lengths.from_2000_to_4999, lengths.count)
        ));
        lines.push(format!(
            "- Long (5000+ bytes): {} ({:.1}%)",
            lengths.at_least_5000,
            percent(lengths.at_least_5000, lengths.count)
        ));
    }

    let creators = &summary.creators;
    lines.push(String::new());
    lines.push("### Creator Behavior".to_string());
    lines.push(String::new());
    lines.push(format!("- Unique creators: {}", creators.unique));
    if creators.unique > 0 {
        lines.push(format!(
            "- Articles per creator: {:.2} on average",
            summary.total_pages as f64 / creators.unique as f64
        ));
    }
    let top_creator_count = creators.top.first().map(|(_, count)| *count).unwrap_or(0);
    if top_creator_count > 5 {
        lines.push(format!(
            "- Power users detected: some creators made {top_creator_count}+ articles"
        ));
        lines.push(
            "- This suggests experienced mobile editors are comfortable creating articles"
                .to_string(),
        );
    } else {
        lines.push("- Most creators made only 1-2 articles".to_string());
        lines.push(
            "- This suggests mobile article creation may be used by newcomers".to_string(),
        );
    }

    let times = &summary.times;
    lines.push(String::new());
    lines.push("### Creation Times".to_string());
    lines.push(String::new());
    lines.push("By hour of day (UTC):".to_string());
    lines.push(String::new());
    let max_hour = times.by_hour.iter().copied().max().unwrap_or(0);
    for (hour, &count) in times.by_hour.iter().enumerate() {
        if count == 0 {
            continue;
        }
        lines.push(format!(
            "    {hour:02}:00 - {count:3} {}",
            bar(count, max_hour)
        ));
    }
    lines.push(String::new());
    lines.push("By day of week:".to_string());
    lines.push(String::new());
    let max_day = times.by_weekday.iter().copied().max().unwrap_or(0);
    for (day, &count) in times.by_weekday.iter().enumerate() {
        if count == 0 {
            continue;
        }
        lines.push(format!(
            "    {:<10} - {count:3} {}",
            WEEKDAY_NAMES[day],
            bar(count, max_day)
        ));
    }

    if !creators.top.is_empty() {
        lines.push(String::new());
        lines.push("### Top Creators".to_string());
        lines.push(String::new());
        for (rank, (name, count)) in creators.top.iter().enumerate() {
            lines.push(format!("{}. {name}: {count} articles", rank + 1));
        }
    }

    lines.push(String::new());
    lines.join("\n")
}

/// Render one article's revision progression as a markdown section.
pub fn render_progression(title: &str, record: &ProgressionRecord) -> String {
    let mut lines = Vec::new();

    lines.push(format!("## Revision Progression: {title}"));
    lines.push(String::new());

    if record.revision_analyses.is_empty() {
        lines.push("No revision data available.".to_string());
        lines.push(String::new());
        return lines.join("\n");
    }

    let first = &record.revision_analyses[0];
    let last = &record.revision_analyses[record.revision_analyses.len() - 1];
    lines.push(format!("- Total revisions: {}", record.total_revisions));
    lines.push(format!("- First revision: {}", first.timestamp));
    lines.push(format!("- Latest revision: {}", last.timestamp));
    lines.push(String::new());
    lines.push("### Article Growth".to_string());
    lines.push(String::new());

    let steps = growth_steps(record, GROWTH_WINDOW);
    for (idx, (analysis, step)) in record
        .revision_analyses
        .iter()
        .zip(&steps)
        .enumerate()
    {
        let platform = if is_tagged(analysis, "mobile") {
            "mobile"
        } else {
            "desktop"
        };
        let editor = if is_tagged(analysis, "visual") {
            "visual"
        } else {
            "source"
        };
        lines.push(format!(
            "    Rev {}: {:5} bytes ({step:+}) [{platform}, {editor}] by {}",
            idx + 1,
            analysis.total_chars,
            analysis.user
        ));
    }
    if record.revision_analyses.len() > GROWTH_WINDOW {
        lines.push(format!(
            "    ... ({} more revisions)",
            record.revision_analyses.len() - GROWTH_WINDOW
        ));
    }

    let usage = platform_usage(record);
    lines.push(String::new());
    lines.push("### Editing Platform Usage".to_string());
    lines.push(String::new());
    lines.push(format!(
        "- Mobile edits: {} ({:.1}%)",
        usage.mobile_edits,
        percent(usage.mobile_edits, usage.total_revisions)
    ));
    lines.push(format!(
        "- Desktop edits: {} ({:.1}%)",
        usage.desktop_edits,
        percent(usage.desktop_edits, usage.total_revisions)
    ));
    lines.push(format!(
        "- Visual editor: {} ({:.1}%)",
        usage.ve_edits,
        percent(usage.ve_edits, usage.total_revisions)
    ));
    lines.push(format!(
        "- Source editor: {} ({:.1}%)",
        usage.source_edits,
        percent(usage.source_edits, usage.total_revisions)
    ));
    lines.push(format!(
        "- Unique contributors: {}",
        usage.unique_contributors
    ));
    if usage.unique_contributors > 1 {
        lines.push(String::new());
        lines.push("Multiple editors collaborated on this article.".to_string());
    }

    lines.push(String::new());
    lines.join("\n")
}

fn is_tagged(analysis: &ContentAnalysis, needle: &str) -> bool {
    analysis
        .tags
        .iter()
        .any(|tag| tag.to_lowercase().contains(needle))
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

fn bar(count: usize, max_count: usize) -> String {
    "█".repeat(count / std::cmp::max(1, max_count / 20))
}
