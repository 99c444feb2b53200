use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::utils::{self, finder};

/// One document heading, in document order.
///
/// `level` is derived from the heading delimiter run: each nesting level
/// doubles the number of `=` characters, so `== Title ==` is level 1 and
/// `==== Title ====` is level 2.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionHeading {
    pub title: CompactString,
    pub level: u32,
}

/// Structural fingerprint of a single revision's wikitext.
///
/// Produced by [`analyze`]; the metadata fields (`revision_number`,
/// `timestamp`, `user`, `tags`, `comment`) are left at their defaults and
/// filled in by the progression tracker, which knows the revision's place
/// in the sequence.
///
/// Two counts are deliberate supersets: `template_count` counts every `{{`
/// including infobox openings, and `wikilinks_count` counts every `[[`
/// including file, image and category links.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentAnalysis {
    pub total_chars: usize,
    pub total_lines: usize,
    pub sections: Vec<SectionHeading>,
    pub has_infobox: bool,
    pub has_references: bool,
    pub has_categories: bool,
    pub has_images: bool,
    pub reference_count: usize,
    pub category_count: usize,
    pub image_count: usize,
    pub external_links: usize,
    pub template_count: usize,
    pub lead_length: usize,
    pub wikilinks_count: usize,
    /// 1-based position in the revision sequence; 0 until attached.
    pub revision_number: usize,
    pub timestamp: CompactString,
    pub user: CompactString,
    pub tags: Vec<CompactString>,
    pub comment: CompactString,
}

/// Analyze the raw wikitext of one revision.
///
/// A single pass over the text, line by line in document order. Heading
/// lines end the lead section and contribute a [`SectionHeading`]; every
/// line, heading lines included, is scanned for markup markers. The
/// function is total: any input, including empty or non-wikitext garbage,
/// produces a well-formed analysis.
pub fn analyze(text: &str) -> ContentAnalysis {
    let mut analysis = ContentAnalysis {
        total_chars: text.len(),
        ..ContentAnalysis::default()
    };

    let mut in_lead = true;
    let mut lead_lines = 0usize;

    for line in text.lines() {
        analysis.total_lines += 1;

        let trimmed = line.trim();
        if trimmed.starts_with("==") {
            in_lead = false;
            analysis.sections.push(SectionHeading {
                title: utils::trim_heading(line).into(),
                level: (utils::leading_eq_run(trimmed) / 2) as u32,
            });
        } else if in_lead {
            // running length of the lead lines rejoined with '\n'
            if lead_lines > 0 {
                analysis.lead_length += 1;
            }
            analysis.lead_length += line.len();
            lead_lines += 1;
        }

        // markers are counted independently of heading detection
        if utils::has_match(line, finder!("{{Infobox"))
            || utils::has_match(line, finder!("{{infobox"))
        {
            analysis.has_infobox = true;
        }

        let images = utils::count_matches(line, finder!("[[File:"))
            + utils::count_matches(line, finder!("[[Image:"));
        if images > 0 {
            analysis.has_images = true;
            analysis.image_count += images;
        }

        let categories = utils::count_matches(line, finder!("[[Category:"));
        if categories > 0 {
            analysis.has_categories = true;
            analysis.category_count += categories;
        }

        let references = utils::count_matches(line, finder!("<ref"));
        if references > 0 {
            analysis.has_references = true;
            analysis.reference_count += references;
        }

        analysis.template_count += utils::count_matches(line, finder!("{{"));
        analysis.wikilinks_count += utils::count_matches(line, finder!("[["));

        // one external link per qualifying bullet line, not per URL
        if trimmed.starts_with('*')
            && (utils::has_match(line, finder!("http://"))
                || utils::has_match(line, finder!("https://")))
        {
            analysis.external_links += 1;
        }
    }

    analysis
}
