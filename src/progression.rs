use compact_str::CompactString;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::analysis::{self, ContentAnalysis};
use crate::api::{PageCreation, Revision};

/// A section title first seen at `revision` (1-based ordinal).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionAddition {
    pub section: CompactString,
    pub revision: usize,
}

/// First-appearance markers accumulated across a revision sequence.
///
/// The `when_*` ordinals are 1-based, recorded at the first revision whose
/// analysis sets the matching flag and never overwritten afterwards; `None`
/// means the feature never appeared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progression {
    pub sections_added_order: Vec<SectionAddition>,
    pub when_infobox_added: Option<usize>,
    pub when_references_added: Option<usize>,
    pub when_categories_added: Option<usize>,
    pub when_images_added: Option<usize>,
}

/// The full structural history of one article's revision sequence.
///
/// Serialized as-is to the detailed-analysis dataset, so field names and
/// nesting are stable paths for downstream consumers
/// (`progression.when_infobox_added` and the like).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressionRecord {
    pub total_revisions: usize,
    pub revision_analyses: Vec<ContentAnalysis>,
    pub first_revision: Option<ContentAnalysis>,
    pub progression: Progression,
}

/// Analyze an ordered revision sequence, oldest first.
///
/// Runs [`analysis::analyze`] on every revision, attaches the revision
/// metadata, and derives the cross-revision signals: first appearance of
/// infobox/references/categories/images and the section titles newly
/// introduced at each step. Section novelty is decided by title-set
/// difference against the immediately preceding revision, so reordering
/// existing sections adds nothing and a title that disappears and returns
/// is recorded again.
///
/// An empty sequence is not an error: the result is a well-formed record
/// with no analyses, no first revision and all first-appearance ordinals
/// absent. Callers check `revision_analyses.is_empty()`.
pub fn track(revisions: &[Revision]) -> ProgressionRecord {
    let mut record = ProgressionRecord {
        total_revisions: revisions.len(),
        ..ProgressionRecord::default()
    };

    for (idx, revision) in revisions.iter().enumerate() {
        let number = idx + 1;

        let mut analysis = analysis::analyze(&revision.text);
        analysis.revision_number = number;
        analysis.timestamp = revision.timestamp.clone();
        analysis.user = revision.user.clone();
        analysis.tags = revision.tags.clone();
        analysis.comment = revision.comment.clone();

        let progression = &mut record.progression;
        if analysis.has_infobox && progression.when_infobox_added.is_none() {
            progression.when_infobox_added = Some(number);
        }
        if analysis.has_references && progression.when_references_added.is_none() {
            progression.when_references_added = Some(number);
        }
        if analysis.has_categories && progression.when_categories_added.is_none() {
            progression.when_categories_added = Some(number);
        }
        if analysis.has_images && progression.when_images_added.is_none() {
            progression.when_images_added = Some(number);
        }

        if idx > 0 {
            let previous: FxHashSet<&str> = record.revision_analyses[idx - 1]
                .sections
                .iter()
                .map(|heading| heading.title.as_str())
                .collect();

            // document order of the current revision decides entry order;
            // a title repeated within one revision is recorded once
            let mut emitted = FxHashSet::default();
            for heading in &analysis.sections {
                let title = heading.title.as_str();
                if !previous.contains(title) && emitted.insert(title) {
                    progression.sections_added_order.push(SectionAddition {
                        section: heading.title.clone(),
                        revision: number,
                    });
                }
            }
        }

        record.revision_analyses.push(analysis);
    }

    record.first_revision = record.revision_analyses.first().cloned();
    record
}

/// One article's dataset entry: creation metadata plus the tracked
/// progression of its revision history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleAnalysis {
    pub title: CompactString,
    pub page_id: u64,
    pub created: CompactString,
    pub creator: CompactString,
    pub initial_tags: Vec<CompactString>,
    pub editing_pattern: ProgressionRecord,
}

impl ArticleAnalysis {
    pub fn new(page: &PageCreation, editing_pattern: ProgressionRecord) -> Self {
        Self {
            title: page.title.clone(),
            page_id: page.pageid,
            created: page.timestamp.clone(),
            creator: page.user.clone(),
            initial_tags: page.tags.clone(),
            editing_pattern,
        }
    }
}
