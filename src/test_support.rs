//! Shared builders and proptest strategies for the test suite.

use compact_str::CompactString;

use crate::api::{PageCreation, Revision};

pub mod prelude {
    pub(crate) use super::strategies;
    pub(crate) use super::{page_creation, revision, tagged_revision};
    pub(crate) use proptest::prelude::*;
}

pub fn revision(text: &str) -> Revision {
    Revision {
        text: text.to_string(),
        timestamp: "2025-10-06T12:00:00Z".into(),
        user: "Example".into(),
        tags: Vec::new(),
        comment: "test edit".into(),
    }
}

pub fn tagged_revision(text: &str, tags: &[&str]) -> Revision {
    Revision {
        tags: tags.iter().map(|tag| CompactString::from(*tag)).collect(),
        ..revision(text)
    }
}

pub fn page_creation(pageid: u64, title: &str, user: &str, newlen: u64) -> PageCreation {
    PageCreation {
        change_type: "new".into(),
        title: title.into(),
        pageid,
        user: user.into(),
        newlen,
        timestamp: "2025-10-06T12:00:00Z".into(),
        tags: vec!["mobile edit".into(), "visualeditor".into()],
        ..PageCreation::default()
    }
}

pub mod strategies {
    use compact_str::CompactString;
    use proptest::prelude::*;

    use crate::api::Revision;

    /// One line of plausible wikitext; the arms cover every marker the
    /// analyzer scans for, weighted towards plain prose.
    fn wikitext_line() -> impl Strategy<Value = String> {
        prop_oneof![
            4 => "[ -~]{0,40}",
            2 => ("={2,6}", "[A-Za-z][A-Za-z ]{0,19}")
                .prop_map(|(run, title)| format!("{run} {title} {run}")),
            1 => Just("{{Infobox settlement".to_string()),
            1 => "[A-Za-z ]{0,10}".prop_map(|s| format!("{s}<ref>cite</ref>")),
            1 => "[A-Za-z]{1,10}".prop_map(|name| format!("[[Category:{name}]]")),
            1 => "[A-Za-z]{1,10}".prop_map(|name| format!("[[File:{name}.jpg]]")),
            1 => "[A-Za-z]{1,10}".prop_map(|name| format!("* http://example.org/{name}")),
        ]
    }

    pub fn wikitext() -> impl Strategy<Value = String> {
        proptest::collection::vec(wikitext_line(), 0..12).prop_map(|lines| lines.join("\n"))
    }

    prop_compose! {
        pub fn revision()
                (text in wikitext(),
                 mobile in proptest::bool::weighted(0.5),
                 visual in proptest::bool::weighted(0.5))
        -> Revision {
            let mut tags = Vec::new();
            if mobile {
                tags.push(CompactString::from("mobile edit"));
            }
            if visual {
                tags.push(CompactString::from("visualeditor"));
            }
            Revision {
                text,
                timestamp: "2025-10-06T12:00:00Z".into(), /* fixed, the content is what varies */
                user: "Example".into(),
                tags,
                comment: CompactString::default(),
            }
        }
    }

    pub fn revisions(max: usize) -> impl Strategy<Value = Vec<Revision>> {
        proptest::collection::vec(revision(), 0..max)
    }
}
