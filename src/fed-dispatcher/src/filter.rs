//! The attribute filter (`spec.md §4.5`): a message is allowed iff every
//! attribute requirement is satisfied by a `name=value` pair inside the
//! record's `Security-Label` header, compared case-folded.

use fed_types::{AttributeRequirement, Record};

const LABEL_HEADER: &str = "Security-Label";

/// Evaluates a record's `Security-Label` header against a set of
/// requirements. Short-circuits on the first unmet requirement.
#[derive(Debug, Clone, Default)]
pub struct AttributeFilter {
    requirements: Vec<AttributeRequirement>,
}

impl AttributeFilter {
    pub fn new(requirements: Vec<AttributeRequirement>) -> Self {
        Self { requirements }
    }

    /// An empty requirement set allows everything.
    pub fn allows(&self, record: &Record) -> bool {
        if self.requirements.is_empty() {
            return true;
        }
        let Some(label) = record.header(LABEL_HEADER) else {
            return false;
        };
        let Ok(label) = std::str::from_utf8(label) else {
            return false;
        };
        let pairs = parse_label(label);
        self.requirements.iter().all(|req| {
            pairs.iter().any(|(name, value)| {
                name.eq_ignore_ascii_case(req.name()) && value.eq_ignore_ascii_case(req.value())
            })
        })
    }
}

/// Parses `name=value,name=value` into pairs, skipping malformed entries
/// (a missing `=` makes that entry simply never match).
fn parse_label(label: &str) -> Vec<(&str, &str)> {
    label
        .split(',')
        .filter_map(|entry| entry.split_once('='))
        .map(|(name, value)| (name.trim(), value.trim()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_label(label: &str) -> Record {
        Record {
            topic: "orders".into(),
            offset: 0,
            key: vec![],
            value: vec![],
            headers: vec![("Security-Label".into(), label.as_bytes().to_vec())],
        }
    }

    #[test]
    fn empty_requirements_allow_everything() {
        let filter = AttributeFilter::new(vec![]);
        let record = Record {
            topic: "t".into(),
            offset: 0,
            key: vec![],
            value: vec![],
            headers: vec![],
        };
        assert!(filter.allows(&record));
    }

    #[test]
    fn single_matching_requirement_is_allowed() {
        let filter = AttributeFilter::new(vec![
            AttributeRequirement::new("nationality", "GBR").unwrap(),
        ]);
        assert!(filter.allows(&record_with_label("nationality=GBR")));
    }

    #[test]
    fn case_folded_match_is_allowed() {
        let filter = AttributeFilter::new(vec![
            AttributeRequirement::new("nationality", "GBR").unwrap(),
        ]);
        assert!(filter.allows(&record_with_label("Nationality=gbr")));
    }

    #[test]
    fn multiple_requirements_require_all_present() {
        let filter = AttributeFilter::new(vec![
            AttributeRequirement::new("nationality", "GBR").unwrap(),
            AttributeRequirement::new("clearance", "secret").unwrap(),
        ]);
        assert!(!filter.allows(&record_with_label("nationality=GBR")));
        assert!(filter.allows(&record_with_label("nationality=GBR,clearance=SECRET")));
    }

    #[test]
    fn missing_label_header_is_denied() {
        let filter = AttributeFilter::new(vec![
            AttributeRequirement::new("nationality", "GBR").unwrap(),
        ]);
        let record = Record {
            topic: "t".into(),
            offset: 0,
            key: vec![],
            value: vec![],
            headers: vec![],
        };
        assert!(!filter.allows(&record));
    }
}
