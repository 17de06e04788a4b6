/*! Metadata discovery

Sentences carry `<meta name type value>` entries. Their values are aggregated per field
to decide how the field can be filtered on:

- fields with only numeric values become a range filter ([Facet::Slider]) and get their type upgraded to `int`,
- other fields become a multi-select filter ([Facet::Checkbox]), unless they have more distinct
  values than the configured cap, in which case they are left out.

Only the first `max_options` distinct values are kept per field.
!*/
use std::collections::{HashMap, HashSet};

use log::info;
use serde::{Deserialize, Serialize};

use super::sentence::Sentence;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facet {
    Slider,
    Checkbox,
}

/// Filter description of a metadata field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub field: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub facet: Facet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<i64>,
}

/// Aggregated state of a field.
#[derive(Debug, Clone)]
struct MetadataField {
    kind: Option<String>,
    values: HashSet<String>,
    /// more distinct values were seen than kept.
    overflowed: bool,
    /// (min, max), as long as every value was numeric.
    range: Option<(i64, i64)>,
}

impl MetadataField {
    fn new(kind: Option<&str>, value: &str) -> Self {
        let mut values = HashSet::new();
        values.insert(value.to_string());
        Self {
            kind: kind.map(String::from),
            values,
            overflowed: false,
            range: as_number(value).map(|n| (n, n)),
        }
    }

    fn observe(&mut self, value: &str, max_options: usize) {
        if !self.values.contains(value) {
            if self.values.len() < max_options {
                self.values.insert(value.to_string());
            } else {
                self.overflowed = true;
            }
        }

        // once non-numeric, always non-numeric
        if let Some((min, max)) = self.range {
            self.range = as_number(value).map(|n| (min.min(n), max.max(n)));
        }
    }
}

/// Unsigned integers only, no sign nor decimal point.
///
/// Values past `i64::MAX` saturate: they are still numbers.
fn as_number(value: &str) -> Option<i64> {
    if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
        // only overflow can fail here
        Some(value.parse().unwrap_or(i64::MAX))
    } else {
        None
    }
}

/// Incremental per-field metadata aggregation.
#[derive(Debug, Clone)]
pub struct MetadataDiscovery {
    max_options: usize,
    fields: Vec<(String, MetadataField)>,
    index: HashMap<String, usize>,
}

impl MetadataDiscovery {
    pub fn new(max_options: usize) -> Self {
        Self {
            max_options,
            fields: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Aggregate the metadata of a sentence.
    pub fn observe(&mut self, sentence: &Sentence) {
        for meta in sentence.metadata() {
            self.observe_value(&meta.name, meta.kind.as_deref(), &meta.value);
        }
    }

    /// Aggregate a single value.
    ///
    /// The field type is the one declared on its first occurrence.
    pub fn observe_value(&mut self, name: &str, kind: Option<&str>, value: &str) {
        match self.index.get(name) {
            Some(&idx) => self.fields[idx].1.observe(value, self.max_options),
            None => {
                self.index.insert(name.to_string(), self.fields.len());
                self.fields
                    .push((name.to_string(), MetadataField::new(kind, value)));
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field descriptors, in order of first appearance.
    pub fn snapshot(&self) -> Vec<FieldDescriptor> {
        self.fields
            .iter()
            .filter_map(|(name, field)| match field.range {
                Some((min, max)) => {
                    if field.kind.as_deref() != Some("int") {
                        info!(
                            "Changing metadata field {} from type {:?} to int",
                            name, field.kind
                        );
                    }
                    Some(FieldDescriptor {
                        field: name.clone(),
                        kind: Some("int".to_string()),
                        facet: Facet::Slider,
                        min_value: Some(min),
                        max_value: Some(max),
                    })
                }
                // too many options to be useful as checkboxes
                None if field.overflowed => None,
                None => Some(FieldDescriptor {
                    field: name.clone(),
                    kind: field.kind.clone(),
                    facet: Facet::Checkbox,
                    min_value: None,
                    max_value: None,
                }),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_field_is_slider() {
        let mut d = MetadataDiscovery::new(100);
        for year in ["1990", "1991", "2010"] {
            d.observe_value("year", Some("text"), year);
        }

        assert_eq!(
            d.snapshot(),
            vec![FieldDescriptor {
                field: "year".to_string(),
                kind: Some("int".to_string()),
                facet: Facet::Slider,
                min_value: Some(1990),
                max_value: Some(2010),
            }]
        );
    }

    #[test]
    fn text_field_is_checkbox() {
        let mut d = MetadataDiscovery::new(100);
        d.observe_value("speaker", Some("text"), "Jan");
        d.observe_value("speaker", Some("text"), "Piet");

        let snap = d.snapshot();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].facet, Facet::Checkbox);
        assert_eq!(snap[0].kind.as_deref(), Some("text"));
        assert_eq!(snap[0].min_value, None);
    }

    #[test]
    fn numeric_flag_is_monotonic() {
        let mut d = MetadataDiscovery::new(100);
        d.observe_value("age", Some("int"), "12");
        d.observe_value("age", Some("int"), "unknown");
        d.observe_value("age", Some("int"), "14");

        assert_eq!(d.snapshot()[0].facet, Facet::Checkbox);

        // starting non numeric never becomes numeric
        let mut d = MetadataDiscovery::new(100);
        d.observe_value("age", Some("int"), "-");
        d.observe_value("age", Some("int"), "14");
        assert_eq!(d.snapshot()[0].facet, Facet::Checkbox);
    }

    #[test]
    fn signs_and_decimals_are_not_numeric() {
        assert_eq!(as_number("42"), Some(42));
        assert_eq!(as_number("-1"), None);
        assert_eq!(as_number("1.5"), None);
        assert_eq!(as_number(""), None);
        assert_eq!(as_number("007"), Some(7));
        assert_eq!(as_number("99999999999999999999999"), Some(i64::MAX));
    }

    #[test]
    fn huge_values_keep_a_slider() {
        let mut d = MetadataDiscovery::new(100);
        d.observe_value("id", Some("int"), "12");
        d.observe_value("id", Some("int"), "99999999999999999999999");
        let fields = d.snapshot();
        assert_eq!(fields[0].facet, Facet::Slider);
        assert_eq!(fields[0].min_value, Some(12));
        assert_eq!(fields[0].max_value, Some(i64::MAX));
    }

    #[test]
    fn high_cardinality_checkbox_is_dropped() {
        let mut d = MetadataDiscovery::new(3);
        for name in ["a", "b", "c"] {
            d.observe_value("speaker", None, name);
        }
        assert_eq!(d.snapshot().len(), 1);

        d.observe_value("speaker", None, "d");
        assert!(d.snapshot().is_empty());
    }

    #[test]
    fn high_cardinality_slider_is_kept() {
        let mut d = MetadataDiscovery::new(3);
        for n in 0..50 {
            d.observe_value("page", None, &n.to_string());
        }
        let snap = d.snapshot();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].facet, Facet::Slider);
        assert_eq!((snap[0].min_value, snap[0].max_value), (Some(0), Some(49)));
    }

    #[test]
    fn order_does_not_matter() {
        let values = ["3", "1", "7", "1", "5"];
        let mut forward = MetadataDiscovery::new(3);
        let mut backward = MetadataDiscovery::new(3);
        for v in values.iter() {
            forward.observe_value("n", None, v);
        }
        for v in values.iter().rev() {
            backward.observe_value("n", None, v);
        }
        assert_eq!(forward.snapshot(), backward.snapshot());
    }

    #[test]
    fn snapshot_is_idempotent() {
        let mut d = MetadataDiscovery::new(100);
        d.observe_value("year", None, "2000");
        d.observe_value("genre", None, "news");
        assert_eq!(d.snapshot(), d.snapshot());
        assert_eq!(d.snapshot()[0].field, "year");
        assert_eq!(d.snapshot()[1].field, "genre");
    }

    #[test]
    fn serialization() {
        let mut d = MetadataDiscovery::new(100);
        d.observe_value("year", Some("int"), "2000");
        d.observe_value("genre", Some("text"), "news");
        let json = serde_json::to_string(&d.snapshot()).unwrap();
        assert_eq!(
            json,
            r#"[{"field":"year","type":"int","facet":"slider","min_value":2000,"max_value":2000},{"field":"genre","type":"text","facet":"checkbox"}]"#
        );
    }
}
