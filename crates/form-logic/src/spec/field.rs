use std::cmp::Ordering;
use std::fmt;

use schemars::JsonSchema;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

/// Identifier of a field inside a form.
///
/// Hosts emit ids either as strings or as bare integers, so both are accepted.
/// Ids that look like array indices sort numerically ahead of any other id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, JsonSchema)]
#[serde(transparent)]
pub struct FieldId(String);

impl FieldId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn as_index(&self) -> Option<u64> {
        let index = self.0.parse::<u64>().ok()?;
        (index.to_string() == self.0).then_some(index)
    }
}

impl Ord for FieldId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.as_index(), other.as_index()) {
            (Some(left), Some(right)) => left.cmp(&right),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for FieldId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FieldId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for FieldId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<u64> for FieldId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

struct FieldIdVisitor;

impl<'de> Visitor<'de> for FieldIdVisitor {
    type Value = FieldId;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a field id as string or integer")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<FieldId, E> {
        Ok(FieldId::from(value))
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<FieldId, E> {
        Ok(FieldId(value))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<FieldId, E> {
        Ok(FieldId::from(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<FieldId, E> {
        Ok(FieldId(value.to_string()))
    }

    /// Integral floats name a field; anything else has no target.
    fn visit_f64<E: de::Error>(self, value: f64) -> Result<FieldId, E> {
        if value.is_finite() && value.fract() == 0.0 {
            Ok(FieldId(format!("{}", value as i64)))
        } else {
            Ok(FieldId::default())
        }
    }

    fn visit_unit<E: de::Error>(self) -> Result<FieldId, E> {
        Ok(FieldId::default())
    }

    fn visit_none<E: de::Error>(self) -> Result<FieldId, E> {
        Ok(FieldId::default())
    }
}

impl<'de> Deserialize<'de> for FieldId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(FieldIdVisitor)
    }
}

/// Classification of a field, which selects how its value is read and reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum FieldKind {
    Radio,
    Checkbox,
    Select,
    PaymentMultiple,
    PaymentCheckbox,
    PaymentSelect,
    Rating,
    #[serde(rename = "net_promoter_score")]
    NetPromoterScore,
    /// Text, textarea, email, number and every other free-form input.
    #[default]
    #[serde(other)]
    Text,
}

impl FieldKind {
    /// True when the value is one or more selected discrete options.
    pub fn is_choice_like(self) -> bool {
        matches!(
            self,
            FieldKind::Radio
                | FieldKind::Checkbox
                | FieldKind::Select
                | FieldKind::PaymentMultiple
                | FieldKind::PaymentCheckbox
                | FieldKind::Rating
                | FieldKind::NetPromoterScore
        )
    }

    /// Kinds where several options may be active at once, so the accessor keeps
    /// only the option matching the rule literal.
    pub fn filters_by_literal(self) -> bool {
        matches!(
            self,
            FieldKind::Checkbox | FieldKind::PaymentCheckbox | FieldKind::Select
        )
    }

    /// Text-like kinds whose raw value is escaped before comparison.
    pub fn escapes_raw_value(self) -> bool {
        matches!(self, FieldKind::PaymentSelect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn numeric_ids_sort_before_named_ids() {
        let mut ids = vec![
            FieldId::from("name"),
            FieldId::from("10"),
            FieldId::from("2"),
            FieldId::from("01"),
        ];
        ids.sort();
        let ordered: Vec<&str> = ids.iter().map(FieldId::as_str).collect();
        assert_eq!(ordered, vec!["2", "10", "01", "name"]);
    }

    #[test]
    fn ids_deserialize_from_integers_and_strings() {
        let ids: Vec<FieldId> = serde_json::from_str(r#"[1, "2", null]"#).expect("ids");
        assert_eq!(ids[0], FieldId::from("1"));
        assert_eq!(ids[1], FieldId::from("2"));
        assert!(ids[2].is_empty());

        let keyed: BTreeMap<FieldId, bool> =
            serde_json::from_str(r#"{"3": true, "12": false}"#).expect("map");
        assert_eq!(keyed.keys().next(), Some(&FieldId::from("3")));
    }

    #[test]
    fn unknown_kinds_fall_back_to_text() {
        let kinds: Vec<FieldKind> =
            serde_json::from_str(r#"["email", "net_promoter_score", "payment-select"]"#)
                .expect("kinds");
        assert_eq!(
            kinds,
            vec![
                FieldKind::Text,
                FieldKind::NetPromoterScore,
                FieldKind::PaymentSelect
            ]
        );
        assert!(!FieldKind::PaymentSelect.is_choice_like());
        assert!(FieldKind::Rating.is_choice_like());
    }
}
