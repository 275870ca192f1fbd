//! Line items and their storage codec.
//!
//! Items are persisted as a JSON array in a single `TEXT` column. Encoding
//! and decoding live here so that the repository never handles raw item
//! JSON itself.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::orders::errors::FieldViolation;

/// One entry of an order: a product and how many of it.
///
/// Fields beyond `product` and `qty` (price, notes, ...) are kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product reference.
    pub product: String,
    /// Quantity, at least 1.
    pub qty: u32,
    /// Any additional client-supplied fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LineItem {
    /// Create an item without extra fields.
    pub fn new(product: impl Into<String>, qty: u32) -> Self {
        Self {
            product: product.into(),
            qty,
            extra: Map::new(),
        }
    }

    /// Validate one untrusted JSON element at position `index`.
    ///
    /// Violations are pushed to `violations` with paths like `items[1].qty`.
    pub(crate) fn from_value(
        index: usize,
        value: Value,
        violations: &mut Vec<FieldViolation>,
    ) -> Option<Self> {
        let Value::Object(mut fields) = value else {
            violations.push(FieldViolation::new(
                format!("items[{index}]"),
                "must be an object with 'product' and 'qty'",
            ));
            return None;
        };

        let product = match fields.remove("product") {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
            Some(Value::String(_)) => {
                violations.push(FieldViolation::new(
                    format!("items[{index}].product"),
                    "must not be empty",
                ));
                None
            }
            Some(_) => {
                violations.push(FieldViolation::new(
                    format!("items[{index}].product"),
                    "must be a string",
                ));
                None
            }
            None => {
                violations.push(FieldViolation::new(
                    format!("items[{index}].product"),
                    "is required",
                ));
                None
            }
        };

        let qty = match fields.remove("qty") {
            Some(Value::Number(n)) => match n.as_u64().and_then(|q| u32::try_from(q).ok()) {
                Some(q) if q >= 1 => Some(q),
                _ => {
                    violations.push(FieldViolation::new(
                        format!("items[{index}].qty"),
                        "must be a whole number of at least 1",
                    ));
                    None
                }
            },
            Some(_) => {
                violations.push(FieldViolation::new(
                    format!("items[{index}].qty"),
                    "must be a number",
                ));
                None
            }
            None => {
                violations.push(FieldViolation::new(
                    format!("items[{index}].qty"),
                    "is required",
                ));
                None
            }
        };

        Some(Self {
            product: product?,
            qty: qty?,
            extra: fields,
        })
    }
}

/// Serialize items for storage.
pub fn encode_items(items: &[LineItem]) -> Result<String, serde_json::Error> {
    serde_json::to_string(items)
}

/// Deserialize items read from storage.
///
/// Anything other than a JSON array of well-formed items is an error.
pub fn decode_items(raw: &str) -> Result<Vec<LineItem>, serde_json::Error> {
    serde_json::from_str(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn from_value_accepts_minimal_item() {
        let mut violations = Vec::new();
        let item = LineItem::from_value(0, json!({"product": "Widget", "qty": 2}), &mut violations);
        assert!(violations.is_empty());
        assert_eq!(item, Some(LineItem::new("Widget", 2)));
    }

    #[test]
    fn from_value_keeps_extra_fields() {
        let mut violations = Vec::new();
        let item = LineItem::from_value(
            0,
            json!({"product": "Widget", "qty": 1, "price": "9.99"}),
            &mut violations,
        )
        .unwrap();
        assert_eq!(item.extra.get("price"), Some(&json!("9.99")));
    }

    #[test]
    fn from_value_reports_each_bad_field() {
        let mut violations = Vec::new();
        let item = LineItem::from_value(3, json!({"product": "  ", "qty": 0}), &mut violations);
        assert!(item.is_none());
        let fields: Vec<_> = violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["items[3].product", "items[3].qty"]);
    }

    #[test]
    fn from_value_rejects_non_object() {
        let mut violations = Vec::new();
        assert!(LineItem::from_value(0, json!("Widget"), &mut violations).is_none());
        assert_eq!(violations[0].field, "items[0]");
    }

    #[test]
    fn from_value_rejects_fractional_qty() {
        let mut violations = Vec::new();
        assert!(
            LineItem::from_value(0, json!({"product": "Widget", "qty": 1.5}), &mut violations)
                .is_none()
        );
        assert_eq!(violations[0].field, "items[0].qty");
    }

    #[test]
    fn decode_rejects_non_array() {
        assert!(decode_items(r#"{"product":"Widget","qty":1}"#).is_err());
        assert!(decode_items("not json").is_err());
    }

    #[test]
    fn encode_writes_flat_objects() {
        let mut item = LineItem::new("Widget", 2);
        item.extra.insert("price".to_string(), json!("9.99"));
        let encoded = encode_items(&[item]).unwrap();
        let value: Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(value, json!([{"product": "Widget", "qty": 2, "price": "9.99"}]));
    }

    fn arb_item() -> impl Strategy<Value = LineItem> {
        (
            "[a-zA-Z][a-zA-Z0-9 ]{0,15}",
            1u32..10_000,
            proptest::collection::btree_map("x_[a-z]{1,6}", "[a-z0-9]{0,8}", 0..3),
        )
            .prop_map(|(product, qty, extra)| LineItem {
                product,
                qty,
                extra: extra
                    .into_iter()
                    .map(|(k, v)| (k, Value::String(v)))
                    .collect(),
            })
    }

    proptest! {
        #[test]
        fn items_survive_storage_round_trip(items in proptest::collection::vec(arb_item(), 1..8)) {
            let encoded = encode_items(&items).unwrap();
            let decoded = decode_items(&encoded).unwrap();
            prop_assert_eq!(decoded, items);
        }
    }
}
