//! HTTP request DTOs.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_json::value::RawValue;

use crate::domain::orders::{CreateOrderCommand, ListOrder, ListQuery, OrderId, OrderStatus};
use crate::error::{ApiError, ErrorCode};

/// Header a client may use instead of the `idempotency_key` body field.
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// Request body for placing an order.
///
/// Fields stay untyped here so that validation can report every missing or
/// mistyped field by name. The total is kept as its raw JSON text so numeric
/// totals never pass through `f64`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaceOrderRequest {
    /// Customer name.
    #[serde(default)]
    pub name: Option<Value>,
    /// Customer phone.
    #[serde(default)]
    pub phone: Option<Value>,
    /// Delivery location.
    #[serde(default)]
    pub location: Option<Value>,
    /// Line items.
    #[serde(default)]
    pub items: Option<Value>,
    /// Total, as a decimal string or number.
    #[serde(default)]
    pub total: Option<Box<RawValue>>,
    /// Client retry token.
    #[serde(default, alias = "idempotencyKey")]
    pub idempotency_key: Option<Value>,
}

impl PlaceOrderRequest {
    /// Parse a request body.
    pub fn from_slice(body: &[u8]) -> Result<Self, ApiError> {
        serde_json::from_slice(body).map_err(|e| {
            ApiError::new(ErrorCode::ValidationError, format!("invalid JSON body: {e}"))
        })
    }

    /// Use `key` unless the body already carries a key.
    #[must_use]
    pub fn with_fallback_idempotency_key(mut self, key: Option<String>) -> Self {
        if self.idempotency_key.is_none() {
            self.idempotency_key = key.map(Value::String);
        }
        self
    }
}

/// Numbers keep their literal digits as a decimal string; anything else is
/// passed on as parsed JSON.
fn total_value(raw: &RawValue) -> Value {
    let text = raw.get().trim();
    if text.starts_with(|c: char| c == '-' || c.is_ascii_digit()) {
        return Value::String(text.to_string());
    }
    serde_json::from_str(text).unwrap_or(Value::Null)
}

impl From<PlaceOrderRequest> for CreateOrderCommand {
    fn from(request: PlaceOrderRequest) -> Self {
        Self {
            name: request.name,
            phone: request.phone,
            location: request.location,
            items: request.items,
            total: request.total.as_deref().map(total_value),
            idempotency_key: request.idempotency_key,
        }
    }
}

/// Query string for listing orders.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListOrdersParams {
    /// `pending` or `completed`.
    pub status: Option<String>,
    /// `history` for most recent first; insertion order otherwise.
    pub view: Option<String>,
}

impl ListOrdersParams {
    /// Convert to a repository query, rejecting unknown values.
    pub fn to_query(&self) -> Result<ListQuery, ApiError> {
        let order = match self.view.as_deref().map(str::trim) {
            None | Some("" | "all") => ListOrder::Insertion,
            Some("history") => ListOrder::MostRecentFirst,
            Some(other) => {
                return Err(ApiError::invalid_field(
                    "view",
                    format!("unknown view '{other}' (expected 'history')"),
                ));
            }
        };

        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                raw.parse::<OrderStatus>()
                    .map_err(|e| ApiError::invalid_field("status", e.to_string()))?,
            ),
        };

        Ok(ListQuery { status, order })
    }
}

/// Parse an order id path segment.
pub fn parse_order_id(raw: &str) -> Result<OrderId, ApiError> {
    raw.trim()
        .parse::<i64>()
        .map(OrderId::new)
        .map_err(|_| ApiError::invalid_field("id", format!("'{raw}' is not an order id")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    fn parse(body: &Value) -> PlaceOrderRequest {
        PlaceOrderRequest::from_slice(body.to_string().as_bytes()).unwrap()
    }

    #[test]
    fn place_order_request_accepts_partial_body() {
        let command = CreateOrderCommand::from(parse(&json!({"name": "Ana"})));
        assert_eq!(command.name, Some(json!("Ana")));
        assert!(command.items.is_none());
        assert!(command.total.is_none());
    }

    #[test]
    fn place_order_request_keeps_mistyped_fields() {
        let command = CreateOrderCommand::from(parse(&json!({"name": 42, "items": "many"})));
        assert_eq!(command.name, Some(json!(42)));
        assert_eq!(command.items, Some(json!("many")));
    }

    #[test_case(r#"{"total": "19.98"}"#, json!("19.98") ; "string")]
    #[test_case(r#"{"total": 19.980}"#, json!("19.980") ; "number keeps scale")]
    #[test_case(r#"{"total": 12345678901234567.89}"#, json!("12345678901234567.89") ; "number keeps digits")]
    #[test_case(r#"{"total": -1}"#, json!("-1") ; "negative number")]
    #[test_case(r#"{"total": true}"#, json!(true) ; "boolean")]
    fn total_is_taken_from_literal(body: &str, expected: Value) {
        let request = PlaceOrderRequest::from_slice(body.as_bytes()).unwrap();
        assert_eq!(CreateOrderCommand::from(request).total, Some(expected));
    }

    #[test]
    fn malformed_body_is_validation_error() {
        let err = PlaceOrderRequest::from_slice(b"{not json").unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }

    #[test]
    fn idempotency_key_camel_case_alias() {
        let request = parse(&json!({"idempotencyKey": "k1"}));
        assert_eq!(request.idempotency_key, Some(json!("k1")));
    }

    #[test]
    fn body_key_wins_over_header() {
        let request = parse(&json!({"idempotency_key": "body"}))
            .with_fallback_idempotency_key(Some("header".to_string()));
        assert_eq!(request.idempotency_key, Some(json!("body")));

        let request = PlaceOrderRequest::default()
            .with_fallback_idempotency_key(Some("header".to_string()));
        assert_eq!(request.idempotency_key, Some(json!("header")));
    }

    #[test_case(None, None, None, ListOrder::Insertion ; "defaults")]
    #[test_case(Some("pending"), None, Some(OrderStatus::Pending), ListOrder::Insertion ; "pending")]
    #[test_case(Some("COMPLETED"), Some("history"), Some(OrderStatus::Completed), ListOrder::MostRecentFirst ; "completed history")]
    fn list_params_to_query(
        status: Option<&str>,
        view: Option<&str>,
        expected_status: Option<OrderStatus>,
        expected_order: ListOrder,
    ) {
        let params = ListOrdersParams {
            status: status.map(str::to_string),
            view: view.map(str::to_string),
        };
        let query = params.to_query().unwrap();
        assert_eq!(query.status, expected_status);
        assert_eq!(query.order, expected_order);
    }

    #[test]
    fn list_params_reject_unknown_values() {
        let params = ListOrdersParams {
            status: Some("shipped".to_string()),
            view: None,
        };
        assert_eq!(params.to_query().unwrap_err().code(), ErrorCode::ValidationError);

        let params = ListOrdersParams {
            status: None,
            view: Some("sideways".to_string()),
        };
        assert!(params.to_query().is_err());
    }

    #[test]
    fn parse_order_id_rejects_garbage() {
        assert_eq!(parse_order_id("17").unwrap(), OrderId::new(17));
        assert!(parse_order_id("abc").is_err());
    }
}
