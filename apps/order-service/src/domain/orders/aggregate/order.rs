//! Order aggregate and its validated creation input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::line_item::LineItem;
use crate::domain::orders::errors::{FieldViolation, OrderError};
use crate::domain::orders::value_objects::{OrderId, OrderStatus, OrderTotal};

/// Longest accepted idempotency key.
pub const MAX_IDEMPOTENCY_KEY_LEN: usize = 128;

/// Untrusted input for placing an order.
///
/// Fields hold raw JSON so that missing fields and wrong types are reported
/// together, each under its own field name.
#[derive(Debug, Clone, Default)]
pub struct CreateOrderCommand {
    /// Customer name.
    pub name: Option<Value>,
    /// Customer phone.
    pub phone: Option<Value>,
    /// Delivery location.
    pub location: Option<Value>,
    /// Raw line items.
    pub items: Option<Value>,
    /// Raw total (decimal string or JSON number).
    pub total: Option<Value>,
    /// Client retry token.
    pub idempotency_key: Option<Value>,
}

/// A validated order, ready to insert.
///
/// Only obtainable through [`NewOrder::new`], so the store never sees
/// partially valid data.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    name: String,
    phone: String,
    location: String,
    items: Vec<LineItem>,
    total: OrderTotal,
    idempotency_key: Option<String>,
}

impl NewOrder {
    /// Validate a command, collecting every violation.
    pub fn new(command: CreateOrderCommand) -> Result<Self, OrderError> {
        let mut violations = Vec::new();

        let name = required_text("name", command.name, &mut violations);
        let phone = required_text("phone", command.phone, &mut violations);
        let location = required_text("location", command.location, &mut violations);
        let items = validate_items(command.items, &mut violations);
        let total = validate_total(command.total, &mut violations);
        let idempotency_key = validate_idempotency_key(command.idempotency_key, &mut violations);

        match (name, phone, location, items, total) {
            (Some(name), Some(phone), Some(location), Some(items), Some(total))
                if violations.is_empty() =>
            {
                Ok(Self {
                    name,
                    phone,
                    location,
                    items,
                    total,
                    idempotency_key,
                })
            }
            _ => Err(OrderError::Validation { violations }),
        }
    }

    /// Customer name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Customer phone.
    #[must_use]
    pub fn phone(&self) -> &str {
        &self.phone
    }

    /// Delivery location.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Line items, in client order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Order total.
    #[must_use]
    pub const fn total(&self) -> OrderTotal {
        self.total
    }

    /// Client retry token, if any.
    #[must_use]
    pub fn idempotency_key(&self) -> Option<&str> {
        self.idempotency_key.as_deref()
    }

    /// Materialize the order as the store would after inserting it.
    #[must_use]
    pub fn into_order(self, id: OrderId, created_at: DateTime<Utc>) -> Order {
        Order {
            id,
            name: self.name,
            phone: self.phone,
            location: self.location,
            items: self.items,
            total: self.total,
            status: OrderStatus::Pending,
            created_at,
            idempotency_key: self.idempotency_key,
        }
    }
}

fn required_text(
    field: &str,
    value: Option<Value>,
    violations: &mut Vec<FieldViolation>,
) -> Option<String> {
    match value {
        Some(Value::String(v)) if !v.trim().is_empty() => Some(v.trim().to_string()),
        Some(Value::String(_)) => {
            violations.push(FieldViolation::new(field, "must not be empty"));
            None
        }
        Some(_) => {
            violations.push(FieldViolation::new(field, "must be a string"));
            None
        }
        None => {
            violations.push(FieldViolation::new(field, "is required"));
            None
        }
    }
}

fn validate_items(
    items: Option<Value>,
    violations: &mut Vec<FieldViolation>,
) -> Option<Vec<LineItem>> {
    let raw = match items {
        Some(Value::Array(raw)) => raw,
        Some(_) => {
            violations.push(FieldViolation::new("items", "must be an array"));
            return None;
        }
        None => {
            violations.push(FieldViolation::new("items", "is required"));
            return None;
        }
    };
    if raw.is_empty() {
        violations.push(FieldViolation::new(
            "items",
            "must contain at least one item",
        ));
        return None;
    }

    let before = violations.len();
    let parsed: Vec<LineItem> = raw
        .into_iter()
        .enumerate()
        .filter_map(|(i, v)| LineItem::from_value(i, v, violations))
        .collect();

    (violations.len() == before).then_some(parsed)
}

fn validate_total(total: Option<Value>, violations: &mut Vec<FieldViolation>) -> Option<OrderTotal> {
    let raw = match total {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(_) => {
            violations.push(FieldViolation::new("total", "must be a decimal string"));
            return None;
        }
        None => {
            violations.push(FieldViolation::new("total", "is required"));
            return None;
        }
    };

    match OrderTotal::parse(&raw) {
        Ok(total) => Some(total),
        Err(e) => {
            violations.push(FieldViolation::new("total", e.to_string()));
            None
        }
    }
}

fn validate_idempotency_key(
    key: Option<Value>,
    violations: &mut Vec<FieldViolation>,
) -> Option<String> {
    let key = match key? {
        Value::String(key) => key,
        _ => {
            violations.push(FieldViolation::new("idempotency_key", "must be a string"));
            return None;
        }
    };
    let trimmed = key.trim();
    if trimmed.is_empty() {
        violations.push(FieldViolation::new("idempotency_key", "must not be empty"));
        return None;
    }
    if trimmed.len() > MAX_IDEMPOTENCY_KEY_LEN {
        violations.push(FieldViolation::new(
            "idempotency_key",
            format!("must be at most {MAX_IDEMPOTENCY_KEY_LEN} characters"),
        ));
        return None;
    }
    Some(trimmed.to_string())
}

/// A persisted order.
///
/// Customer data, items and total never change after creation; `status` is
/// the only mutable field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Store-assigned identifier.
    pub id: OrderId,
    /// Customer name.
    pub name: String,
    /// Customer phone.
    pub phone: String,
    /// Delivery location.
    pub location: String,
    /// Line items, in client order.
    pub items: Vec<LineItem>,
    /// Order total.
    pub total: OrderTotal,
    /// Fulfilment status.
    pub status: OrderStatus,
    /// Store-assigned creation time.
    pub created_at: DateTime<Utc>,
    /// Client retry token, if one was supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

impl Order {
    /// Mark the order completed.
    ///
    /// Returns `true` if the status changed, `false` if it was already
    /// completed.
    pub fn complete(&mut self) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        debug_assert!(self.status.can_transition_to(OrderStatus::Completed));
        self.status = OrderStatus::Completed;
        true
    }
}
