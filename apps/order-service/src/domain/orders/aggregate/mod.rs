//! Order Aggregate

mod line_item;
mod order;

pub use line_item::{LineItem, decode_items, encode_items};
pub use order::{CreateOrderCommand, MAX_IDEMPOTENCY_KEY_LEN, NewOrder, Order};
