//! Order value objects.

mod order_id;
mod order_status;
mod order_total;

pub use order_id::OrderId;
pub use order_status::{OrderStatus, UnknownStatus};
pub use order_total::{InvalidTotal, OrderTotal};
