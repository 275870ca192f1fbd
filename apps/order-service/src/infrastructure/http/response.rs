//! HTTP response DTOs.

use serde::{Deserialize, Serialize};

use crate::application::dto::{OrderListDto, PlaceOrderResultDto};
use crate::domain::orders::OrderId;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
}

/// Response from placing an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderResponse {
    /// Assigned order ID.
    pub order_id: OrderId,
}

impl From<PlaceOrderResultDto> for PlaceOrderResponse {
    fn from(result: PlaceOrderResultDto) -> Self {
        Self {
            order_id: result.order_id,
        }
    }
}

/// Response for a listing.
pub type OrderListResponse = OrderListDto;
