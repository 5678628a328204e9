//! Order lifecycle as one tagged state.
//!
//! The database keeps two text columns (`status`, `delivery_stage`) for
//! queryability, but the domain type joins them so a rejected-and-shipped
//! order cannot exist. Decoding a row with an inconsistent pair is an error.

use serde::Serialize;
use utoipa::ToSchema;

pub const STATUS_PENDING: &str = "PENDING";
pub const STATUS_ACCEPTED: &str = "ACCEPTED";
pub const STATUS_REJECTED: &str = "REJECTED";

pub const STAGE_PREPARING: &str = "PREPARING";
pub const STAGE_SHIPPED: &str = "SHIPPED";
pub const STAGE_DELIVERED: &str = "DELIVERED";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStage {
    Preparing,
    Shipped,
    Delivered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "status", content = "deliveryStage", rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Accepted(DeliveryStage),
    Rejected,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("Invalid action")]
    InvalidAction,
    #[error("order row has inconsistent status columns: {status:?}/{stage:?}")]
    InconsistentRow {
        status: String,
        stage: Option<String>,
    },
}

/// Seller decision on a pending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderAction {
    Accept,
    Reject,
}

impl OrderAction {
    pub fn parse(action: &str) -> Result<Self, LifecycleError> {
        match action {
            "accept" => Ok(OrderAction::Accept),
            "reject" => Ok(OrderAction::Reject),
            _ => Err(LifecycleError::InvalidAction),
        }
    }
}

impl OrderStatus {
    /// Column encoding: `(status, delivery_stage)`.
    pub fn encode(self) -> (&'static str, Option<&'static str>) {
        match self {
            OrderStatus::Pending => (STATUS_PENDING, None),
            OrderStatus::Accepted(DeliveryStage::Preparing) => {
                (STATUS_ACCEPTED, Some(STAGE_PREPARING))
            }
            OrderStatus::Accepted(DeliveryStage::Shipped) => (STATUS_ACCEPTED, Some(STAGE_SHIPPED)),
            OrderStatus::Accepted(DeliveryStage::Delivered) => {
                (STATUS_ACCEPTED, Some(STAGE_DELIVERED))
            }
            OrderStatus::Rejected => (STATUS_REJECTED, None),
        }
    }

    pub fn decode(status: &str, stage: Option<&str>) -> Result<Self, LifecycleError> {
        match (status, stage) {
            (STATUS_PENDING, None) => Ok(OrderStatus::Pending),
            (STATUS_REJECTED, None) => Ok(OrderStatus::Rejected),
            (STATUS_ACCEPTED, Some(STAGE_PREPARING)) => {
                Ok(OrderStatus::Accepted(DeliveryStage::Preparing))
            }
            (STATUS_ACCEPTED, Some(STAGE_SHIPPED)) => {
                Ok(OrderStatus::Accepted(DeliveryStage::Shipped))
            }
            (STATUS_ACCEPTED, Some(STAGE_DELIVERED)) => {
                Ok(OrderStatus::Accepted(DeliveryStage::Delivered))
            }
            (status, stage) => Err(LifecycleError::InconsistentRow {
                status: status.to_string(),
                stage: stage.map(ToString::to_string),
            }),
        }
    }

    /// Applies the seller's decision. Only a pending order can move.
    pub fn apply(self, action: OrderAction) -> Option<OrderStatus> {
        match (self, action) {
            (OrderStatus::Pending, OrderAction::Accept) => {
                Some(OrderStatus::Accepted(DeliveryStage::Preparing))
            }
            (OrderStatus::Pending, OrderAction::Reject) => Some(OrderStatus::Rejected),
            _ => None,
        }
    }

    /// Admin hands the order to a rider. Gated on `Accepted(Preparing)` so a
    /// double assignment or a rejected order cannot ship.
    pub fn mark_shipped(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Accepted(DeliveryStage::Preparing) => {
                Some(OrderStatus::Accepted(DeliveryStage::Shipped))
            }
            _ => None,
        }
    }

    /// Terminal transition; the order is immutable afterwards.
    pub fn mark_delivered(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Accepted(DeliveryStage::Shipped) => {
                Some(OrderStatus::Accepted(DeliveryStage::Delivered))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trips_all_states() {
        let states = [
            OrderStatus::Pending,
            OrderStatus::Accepted(DeliveryStage::Preparing),
            OrderStatus::Accepted(DeliveryStage::Shipped),
            OrderStatus::Accepted(DeliveryStage::Delivered),
            OrderStatus::Rejected,
        ];
        for state in states {
            let (status, stage) = state.encode();
            assert_eq!(OrderStatus::decode(status, stage).unwrap(), state);
        }
    }

    #[test]
    fn rejected_plus_shipped_is_unrepresentable() {
        let err = OrderStatus::decode(STATUS_REJECTED, Some(STAGE_SHIPPED)).unwrap_err();
        assert!(matches!(err, LifecycleError::InconsistentRow { .. }));
        assert!(OrderStatus::decode(STATUS_PENDING, Some(STAGE_PREPARING)).is_err());
        assert!(OrderStatus::decode(STATUS_ACCEPTED, None).is_err());
    }

    #[test]
    fn pending_transitions_are_terminal() {
        let accepted = OrderStatus::Pending.apply(OrderAction::Accept).unwrap();
        assert_eq!(accepted, OrderStatus::Accepted(DeliveryStage::Preparing));
        // No double action, no reversal.
        assert!(accepted.apply(OrderAction::Accept).is_none());
        assert!(accepted.apply(OrderAction::Reject).is_none());
        assert!(OrderStatus::Rejected.apply(OrderAction::Accept).is_none());
    }

    #[test]
    fn shipping_is_gated_on_preparing() {
        let preparing = OrderStatus::Accepted(DeliveryStage::Preparing);
        let shipped = preparing.mark_shipped().unwrap();
        assert_eq!(shipped, OrderStatus::Accepted(DeliveryStage::Shipped));
        assert!(shipped.mark_shipped().is_none());
        assert!(OrderStatus::Pending.mark_shipped().is_none());
        assert!(OrderStatus::Rejected.mark_shipped().is_none());
    }

    #[test]
    fn delivery_is_gated_on_shipped() {
        let shipped = OrderStatus::Accepted(DeliveryStage::Shipped);
        let delivered = shipped.mark_delivered().unwrap();
        assert_eq!(delivered, OrderStatus::Accepted(DeliveryStage::Delivered));
        assert!(delivered.mark_delivered().is_none());
        assert!(delivered.mark_shipped().is_none());
        assert!(OrderStatus::Accepted(DeliveryStage::Preparing)
            .mark_delivered()
            .is_none());
    }

    #[test]
    fn action_parsing_rejects_unknown_verbs() {
        assert_eq!(OrderAction::parse("accept").unwrap(), OrderAction::Accept);
        assert_eq!(OrderAction::parse("reject").unwrap(), OrderAction::Reject);
        assert_eq!(
            OrderAction::parse("cancel").unwrap_err(),
            LifecycleError::InvalidAction
        );
    }
}
