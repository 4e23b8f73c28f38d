//! Order status state machine.

use serde::{Deserialize, Serialize};

/// The status of an order in its lifecycle.
///
/// Valid transitions:
/// ```text
/// pending ──► processing ──► shipped ──► delivered ──► refunded
///    │             │
///    └─────────────┴──► cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Placed at checkout, awaiting payment confirmation.
    #[default]
    Pending,

    /// Payment confirmed, order is being prepared.
    Processing,

    /// Handed to the carrier.
    Shipped,

    /// Received by the customer. Terminal unless a refund is issued.
    Delivered,

    /// Cancelled before shipping; stock restored (terminal state).
    Cancelled,

    /// Refunded after delivery; no inventory effect (terminal state).
    Refunded,
}

impl OrderStatus {
    /// Returns the statuses this one may transition to.
    pub fn allowed_targets(&self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Pending => &[OrderStatus::Processing, OrderStatus::Cancelled],
            OrderStatus::Processing => &[OrderStatus::Shipped, OrderStatus::Cancelled],
            OrderStatus::Shipped => &[OrderStatus::Delivered],
            OrderStatus::Delivered => &[OrderStatus::Refunded],
            OrderStatus::Cancelled | OrderStatus::Refunded => &[],
        }
    }

    /// Returns true if the transition to `target` is permitted.
    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        self.allowed_targets().contains(&target)
    }

    /// Returns true if no further transitions are possible from this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::Refunded)
    }

    /// Returns the status name as persisted and rendered.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        }
    }

    /// Parses a status from its persisted name.
    pub fn parse(s: &str) -> Option<OrderStatus> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "processing" => Some(OrderStatus::Processing),
            "shipped" => Some(OrderStatus::Shipped),
            "delivered" => Some(OrderStatus::Delivered),
            "cancelled" => Some(OrderStatus::Cancelled),
            "refunded" => Some(OrderStatus::Refunded),
            _ => None,
        }
    }

    /// All statuses, in lifecycle order.
    pub fn all() -> &'static [OrderStatus] {
        &[
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
            OrderStatus::Refunded,
        ]
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment status carried on the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Awaiting payment.
    #[default]
    Pending,

    /// Payment captured.
    Paid,

    /// Payment returned after a refund transition.
    Refunded,
}

impl PaymentStatus {
    /// Returns the payment status name.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_status_is_pending() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn pending_targets() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Processing));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Shipped));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Refunded));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Pending));
    }

    #[test]
    fn processing_targets() {
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Shipped));
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Processing.can_transition_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Processing.can_transition_to(OrderStatus::Pending));
        assert!(!OrderStatus::Processing.can_transition_to(OrderStatus::Refunded));
    }

    #[test]
    fn shipped_only_delivers() {
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Refunded));
    }

    #[test]
    fn delivered_only_refunds() {
        assert!(OrderStatus::Delivered.can_transition_to(OrderStatus::Refunded));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Shipped));
    }

    #[test]
    fn terminal_statuses_have_no_targets() {
        assert!(OrderStatus::Cancelled.allowed_targets().is_empty());
        assert!(OrderStatus::Refunded.allowed_targets().is_empty());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(OrderStatus::Refunded.is_terminal());
        assert!(!OrderStatus::Delivered.is_terminal());
    }

    #[test]
    fn full_transition_matrix() {
        // The six permitted pairs, spelled out; everything else is rejected.
        let allowed = [
            (OrderStatus::Pending, OrderStatus::Processing),
            (OrderStatus::Pending, OrderStatus::Cancelled),
            (OrderStatus::Processing, OrderStatus::Shipped),
            (OrderStatus::Processing, OrderStatus::Cancelled),
            (OrderStatus::Shipped, OrderStatus::Delivered),
            (OrderStatus::Delivered, OrderStatus::Refunded),
        ];
        for &from in OrderStatus::all() {
            for &to in OrderStatus::all() {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn parse_round_trips() {
        for &status in OrderStatus::all() {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::parse("unknown"), None);
    }

    #[test]
    fn serialization_uses_lowercase_names() {
        let json = serde_json::to_string(&OrderStatus::Processing).unwrap();
        assert_eq!(json, "\"processing\"");

        let status: OrderStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(status, OrderStatus::Cancelled);
    }
}
