//! Transition planning: one arm per target status, each returning the full
//! side-effect set for that transition.

use chrono::{DateTime, Utc};

use order_store::StockLine;

use super::OrderError;
use super::commands::ApplyTransition;
use super::model::{FulfillmentEntry, Order, StatusChange};
use super::status::{OrderStatus, PaymentStatus};

/// The validated side-effect set of a single transition.
///
/// Produced by [`Order::plan_transition`] without mutating the order, then
/// applied with [`Order::apply_plan`]; the executor commits the mutated
/// document and the restorations as one atomic store write.
#[derive(Debug, Clone)]
pub struct TransitionPlan {
    /// The status being entered.
    pub target: OrderStatus,

    /// Timestamp stamped onto the order and its history entry.
    pub at: DateTime<Utc>,

    /// Who triggered the transition.
    pub actor: String,

    /// Optional operator note.
    pub note: Option<String>,

    /// Shipment record appended for `shipped` transitions.
    pub fulfillment: Option<FulfillmentEntry>,

    /// Inventory to give back, from the order's own recorded quantities.
    /// Non-empty only for `cancelled` transitions.
    pub restorations: Vec<StockLine>,

    /// Whether this transition emits a notification event.
    pub notify: bool,
}

impl Order {
    /// Validates a transition command against the current status and
    /// returns the side effects it mandates. The order is not modified.
    pub fn plan_transition(&self, cmd: &ApplyTransition) -> Result<TransitionPlan, OrderError> {
        if self.deleted {
            return Err(OrderError::OrderDeleted(self.id));
        }
        if !self.status.can_transition_to(cmd.target) {
            return Err(OrderError::InvalidTransition {
                from: self.status,
                to: cmd.target,
            });
        }

        let at = Utc::now();
        let base = TransitionPlan {
            target: cmd.target,
            at,
            actor: cmd.actor.clone(),
            note: cmd.note.clone(),
            fulfillment: None,
            restorations: Vec::new(),
            notify: false,
        };

        let plan = match cmd.target {
            OrderStatus::Processing => TransitionPlan {
                notify: true,
                ..base
            },
            OrderStatus::Shipped => {
                let (tracking_number, carrier) = match (&cmd.tracking_number, &cmd.carrier) {
                    (Some(tracking), Some(carrier))
                        if !tracking.is_empty() && !carrier.is_empty() =>
                    {
                        (tracking.clone(), carrier.clone())
                    }
                    _ => return Err(OrderError::MissingFulfillmentDetails),
                };
                TransitionPlan {
                    fulfillment: Some(FulfillmentEntry {
                        tracking_number,
                        carrier,
                        at,
                        actor: cmd.actor.clone(),
                    }),
                    notify: true,
                    ..base
                }
            }
            OrderStatus::Delivered => base,
            OrderStatus::Cancelled => TransitionPlan {
                restorations: self.stock_lines(),
                notify: true,
                ..base
            },
            OrderStatus::Refunded => base,
            // Nothing transitions back to pending; the table above rejects it.
            OrderStatus::Pending => unreachable!("pending is never a transition target"),
        };

        Ok(plan)
    }

    /// Applies a validated plan: sets the status, stamps the matching
    /// timestamp, and appends the history entries.
    pub fn apply_plan(&mut self, plan: &TransitionPlan) {
        self.status = plan.target;
        match plan.target {
            OrderStatus::Processing => self.processing_at = Some(plan.at),
            OrderStatus::Shipped => self.shipped_at = Some(plan.at),
            OrderStatus::Delivered => self.delivered_at = Some(plan.at),
            OrderStatus::Cancelled => self.cancelled_at = Some(plan.at),
            OrderStatus::Refunded => {
                self.refunded_at = Some(plan.at);
                self.payment_status = PaymentStatus::Refunded;
            }
            OrderStatus::Pending => {}
        }

        self.status_history.push(StatusChange {
            status: plan.target,
            at: plan.at,
            actor: plan.actor.clone(),
            note: plan.note.clone(),
        });

        if let Some(ref entry) = plan.fulfillment {
            self.fulfillment_history.push(entry.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::model::{Address, CustomerRef, OrderItem, OrderNumber};
    use common::{CustomerId, Money, OrderId};

    fn order_in(status: OrderStatus) -> Order {
        let now = Utc::now();
        let items = vec![
            OrderItem::new("SKU-001", "Widget", 2, Money::from_cents(1000)),
            OrderItem::new("SKU-002", "Gadget", 1, Money::from_cents(500)),
        ];
        let subtotal: Money = items.iter().map(|i| i.line_total()).sum();
        Order {
            id: OrderId::new(),
            order_number: OrderNumber::generate(now),
            customer: CustomerRef::new(CustomerId::new(), "Ada", "ada@example.com"),
            items,
            shipping_address: Address::default(),
            billing_address: Address::default(),
            payment_method: "card".to_string(),
            payment_status: PaymentStatus::Paid,
            subtotal,
            shipping: Money::zero(),
            tax: Money::zero(),
            discount: Money::zero(),
            total: subtotal,
            status,
            placed_at: now,
            processing_at: None,
            shipped_at: None,
            delivered_at: None,
            cancelled_at: None,
            refunded_at: None,
            status_history: Vec::new(),
            fulfillment_history: Vec::new(),
            deleted: false,
            note: None,
        }
    }

    fn cmd(target: OrderStatus) -> ApplyTransition {
        ApplyTransition::new(OrderId::new(), target, "ops")
    }

    #[test]
    fn invalid_pairs_are_rejected_without_mutation() {
        for &from in OrderStatus::all() {
            for &to in OrderStatus::all() {
                if from.can_transition_to(to) {
                    continue;
                }
                let order = order_in(from);
                let history_len = order.status_history.len();
                let result = order.plan_transition(&cmd(to));
                assert!(
                    matches!(result, Err(OrderError::InvalidTransition { .. })),
                    "{from} -> {to} should be rejected"
                );
                assert_eq!(order.status, from);
                assert_eq!(order.status_history.len(), history_len);
            }
        }
    }

    #[test]
    fn cancel_plan_restores_recorded_quantities() {
        let order = order_in(OrderStatus::Processing);
        let plan = order.plan_transition(&cmd(OrderStatus::Cancelled)).unwrap();

        assert_eq!(plan.restorations.len(), 2);
        let widget = plan
            .restorations
            .iter()
            .find(|l| l.product_id.as_str() == "SKU-001")
            .unwrap();
        assert_eq!(widget.quantity, 2);
        assert!(plan.notify);
    }

    #[test]
    fn non_cancel_plans_touch_no_stock() {
        let order = order_in(OrderStatus::Pending);
        let plan = order.plan_transition(&cmd(OrderStatus::Processing)).unwrap();
        assert!(plan.restorations.is_empty());

        let order = order_in(OrderStatus::Delivered);
        let plan = order.plan_transition(&cmd(OrderStatus::Refunded)).unwrap();
        assert!(plan.restorations.is_empty());
    }

    #[test]
    fn shipping_requires_fulfillment_details() {
        let order = order_in(OrderStatus::Processing);

        let result = order.plan_transition(&cmd(OrderStatus::Shipped));
        assert!(matches!(result, Err(OrderError::MissingFulfillmentDetails)));

        let result = order.plan_transition(
            &cmd(OrderStatus::Shipped).with_fulfillment("", "UPS"),
        );
        assert!(matches!(result, Err(OrderError::MissingFulfillmentDetails)));

        let plan = order
            .plan_transition(&cmd(OrderStatus::Shipped).with_fulfillment("TRACK-1", "UPS"))
            .unwrap();
        let entry = plan.fulfillment.unwrap();
        assert_eq!(entry.tracking_number, "TRACK-1");
        assert_eq!(entry.carrier, "UPS");
    }

    #[test]
    fn deleted_orders_reject_transitions() {
        let mut order = order_in(OrderStatus::Pending);
        order.deleted = true;

        let result = order.plan_transition(&cmd(OrderStatus::Processing));
        assert!(matches!(result, Err(OrderError::OrderDeleted(_))));
    }

    #[test]
    fn apply_plan_stamps_timestamp_and_history() {
        let mut order = order_in(OrderStatus::Pending);
        let plan = order
            .plan_transition(&cmd(OrderStatus::Processing).with_note("payment confirmed"))
            .unwrap();
        order.apply_plan(&plan);

        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.processing_at, Some(plan.at));
        let entry = order.status_history.last().unwrap();
        assert_eq!(entry.status, OrderStatus::Processing);
        assert_eq!(entry.note.as_deref(), Some("payment confirmed"));
        assert_eq!(entry.actor, "ops");
    }

    #[test]
    fn refund_flips_payment_status() {
        let mut order = order_in(OrderStatus::Delivered);
        let plan = order.plan_transition(&cmd(OrderStatus::Refunded)).unwrap();
        order.apply_plan(&plan);

        assert_eq!(order.status, OrderStatus::Refunded);
        assert_eq!(order.payment_status, PaymentStatus::Refunded);
        assert_eq!(order.refunded_at, Some(plan.at));
    }

    #[test]
    fn shipped_plan_appends_fulfillment_history() {
        let mut order = order_in(OrderStatus::Processing);
        let plan = order
            .plan_transition(&cmd(OrderStatus::Shipped).with_fulfillment("TRACK-9", "DHL"))
            .unwrap();
        order.apply_plan(&plan);

        assert_eq!(order.fulfillment_history.len(), 1);
        assert_eq!(order.fulfillment_history[0].carrier, "DHL");
        assert_eq!(order.shipped_at, Some(plan.at));
    }
}
