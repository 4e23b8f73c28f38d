//! The transition executor: validates and applies single order operations,
//! coordinating the inventory ledger update as one atomic commit.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;

use common::{Money, OrderId, ProductId};
use order_store::{OperationsStore, OrderUpdate, StoreError, StoredOrder, Version};

use crate::config::PricingConfig;
use crate::error::DomainError;
use crate::notification::{NoopNotifier, NotificationSink, OrderNotification};

use super::OrderError;
use super::commands::{ApplyTransition, CreateOrder, DeleteOrder, OrderOrigin};
use super::model::{Order, OrderItem, OrderNumber, StatusChange};
use super::status::{OrderStatus, PaymentStatus};

/// Executes order commands against an operations store.
///
/// Every operation follows the same shape: read current state, validate,
/// and commit document plus ledger movement in a single store write. A
/// conflicting concurrent writer surfaces as a `VersionConflict`, which the
/// caller may retry from scratch.
pub struct TransitionExecutor<S> {
    store: S,
    pricing: PricingConfig,
    notifier: Arc<dyn NotificationSink>,
}

impl<S: Clone> Clone for TransitionExecutor<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            pricing: self.pricing.clone(),
            notifier: Arc::clone(&self.notifier),
        }
    }
}

impl<S: OperationsStore> TransitionExecutor<S> {
    /// Creates an executor with the given store and pricing; notifications
    /// are dropped until a sink is attached.
    pub fn new(store: S, pricing: PricingConfig) -> Self {
        Self {
            store,
            pricing,
            notifier: Arc::new(NoopNotifier),
        }
    }

    /// Attaches a notification sink.
    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates an order, reserving stock for every line all-or-nothing.
    ///
    /// Line items are frozen from the catalog at this moment: name and unit
    /// price are copied onto the order and never re-read. The reservation
    /// itself is validated and applied inside the store commit, so a
    /// shortfall on any line leaves every product untouched and no order
    /// behind.
    #[tracing::instrument(skip(self, cmd), fields(actor = %cmd.actor, items = cmd.items.len()))]
    pub async fn create_order(&self, cmd: CreateOrder) -> Result<Order, DomainError> {
        if cmd.items.is_empty() {
            return Err(OrderError::EmptyOrder.into());
        }
        for item in &cmd.items {
            if item.quantity == 0 {
                return Err(OrderError::InvalidQuantity {
                    product_id: item.product_id.clone(),
                    quantity: item.quantity,
                }
                .into());
            }
        }

        let product_ids: Vec<ProductId> =
            cmd.items.iter().map(|i| i.product_id.clone()).collect();
        let catalog: HashMap<ProductId, _> = self
            .store
            .get_products(&product_ids)
            .await?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();

        let mut items = Vec::with_capacity(cmd.items.len());
        for requested in &cmd.items {
            let product = catalog
                .get(&requested.product_id)
                .ok_or_else(|| StoreError::ProductNotFound(requested.product_id.clone()))?;
            items.push(OrderItem::new(
                product.id.clone(),
                product.name.clone(),
                requested.quantity,
                product.unit_price,
            ));
        }

        let subtotal: Money = items.iter().map(|i| i.line_total()).sum();
        let shipping = self.pricing.shipping_flat;
        let tax = subtotal.times_basis_points(self.pricing.tax_rate_basis_points);
        let total = subtotal + shipping + tax - cmd.discount;

        let now = Utc::now();
        let (status, payment_status, processing_at) = match cmd.origin {
            OrderOrigin::Checkout => (OrderStatus::Pending, PaymentStatus::Pending, None),
            OrderOrigin::Manual => (OrderStatus::Processing, PaymentStatus::Paid, Some(now)),
        };

        let order = Order {
            id: OrderId::new(),
            order_number: OrderNumber::generate(now),
            customer: cmd.customer,
            items,
            shipping_address: cmd.shipping_address,
            billing_address: cmd.billing_address,
            payment_method: cmd.payment_method,
            payment_status,
            subtotal,
            shipping,
            tax,
            discount: cmd.discount,
            total,
            status,
            placed_at: now,
            processing_at,
            shipped_at: None,
            delivered_at: None,
            cancelled_at: None,
            refunded_at: None,
            status_history: vec![StatusChange {
                status,
                at: now,
                actor: cmd.actor.clone(),
                note: cmd.note.clone(),
            }],
            fulfillment_history: Vec::new(),
            deleted: false,
            note: cmd.note,
        };

        let reservations = order.stock_lines();
        let stored = self.to_stored(&order, Version::first())?;
        self.store.insert_order(stored, &reservations).await?;

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(
            order_number = %order.order_number,
            total_cents = order.total.cents(),
            "order created"
        );

        self.dispatch(Self::notification_for(&order)).await;

        Ok(order)
    }

    /// Applies a single status transition, committing the status change,
    /// the history append, and any inventory restoration as one atomic
    /// unit.
    #[tracing::instrument(skip(self, cmd), fields(order_id = %cmd.order_id, target_status = %cmd.target))]
    pub async fn apply_transition(&self, cmd: ApplyTransition) -> Result<Order, DomainError> {
        let (mut order, version) = self.load(cmd.order_id).await?;

        let plan = order.plan_transition(&cmd)?;
        order.apply_plan(&plan);

        let update = OrderUpdate {
            id: order.id,
            expected_version: version,
            status: order.status.as_str().to_string(),
            deleted: order.deleted,
            body: serde_json::to_value(&order)?,
        };
        self.store.update_order(update, &plan.restorations).await?;

        metrics::counter!("order_transitions_total", "target" => plan.target.as_str())
            .increment(1);
        tracing::info!(
            order_number = %order.order_number,
            status = %order.status,
            "transition applied"
        );

        if plan.notify {
            self.dispatch(Self::notification_for(&order)).await;
        }

        Ok(order)
    }

    /// Soft-deletes an order. Unless the order already restored its stock
    /// (cancelled) or the sale stands as final (refunded), the recorded
    /// item quantities are restored in the same commit.
    #[tracing::instrument(skip(self, cmd), fields(order_id = %cmd.order_id))]
    pub async fn delete_order(&self, cmd: DeleteOrder) -> Result<Order, DomainError> {
        let (mut order, version) = self.load(cmd.order_id).await?;
        if order.deleted {
            return Err(OrderError::AlreadyDeleted(order.id).into());
        }

        let restorations = if order.delete_restores_stock() {
            order.stock_lines()
        } else {
            Vec::new()
        };

        order.mark_deleted(cmd.actor.as_str(), Utc::now());

        let update = OrderUpdate {
            id: order.id,
            expected_version: version,
            status: order.status.as_str().to_string(),
            deleted: true,
            body: serde_json::to_value(&order)?,
        };
        self.store.update_order(update, &restorations).await?;

        metrics::counter!("orders_deleted_total").increment(1);

        Ok(order)
    }

    /// Loads an order by ID, returning None if it doesn't exist.
    pub async fn get_order(&self, id: OrderId) -> Result<Option<Order>, DomainError> {
        match self.store.get_order(id).await? {
            Some(stored) => Ok(Some(serde_json::from_value(stored.body)?)),
            None => Ok(None),
        }
    }

    async fn load(&self, id: OrderId) -> Result<(Order, Version), DomainError> {
        let stored = self
            .store
            .get_order(id)
            .await?
            .ok_or(StoreError::OrderNotFound(id))?;
        let order: Order = serde_json::from_value(stored.body)?;
        Ok((order, stored.version))
    }

    fn to_stored(&self, order: &Order, version: Version) -> Result<StoredOrder, DomainError> {
        Ok(StoredOrder {
            id: order.id,
            order_number: order.order_number.as_str().to_string(),
            customer_id: order.customer.id,
            status: order.status.as_str().to_string(),
            placed_at: order.placed_at,
            deleted: order.deleted,
            version,
            body: serde_json::to_value(order)?,
        })
    }

    fn notification_for(order: &Order) -> OrderNotification {
        OrderNotification {
            order_id: order.id,
            order_number: order.order_number.as_str().to_string(),
            status: order.status,
            customer_email: order.customer.email.clone(),
        }
    }

    /// Delivery failures of the notification side channel never roll back
    /// or block the transition.
    async fn dispatch(&self, notification: OrderNotification) {
        if let Err(e) = self.notifier.notify(notification).await {
            tracing::warn!(error = %e, "notification dispatch failed");
        }
    }
}
