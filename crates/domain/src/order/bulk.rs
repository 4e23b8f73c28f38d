//! Bulk transition coordination: one transition applied across many
//! orders, with per-order validity and per-order atomicity.

use std::collections::HashSet;

use serde::Serialize;

use common::OrderId;
use order_store::OperationsStore;

use crate::error::DomainError;

use super::commands::{ApplyTransition, BulkApplyTransition};
use super::executor::TransitionExecutor;

/// The result of one order within a bulk transition.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum TransitionOutcome {
    /// The transition was applied and committed.
    Applied {
        order_id: OrderId,
        order_number: String,
    },

    /// The order was left untouched; `reason` says why (invalid source
    /// status, missing fulfillment details, lost commit race, ...).
    Skipped { order_id: OrderId, reason: String },
}

impl TransitionOutcome {
    /// Returns true if this outcome applied the transition.
    pub fn is_applied(&self) -> bool {
        matches!(self, TransitionOutcome::Applied { .. })
    }
}

/// Aggregate result of a bulk transition.
#[derive(Debug, Clone, Serialize)]
pub struct BulkOutcome {
    /// Per-order outcomes, in the order the IDs were given.
    pub outcomes: Vec<TransitionOutcome>,

    /// How many orders were actually modified.
    pub modified: usize,
}

impl BulkOutcome {
    /// Returns how many orders were skipped.
    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.modified
    }
}

/// Applies the same transition to a set of orders.
///
/// Existence of every order is checked up front (fail-fast, before any
/// state is touched); after that each order is processed independently
/// through the single-order executor, so one order's invalid status or
/// failed commit never aborts or rolls back the others.
pub struct BulkCoordinator<S: OperationsStore + Clone> {
    executor: TransitionExecutor<S>,
}

impl<S: OperationsStore + Clone> BulkCoordinator<S> {
    /// Creates a coordinator around an executor.
    pub fn new(executor: TransitionExecutor<S>) -> Self {
        Self { executor }
    }

    /// Applies `cmd.target` to every order in the batch.
    #[tracing::instrument(skip(self, cmd), fields(orders = cmd.order_ids.len(), target_status = %cmd.target))]
    pub async fn apply(&self, cmd: BulkApplyTransition) -> Result<BulkOutcome, DomainError> {
        let found = self.executor.store().get_orders(&cmd.order_ids).await?;
        let found_ids: HashSet<OrderId> = found.iter().map(|o| o.id).collect();
        let missing_ids: Vec<OrderId> = cmd
            .order_ids
            .iter()
            .copied()
            .filter(|id| !found_ids.contains(id))
            .collect();
        if !missing_ids.is_empty() {
            return Err(DomainError::OrdersNotFound { missing_ids });
        }

        let mut outcomes = Vec::with_capacity(cmd.order_ids.len());
        let mut modified = 0;

        for &order_id in &cmd.order_ids {
            let single = ApplyTransition {
                order_id,
                target: cmd.target,
                actor: cmd.actor.clone(),
                note: cmd.note.clone(),
                tracking_number: None,
                carrier: None,
            };

            match self.executor.apply_transition(single).await {
                Ok(order) => {
                    modified += 1;
                    outcomes.push(TransitionOutcome::Applied {
                        order_id,
                        order_number: order.order_number().as_str().to_string(),
                    });
                }
                Err(e) => {
                    tracing::debug!(%order_id, error = %e, "order skipped in bulk transition");
                    outcomes.push(TransitionOutcome::Skipped {
                        order_id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        metrics::counter!("bulk_transitions_total").increment(1);
        metrics::counter!("bulk_transition_orders_modified").increment(modified as u64);

        Ok(BulkOutcome { outcomes, modified })
    }
}
