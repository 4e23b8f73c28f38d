//! Persistence layer for the store-operations backend.
//!
//! Owns the two pieces of durable state:
//! - versioned order documents (an append-only history lives inside each
//!   document body; the version field backs compare-and-commit writes)
//! - the inventory ledger: per-product `quantity` / `total_sold` counters,
//!   mutated only through order commits, never by catalog edits
//!
//! Two implementations of [`OperationsStore`] are provided: an in-memory
//! store for tests and development, and a PostgreSQL store using sqlx
//! transactions.

pub mod error;
pub mod memory;
pub mod order;
pub mod postgres;
pub mod product;
pub mod query;
pub mod store;

pub use common::{CustomerId, Money, OrderId, ProductId};
pub use error::{Result, StoreError};
pub use memory::InMemoryOperationsStore;
pub use order::{OrderUpdate, StoredOrder, Version};
pub use postgres::PostgresOperationsStore;
pub use product::{ProductDetailsUpdate, ProductRecord, StockLine};
pub use query::OrderQuery;
pub use store::OperationsStore;
