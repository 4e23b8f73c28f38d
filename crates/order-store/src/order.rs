use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use common::{CustomerId, OrderId};

/// Version number for an order document, used for optimistic concurrency
/// control.
///
/// Versions start at 1 when the order is inserted and increment by 1 on
/// every committed update. Writers pass the version they read; a mismatch
/// at commit time means another writer got there first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    /// Creates a new version from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the first version (1) assigned at insert.
    pub fn first() -> Self {
        Self(1)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw version value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Version {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Version> for i64 {
    fn from(version: Version) -> Self {
        version.0
    }
}

/// A persisted order document along with the metadata the store indexes.
///
/// The full order (items, addresses, history arrays) lives in `body` as
/// JSON; the other fields are duplicated out of the body so queries can
/// filter without deserializing every document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredOrder {
    /// Primary key of the order.
    pub id: OrderId,

    /// Human-facing order number, globally unique.
    pub order_number: String,

    /// The customer who placed the order.
    pub customer_id: CustomerId,

    /// Current status, as the domain serializes it (e.g. "processing").
    pub status: String,

    /// When the order was placed.
    pub placed_at: DateTime<Utc>,

    /// Soft-delete flag. Orders are never physically removed.
    pub deleted: bool,

    /// Current document version, checked on every write.
    pub version: Version,

    /// The full order document as JSON.
    pub body: serde_json::Value,
}

/// A compare-and-commit update of an order document.
///
/// The write succeeds only if the stored version still equals
/// `expected_version`; otherwise it fails with
/// [`StoreError::VersionConflict`](crate::StoreError::VersionConflict) and
/// nothing (including any accompanying stock restorations) is applied.
#[derive(Debug, Clone)]
pub struct OrderUpdate {
    /// The order being updated.
    pub id: OrderId,

    /// The version the writer read before computing this update.
    pub expected_version: Version,

    /// New status value.
    pub status: String,

    /// New soft-delete flag.
    pub deleted: bool,

    /// The replacement document body.
    pub body: serde_json::Value,
}
