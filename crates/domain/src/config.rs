//! Pricing configuration injected into the transition executor.

use common::Money;

/// Flat pricing knobs applied at order creation.
///
/// Passed in at construction rather than read from ambient global state, so
/// two executors with different configurations can coexist in one process.
#[derive(Debug, Clone)]
pub struct PricingConfig {
    /// Flat shipping charge added to every order.
    pub shipping_flat: Money,

    /// Flat tax multiplier in basis points (825 = 8.25%), applied to the
    /// order subtotal.
    pub tax_rate_basis_points: i64,
}

impl PricingConfig {
    /// Creates a pricing configuration.
    pub fn new(shipping_flat: Money, tax_rate_basis_points: i64) -> Self {
        Self {
            shipping_flat,
            tax_rate_basis_points,
        }
    }

    /// Free shipping, no tax. Useful for tests.
    pub fn free() -> Self {
        Self {
            shipping_flat: Money::zero(),
            tax_rate_basis_points: 0,
        }
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self::free()
    }
}
