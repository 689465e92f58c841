//! Cart and order aggregate manager.
//!
//! Keeps one Pending order (the cart) per user, applies item, quantity and
//! coupon mutations to it atomically, and closes it as a placed order.
//! Totals are always `subtotal - discount`, recomputed from the lines.

pub mod config;
pub mod domain;
pub mod lookup;
pub mod metrics;
pub mod persistence;
pub mod service;
pub mod utils;
