// ============================================================================
// Cart Service - the order/cart aggregate manager
// ============================================================================
//
// - CartService: cart mutations and order queries
// - UserLocks: per-user serialisation of mutations
// - OrderView / CartLineView: read projections
// - CartError / ErrorKind: caller-facing failures
//
// ============================================================================

mod cart_service;
mod errors;
mod locks;
mod views;

pub use cart_service::CartService;
pub use errors::{CartError, ErrorKind};
pub use locks::UserLocks;
pub use views::{CartLineView, OrderView};
