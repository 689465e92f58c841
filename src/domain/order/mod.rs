// ============================================================================
// Order Domain - Business Logic for the Order/Cart Aggregate
// ============================================================================
//
// - Value objects (Money, DiscountPercent, OrderStatus, CartLine, AppliedCoupon)
// - Events (CartOpened, LineAdded, OrderPlaced, etc.)
// - Commands (AddLine, ApplyCoupon, PlaceOrder, etc.)
// - Errors (OrderError enum)
// - Aggregate (OrderAggregate with business logic)
//
// ============================================================================

pub mod value_objects;
pub mod events;
pub mod commands;
pub mod errors;
pub mod aggregate;

// Re-export for convenience
pub use value_objects::*;
pub use events::*;
pub use commands::*;
pub use errors::*;
pub use aggregate::*;
