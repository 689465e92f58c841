// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Each aggregate has its own subdirectory with:
// - Value objects
// - Events
// - Commands
// - Errors
// - Aggregate implementation
//
// Persistence and collaborator lookups live outside this layer.
//
// ============================================================================

pub mod core;
pub mod order;

pub use self::core::{Aggregate, DomainEvent};
