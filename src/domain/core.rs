use uuid::Uuid;

// ============================================================================
// Aggregate Root Pattern
// ============================================================================
//
// 1. Commands are validated against current state before anything changes
// 2. Validated commands produce events describing what happened
// 3. Events are applied to state; applying never re-validates
// 4. Aggregates enforce business invariants
//
// ============================================================================

/// Generic Aggregate trait
///
/// Type Parameters:
/// - `Event`: The domain event type for this aggregate
/// - `Command`: The command type for this aggregate
/// - `Error`: The error type for business rule violations
pub trait Aggregate: Sized + Send + Sync {
    type Event: DomainEvent;
    type Command;
    type Error;

    /// Create new aggregate from first event
    fn apply_first_event(event: &Self::Event) -> Result<Self, Self::Error>;

    /// Apply subsequent events to update state
    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error>;

    /// Handle command and emit events (business logic)
    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;

    /// Get aggregate ID
    fn aggregate_id(&self) -> Uuid;

    /// Get current version
    fn version(&self) -> i64;

    /// Validate a command and apply the events it produces.
    ///
    /// On error the aggregate may be partially updated and must be discarded.
    fn execute(&mut self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        let events = self.handle_command(command)?;

        for event in &events {
            self.apply_event(event)?;
        }

        Ok(events)
    }
}

/// Domain events expose a stable name for logs and metrics.
pub trait DomainEvent: Clone + Send + Sync {
    fn event_type(&self) -> &'static str;
}
