// ============================================================================
// Order Domain
// ============================================================================
//
// - Value objects (Order, Customer, OrderItem)
// - Events (OrderStage labels emitted along the pipeline)
// - Errors (OrderError enum)
//
// ============================================================================

pub mod value_objects;
pub mod events;
pub mod errors;

// Re-export for convenience
pub use value_objects::*;
pub use events::*;
pub use errors::*;
