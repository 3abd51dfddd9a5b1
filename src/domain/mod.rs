// ============================================================================
// Domain Layer - The Order record relayed between services
// ============================================================================
//
// Each service mutates the same Order record in place and hands it on.
// Nothing here talks to the sidecar; see `messaging` for that.
//
// ============================================================================

pub mod order;
