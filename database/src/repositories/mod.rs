// Repository functions for the billing core.
//
// Mutating functions take `&mut PgConnection` so the caller can thread a
// single `sqlx::Transaction` through every step of an operation; the
// commit/rollback point is owned by the service layer, never by a
// repository. Read-only list functions run directly against the pool.
//
// Errors are surfaced as raw `sqlx::Error` so the service boundary can
// classify constraint violations (unique collisions and the like) into
// its own taxonomy.

pub mod billing;
pub mod company;
pub mod ledger;
pub mod plan;
pub mod wallet;
