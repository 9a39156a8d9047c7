/// Database layer
///
/// Connection pooling and migrations. The account, profile, and token
/// models live in the `models` module at crate root level; the
/// [`crate::store`] module wraps them behind the storage trait.
pub mod migrations;
pub mod pool;

pub use migrations::run_migrations;
pub use pool::{create_pool, DatabaseConfig};
