//! Store A: MySQL adapters
//!
//! The relational side of the routing layer. Adapters are constructed
//! with a pool and the caller's numeric admin id; ownership scoping is
//! plain `user_id` filters on every statement, there is nothing like
//! row-level security here.

pub mod budget;
pub mod debt;
pub mod error;
pub mod pool;
pub mod recurring;

pub use budget::MySqlBudgetStore;
pub use debt::MySqlDebtStore;
pub use error::STORE_NAME;
pub use pool::{connect_lazy, create_pool, migrator, shared_pool, MySqlConfig, StorePool};
pub use recurring::MySqlRecurringStore;
