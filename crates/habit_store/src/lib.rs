pub mod error;
pub mod record;
pub mod store;

pub use crate::error::StoreError;
pub use crate::store::{HabitStore, HabitStoreBuilder};
