pub mod config;
pub mod executor;
pub mod resources;
pub mod store;

pub use executor::{HttpExecutor, RequestExecutor, TransportError};
pub use resources::{CaseFileStore, ExperimentStore, Resource, ScheduleStore};
pub use store::{ResourceState, ResourceStore, StoreId};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
