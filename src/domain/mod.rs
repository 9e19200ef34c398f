pub mod attendance;
pub mod fields;
pub mod filter;
pub mod lead;
pub mod leave;
pub mod models;
pub mod reconcile;
pub mod task;
