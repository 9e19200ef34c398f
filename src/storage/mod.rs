pub mod assignment_cache;
pub mod local_store;
pub mod outbox;
