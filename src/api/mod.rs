pub mod client;
pub mod envelope;
pub mod hr;
pub mod leads;
pub mod roles;
pub mod tasks;
