pub mod geo;
pub mod hr;
pub mod leads;
