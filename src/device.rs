pub mod errors;
pub mod raw;
