pub mod arguments;
pub mod engine;
pub mod exit_codes;
pub mod result;
pub mod types;
