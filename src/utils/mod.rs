pub mod locking;
pub mod paths;
