pub mod daemon;
pub mod once;
