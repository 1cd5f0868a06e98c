pub mod interactions;
pub mod mode;
pub mod system;
