pub mod categories;
pub mod movements;
