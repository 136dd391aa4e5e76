pub mod category;
pub mod movement;

pub use category::Category;
pub use movement::{CreateMovement, Movement, MovementKind, UpdateMovement};
