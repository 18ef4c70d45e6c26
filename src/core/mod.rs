pub mod classes;
pub mod collider;
pub mod contact;
pub mod shapes;
