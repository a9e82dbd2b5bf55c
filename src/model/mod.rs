pub mod item;
pub mod label;
