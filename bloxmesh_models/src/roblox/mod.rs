pub mod group;
pub mod id;
