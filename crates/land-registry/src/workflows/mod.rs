pub mod registry;
pub mod wizard;
