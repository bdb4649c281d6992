pub mod identity;
pub mod profile;
pub mod resources;
