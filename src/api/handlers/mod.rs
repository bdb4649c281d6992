pub mod fallback;
pub mod health;
pub mod profile;
pub mod resources;
pub mod token_info;
