pub mod instance;
pub mod model;
pub mod texture;
