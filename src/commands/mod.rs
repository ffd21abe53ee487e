pub mod library;
pub mod operations;
pub mod presets;
pub mod settings;
