pub mod engine;
pub mod model;
pub mod settings;
pub mod settings_io;
pub mod ui;
