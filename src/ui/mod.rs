pub mod terminal;
pub mod theme;
