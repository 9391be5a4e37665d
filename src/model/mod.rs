pub mod grammar;
pub mod scenario;
pub mod score;
pub mod session_config;
pub mod transcript;
pub mod turn;
