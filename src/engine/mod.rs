pub mod agents;
pub mod engine;
pub mod error;
pub mod llm_client;
pub mod llm_decode;
pub mod prompt_builder;
pub mod protocol;
pub mod script_parser;
pub mod validated;
