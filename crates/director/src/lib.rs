pub mod agent;
pub mod card;
pub mod chunk;
pub mod cli;
pub mod errors;
pub mod executor;
pub mod selector;
pub mod server;
pub mod settings;
pub mod translate;
pub mod transport;
