//! AI Doctor Agent core library: skill catalog, clinical tools, agent loop, and HTTP gateway
//! used by the CLI.

pub mod agent;
pub mod config;
pub mod data;
pub mod drugs;
pub mod events;
pub mod gateway;
pub mod init;
pub mod llm;
pub mod logging;
pub mod prompt;
pub mod skills;
pub mod tools;
