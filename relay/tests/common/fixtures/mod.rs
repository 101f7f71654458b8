//! Reusable test utilities:
//! - Mock HTTP servers (Nitrado API, chat platforms)
//! - relay.toml builder in a temporary working folder
//! - Common test data

// Each integration test binary uses a different subset
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod mock_chat;
pub mod mock_nitrado;
pub mod test_config;
pub mod test_data;

pub use mock_chat::MockChatServer;
pub use mock_nitrado::MockNitradoServer;
pub use test_config::TestConfigBuilder;
pub use test_data::*;
