//! Shared fixtures for agent core integration tests

pub mod mocks;

#[allow(unused_imports)]
pub use mocks::{EchoTool, FailingTool, MemoryRepository, ScriptedModel, TextTool};
