#![allow(dead_code)]

pub mod config;
pub mod encoder;
pub mod mock_pipeline;
pub mod server;
