pub mod cache;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod evolution;
pub mod extract;
pub mod naming;
pub mod output;
pub mod upstream;
pub mod view;
