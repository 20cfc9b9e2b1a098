pub mod amount;
pub mod api;
pub mod config;
pub mod fetcher;
pub mod models;
pub mod retry;
pub mod rpc;
pub mod scanner;
pub mod service;
pub mod window;
