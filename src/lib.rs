// Library exports for etf-service

pub mod book;
pub mod clearing;
pub mod config;
pub mod error;
pub mod etf;
pub mod http;
pub mod mcast;
pub mod service;
pub mod snapshot;
pub mod symbols;
pub mod types;
pub mod wire;
