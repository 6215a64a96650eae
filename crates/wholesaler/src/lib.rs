pub mod abstract_trait;
pub mod config;
pub mod di;
pub mod domain;
pub mod handler;
pub mod metrics;
pub mod model;
pub mod repository;
pub mod scheduler;
pub mod service;
pub mod state;
pub mod transport;
