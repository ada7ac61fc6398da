pub mod context;
pub mod http;
pub mod integration;
pub mod model;
pub mod operations;
pub mod store;
