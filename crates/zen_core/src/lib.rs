pub mod assistant;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod interpreter;
pub mod locale;
pub mod model;
pub mod session;
pub mod storage;
pub mod store;
pub mod surface;
pub mod task_api;
