// Library for tests to access modules

pub mod config;
pub mod decoder;
pub mod endpoint;
pub mod error;
pub mod models;
pub mod monitor;
pub mod reconciler;
pub mod reconnect;
pub mod render;
pub mod stream;
pub mod table;
pub mod units;
pub mod version;
