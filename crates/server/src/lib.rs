pub mod api;
pub mod clients;
pub mod metrics;
pub mod shutdown;
pub mod state;
