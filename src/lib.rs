// Library root module for union-courier
// This file defines the public API and module structure for the
// union-courier library

pub mod config;
pub mod encode;
pub mod errors;
pub mod metrics;
pub mod routes;
pub mod signing;
pub mod transport;
