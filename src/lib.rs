pub mod alerts;
pub mod config;
pub mod constants;
pub mod districts;
pub mod domain;
pub mod error;
pub mod fallback;
pub mod formatters;
pub mod geo;
pub mod models;
pub mod persistence;
pub mod plows;
pub mod prediction;
pub mod providers;
pub mod resolver;
pub mod service;
pub mod traffic;

#[cfg(test)]
mod test_support;
