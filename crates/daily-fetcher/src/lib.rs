pub mod config;
pub mod fetch;
pub mod symbols;

pub use config::FetcherConfig;
pub use fetch::run;
