pub mod bg;
pub mod config;
pub mod fetch_error;
pub mod importers;
pub mod it;
pub mod output;
pub mod period;
pub mod summary;
pub mod utils;
