use std::env;

use crate::bg::fetcher::DEFAULT_PROJECTS_URL;
use crate::bg::stateaid::DEFAULT_STATEAID_URL;
use crate::it::fetcher::{DEFAULT_AIDS_BASE_URL, DEFAULT_MEASURES_BASE_URL};

/// Remote source locations, overridable through the environment (or a
/// `.env` file loaded by the binary)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bg_projects_url: String,
    pub bg_stateaid_url: String,
    pub it_aids_base_url: String,
    pub it_measures_base_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            bg_projects_url: env::var("BG_PROJECTS_URL")
                .unwrap_or_else(|_| DEFAULT_PROJECTS_URL.to_string()),
            bg_stateaid_url: env::var("BG_STATEAID_URL")
                .unwrap_or_else(|_| DEFAULT_STATEAID_URL.to_string()),
            it_aids_base_url: env::var("IT_AIDS_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_AIDS_BASE_URL.to_string()),
            it_measures_base_url: env::var("IT_MEASURES_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_MEASURES_BASE_URL.to_string()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bg_projects_url: DEFAULT_PROJECTS_URL.to_string(),
            bg_stateaid_url: DEFAULT_STATEAID_URL.to_string(),
            it_aids_base_url: DEFAULT_AIDS_BASE_URL.to_string(),
            it_measures_base_url: DEFAULT_MEASURES_BASE_URL.to_string(),
        }
    }
}
