//! Fetch, load and summarize the monthly BiciMAD trip datasets that EMT
//! Madrid publishes as ZIP archives behind its open-data index page.

pub mod aggregate;
pub mod bicimad;
pub mod config;
pub mod error;
pub mod fetch;
pub mod process;

pub use bicimad::BiciMad;
pub use config::Config;
pub use fetch::urls::{LinkIndex, UrlEmt};
pub use process::UsageTable;
