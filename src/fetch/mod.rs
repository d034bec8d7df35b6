// src/fetch/mod.rs
//! Discovery and download of the monthly trips archives.

pub mod client;
pub mod links;
pub mod urls;
pub mod zips;

pub use client::{HttpClient, HttpResponse, ReqwestClient};
pub use links::{get_links, get_links_from_bytes};
pub use urls::{validate_period, LinkIndex, UrlEmt};
pub use zips::extract_csv;
