//! A small Rust client for the Singapore LTA DataMall API.
//!
//! DataMall endpoints return at most 500 records per call; this crate
//! implements the `$skip`-based pagination flow so a single call returns
//! the whole result set, plus a timestamped CSV export of the records.
//!
//! ## Quick start
//! - Configure authentication via the `DATAMALL_API_KEY` environment
//!   variable or a `.datamallrc` file (supported in the current directory
//!   and in your home directory).
//! - Call [`Client::fetch_all`] with a service name.
//!
//! ```no_run
//! use anyhow::Result;
//! use datamall::Client;
//!
//! fn main() -> Result<()> {
//!     let client = Client::from_env()?;
//!     let taxis = client.fetch_all("Taxi-Availability", &[])?;
//!     println!("{} taxis available", taxis.len());
//!     Ok(())
//! }
//! ```
//!
//! For full usage and configuration details, see the crate README.

#![forbid(unsafe_code)]

mod client;
mod config;
mod error;
pub mod export;
mod util;

pub use client::{Client, ClientConfig, PAGE_SIZE};
