#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! HTTP fetching and integrity verification for formula artifacts

mod client;
mod download;

pub use client::{NetClient, NetConfig};
pub use download::fetch_and_verify;
