#![allow(async_fn_in_trait)]
pub mod config;
pub mod crawler;
pub mod error;
pub mod fetch;
pub mod goes;
pub mod layout;
pub mod listing;
pub mod manifest;
pub mod noaa;
pub mod partition;
pub mod pipeline;
pub mod s3;
pub mod sync;
