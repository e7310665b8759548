mod client;
mod ops;
mod rest;

pub use client::StoreClient;
pub use ops::{CollectionAccessor, ListOptions};
