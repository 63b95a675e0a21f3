pub mod client;

pub use client::PlexHttpAdapter;
