mod client;

pub use client::GbfsClient;
