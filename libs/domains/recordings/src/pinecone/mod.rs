mod client;
mod config;

pub use client::PineconeRepository;
pub use config::PineconeConfig;
