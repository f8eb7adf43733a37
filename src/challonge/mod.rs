pub mod client;
pub mod documents;
pub mod provider;

#[cfg(test)]
pub mod fake;
#[cfg(test)]
pub mod mock_server;

pub use client::ChallongeClient;
pub use provider::FetchData;
