pub mod client;
pub mod credentials;
