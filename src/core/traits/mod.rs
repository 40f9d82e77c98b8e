pub mod audit;
pub mod cert_store;
pub mod decoder;
pub mod key_provider;
