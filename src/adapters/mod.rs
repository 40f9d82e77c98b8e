pub mod audit;
pub mod pkcs12;
pub mod stores;
pub mod x509;
