pub mod decoder;
pub mod names;

pub use decoder::{X509Decoder, thumbprint};
