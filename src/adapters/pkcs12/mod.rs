pub mod cert_bags;
pub mod pfx_reader;

pub use pfx_reader::PfxReader;
