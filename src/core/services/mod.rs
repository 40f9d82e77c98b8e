pub mod certificate_service;
pub mod finder;
pub mod key_file_resolver;
