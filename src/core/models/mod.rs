pub mod audit_entry;
pub mod certificate;
pub mod import;
pub mod search_key;
pub mod store_scope;
