pub mod add;
pub mod audit_helpers;
pub mod history;
pub mod info;
pub mod init;
pub mod remove;
