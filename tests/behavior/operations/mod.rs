pub mod download;
pub mod transfer;
