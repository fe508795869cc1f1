pub mod polling;
pub mod saas;
pub mod sftp;
