pub mod init_config;
pub mod migrate;
