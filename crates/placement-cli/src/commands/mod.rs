pub mod export;
pub mod init;
pub mod score;
pub mod stats;
pub mod sync;
pub mod validate;
