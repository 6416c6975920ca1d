pub mod backend;
pub mod config_store;
pub mod storage;

pub use backend::HttpProctorBackend;
pub use config_store::ConfigStore;
pub use storage::FileSessionStorage;
