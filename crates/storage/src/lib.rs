pub mod data_manager;
pub mod db;
pub mod error;
pub mod memory;
pub mod repositories;
pub mod schema;
pub mod table_store;

pub use data_manager::DataManager;
pub use db::SqliteTableStore;
pub use error::StoreError;
pub use memory::MemoryTableStore;
pub use table_store::{Table, TableStore};
