pub mod memory;
pub mod mysql;
pub mod service;
pub mod store;

pub use memory::InMemoryOrderStore;
pub use mysql::MySqlOrderStore;
pub use service::*;
pub use store::*;
