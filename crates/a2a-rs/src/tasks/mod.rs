pub mod in_memory_task_store;
pub mod manager;
pub mod store;

pub use in_memory_task_store::InMemoryTaskStore;
pub use manager::TaskManager;
pub use store::TaskStore;
