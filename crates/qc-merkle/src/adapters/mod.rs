pub mod memory_commit;
pub mod memory_db;

pub use memory_commit::*;
pub use memory_db::*;
