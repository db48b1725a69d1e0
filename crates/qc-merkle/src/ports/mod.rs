pub mod commit;
pub mod database;

pub use commit::*;
pub use database::*;
