pub mod behavior;
pub mod builder;
pub mod bytes;
pub mod config;
pub mod entities;
pub mod errors;
pub mod keys;
pub mod nibbles;
pub mod node;
pub mod parallel;
pub mod rlp;

pub use behavior::*;
pub use builder::*;
pub use bytes::*;
pub use config::*;
pub use entities::*;
pub use errors::*;
pub use keys::*;
pub use nibbles::*;
pub use node::*;
pub use parallel::*;
