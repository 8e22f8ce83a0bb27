//! One-shot system queries and the cache in front of the slow ones.

pub mod cache;
pub mod command;
pub mod info;

pub use cache::TtlCache;
pub use command::{run, CommandRunner, SystemCommand};
pub use info::{CoreCounts, StaticInfo, SystemHeader};
