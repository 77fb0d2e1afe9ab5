//! Side-effecting helpers: where the document lives, how it is locked,
//! written, loaded and watched.

pub mod atomic;
pub mod config;
pub mod lock;
pub mod path;
pub mod store;
pub mod watcher;
