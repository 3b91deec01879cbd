mod chat;
mod config;
mod gallery;
mod links;

pub use chat::*;
pub use config::*;
pub use gallery::*;
pub use links::*;
