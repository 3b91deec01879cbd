mod listing;
mod message;
mod ask;
mod node;

pub use listing::*;
pub use message::*;
pub use ask::*;
pub use node::*;
