mod interned;
mod link_cell;
mod scratch;

pub use interned::*;
pub use link_cell::*;
pub use scratch::*;
