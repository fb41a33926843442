//! Raw class file records
//!
//! These are the structures the class model is built out of. They mirror the binary layout of a
//! class file closely and do not validate anything beyond what is needed to read the bytes.

mod attribute;
mod class;
mod constants;

pub use attribute::*;
pub use class::*;
pub use constants::*;
