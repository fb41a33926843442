//! Validated model of a class
//!
//! This is the representation to use once a class file has been read: names and descriptors are
//! interned (with `.` separators), the constant pool is resolved, and every attribute the model
//! understands has been decoded and checked.
//!
//!   - __Class__ is represented using [`Class`]
//!   - __Method__ is represented using [`Method`]
//!   - __Field__ is represented using [`Field`]
//!
//! Fields and methods share their name, descriptor, flags, and common attributes through
//! [`Member`].

mod class;
mod field;
mod member;
mod method;

pub use class::*;
pub use field::*;
pub use member::{has_duplicates, has_duplicates_hashed, has_duplicates_pairwise, Member, MemberKey};
pub use method::*;
