//! Method bodies
//!
//! ### Structure
//!
//! The `Code` attribute of a method holds the bytecode as a flat byte array, with branch targets
//! and exception ranges expressed as byte offsets. [`Code::decode`] turns this into a vector of
//! normalized [`Instruction`]s in which every jump target (branches, switches, exception
//! handlers) is an _index into that vector_. A synthetic `nop` is appended whose `pc` is the code
//! length, so ranges can be scanned without special-casing the end of the method.
//!
//! A method body that contains undecodable bytes is not a fatal error for the class. The body is
//! kept as a [`CodeBody::Invalid`] instead, and whoever tries to use it gets the error.
//!
//! ### Rewriting
//!
//! [`remove_assertion_init`] is a peephole rewrite on the decoded instructions of a static
//! initializer.
//!
//! [0]: https://docs.oracle.com/javase/specs/jvms/se8/html/jvms-4.html#jvms-4.7.3

mod assertions;
mod decoder;
mod instruction;
mod opcodes;

pub use assertions::*;
pub use decoder::*;
pub use instruction::*;
pub use opcodes::*;
