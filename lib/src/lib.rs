//! Validated, linkable in-memory model of JVM class files
//!
//! Class files come in as [`jvm::class_file::ClassFile`] records, get turned into a
//! [`jvm::model::Class`] (building and resolving the constant pool, decoding members and code
//! along the way) and are later linked against a host [`jvm::class_graph::TypeSystem`].

pub mod jvm;
pub mod util;
