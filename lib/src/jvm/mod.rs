//! Build and link models of JVM classes
//!
//! ### Simple example
//!
//! Consider the following class file records (usually produced by [`class_file::ClassFile::parse`]):
//!
//! ```
//! use classlink::jvm::class_file::{ClassFile, ClassConstantIndex, RawConstant};
//! use classlink::jvm::class_graph::{ClassData, ClassGraph, JavaType};
//! use classlink::jvm::model::Class;
//! use classlink::jvm::*;
//!
//! # fn build_class() -> Result<(), Error> {
//! let class_file = ClassFile {
//!     version: Version::JAVA8,
//!     constants: vec![
//!         None,
//!         Some(RawConstant::Utf8(String::from("me/alec/Point"))),
//!         Some(RawConstant::Class { name: 1.into() }),
//!         Some(RawConstant::Utf8(String::from("java/lang/Object"))),
//!         Some(RawConstant::Class { name: 3.into() }),
//!     ],
//!     access_flags: (ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER).bits(),
//!     this_class: 2.into(),
//!     super_class: 4.into(),
//!     interfaces: vec![],
//!     fields: vec![],
//!     methods: vec![],
//!     attributes: vec![],
//! };
//!
//! // Build the class model (this resolves the constant pool)
//! let class = Class::<ClassGraph>::new(
//!     &class_file,
//!     "me.alec.Point",
//!     ParseOptions::empty(),
//!     None,
//!     &LogDiagnostics,
//! )?;
//! assert_eq!(class.name(), "me.alec.Point");
//! assert_eq!(class.super_class_name(), Some("java.lang.Object"));
//!
//! // Link it against a host type system
//! let class_graph = ClassGraph::with_java_lang();
//! let java = class_graph.java_lang();
//! let point = JavaType::class(&class_graph.add_class(ClassData::new(
//!     "me.alec.Point",
//!     Some(java.object),
//!     ClassAccessFlags::PUBLIC,
//! )));
//! class.link(&class_graph, &point, LoadMode::Link, &LogDiagnostics);
//! # Ok(())
//! # }
//! # build_class().unwrap();
//! ```

mod access_flags;
pub mod annotations;
pub(crate) mod binary_format;
pub mod class_file;
pub mod class_graph;
pub mod code;
mod descriptors;
mod diagnostics;
mod errors;
pub mod model;
mod names;
mod options;
pub mod pool;
mod version;

pub use access_flags::*;
pub use descriptors::*;
pub use diagnostics::*;
pub use errors::*;
pub use names::*;
pub use options::*;
pub use version::*;
