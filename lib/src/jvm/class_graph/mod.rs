//! Host type system the class model links against
//!
//! The class model never loads classes itself. Everything it needs to know about other types
//! goes through the [`TypeSystem`] capability trait. [`ClassGraph`] is a small, thread-safe,
//! in-memory implementation of that trait.

use super::{
    well_known, BaseType, ClassAccessFlags, FieldAccessFlags, FieldType, LoadMode,
    MethodAccessFlags, MethodDescriptor, ParseDescriptor, RefType,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::fmt::Debug;
use std::sync::Arc;

mod assignable;
mod java_classes;

pub use assignable::*;
pub use java_classes::*;

/// Capabilities of the host type system needed to link a class model
///
/// Descriptors passed in use `.` as the package separator. Every method must be safe to call
/// concurrently, since linking the same class can happen from several threads at once.
pub trait TypeSystem: Sync {
    /// Loaded (or placeholder) type
    type Type: Clone + Debug + PartialEq + Send + Sync + 'static;

    /// Resolved field
    type Field: Clone + Debug + Send + Sync + 'static;

    /// Resolved method
    type Method: Clone + Debug + Send + Sync + 'static;

    /// Load a type by its binary name (or array descriptor) in the context of `context`
    fn load_class(&self, context: &Self::Type, name: &str, mode: LoadMode)
        -> Result<Self::Type, String>;

    /// Placeholder for a type that could not be loaded
    fn unloadable(&self, name: &str) -> Self::Type;

    fn is_unloadable(&self, ty: &Self::Type) -> bool;

    fn is_interface(&self, ty: &Self::Type) -> bool;

    fn is_abstract(&self, ty: &Self::Type) -> bool;

    /// Direct superclass
    fn super_type(&self, ty: &Self::Type) -> Option<Self::Type>;

    /// Is `ty` the same as, or a subtype of, `super_type`?
    fn is_subtype_of(&self, ty: &Self::Type, super_type: &Self::Type) -> bool;

    /// Find a field declared on `ty` or inherited by it
    fn find_field(&self, ty: &Self::Type, name: &str, descriptor: &str) -> Option<Self::Field>;

    /// Find a method declared on `ty` (or inherited, if `inherited` is set)
    fn find_method(
        &self,
        ty: &Self::Type,
        name: &str,
        descriptor: &str,
        inherited: bool,
    ) -> Option<Self::Method>;

    /// Find a method declared on interface `ty` or its superinterfaces
    fn find_interface_method(
        &self,
        ty: &Self::Type,
        name: &str,
        descriptor: &str,
    ) -> Option<Self::Method>;

    /// `java.lang.Object`
    fn object_type(&self) -> Self::Type;

    /// Type of a field descriptor
    fn field_type(&self, context: &Self::Type, descriptor: &str, mode: LoadMode) -> Self::Type;

    /// Parameter types of a method descriptor
    fn argument_types(
        &self,
        context: &Self::Type,
        descriptor: &str,
        mode: LoadMode,
    ) -> Vec<Self::Type>;

    /// Return type of a method descriptor
    fn return_type(&self, context: &Self::Type, descriptor: &str, mode: LoadMode) -> Self::Type;

    /// Can code in `from` refer to `ty`?
    fn is_accessible_from(&self, ty: &Self::Type, from: &Self::Type) -> bool;
}

/// Shared handle to a class in the graph
pub type ClassRef = Arc<ClassData>;

/// Type in a [`ClassGraph`]
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum JavaType {
    Base(BaseType),
    Void,
    Ref(RefType<ClassRef>),

    /// Type that could not be loaded, kept by name
    Unloadable(Arc<str>),
}

impl JavaType {
    pub fn class(class: &ClassRef) -> JavaType {
        JavaType::Ref(RefType::Object(class.clone()))
    }

    /// Binary name of the type, if it is a class or interface
    pub fn class_name(&self) -> Option<&str> {
        match self {
            JavaType::Ref(RefType::Object(class)) => Some(&class.name),
            JavaType::Unloadable(name) => Some(name),
            _ => None,
        }
    }
}

/// Tracks the relationships between classes/interfaces and the members on those classes
///
/// Classes are inserted fully formed (superclass first) and never change afterwards, so they can
/// be shared freely across threads.
#[derive(Default)]
pub struct ClassGraph {
    classes: RwLock<HashMap<String, ClassRef>>,
}

impl ClassGraph {
    /// New empty graph
    pub fn new() -> ClassGraph {
        ClassGraph::default()
    }

    /// Add a new class to the class graph
    pub fn add_class(&self, data: ClassData) -> ClassRef {
        let data = Arc::new(data);
        log::trace!("Adding {} to class graph", data.name);
        self.classes.write().insert(data.name.clone(), data.clone());
        data
    }

    pub fn lookup_class(&self, name: &str) -> Option<ClassRef> {
        self.classes.read().get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.classes.read().len()
    }

    /// Resolve a parsed descriptor type, returning the first class name that is missing
    fn resolve_field_type(&self, field_type: FieldType<String>) -> Result<JavaType, String> {
        let class = |name: String| -> Result<ClassRef, String> {
            self.lookup_class(&name)
                .ok_or_else(|| format!("Class not found: {}", name))
        };
        Ok(match field_type {
            FieldType::Base(base) => JavaType::Base(base),
            FieldType::Ref(RefType::Object(name)) => JavaType::Ref(RefType::Object(class(name)?)),
            FieldType::Ref(RefType::PrimitiveArray(arr)) => {
                JavaType::Ref(RefType::PrimitiveArray(arr))
            }
            FieldType::Ref(RefType::ObjectArray(arr)) => {
                JavaType::Ref(RefType::ObjectArray(crate::jvm::ArrayType {
                    additional_dimensions: arr.additional_dimensions,
                    element_type: class(arr.element_type)?,
                }))
            }
        })
    }

    fn resolve_or_unloadable(&self, field_type: FieldType<String>, descriptor: &str) -> JavaType {
        self.resolve_field_type(field_type).unwrap_or_else(|msg| {
            log::debug!("{}", msg);
            JavaType::Unloadable(Arc::from(descriptor))
        })
    }

    /// Class that member lookups on a type should start from
    fn lookup_start(&self, ty: &JavaType) -> Option<ClassRef> {
        match ty {
            JavaType::Ref(RefType::Object(class)) => Some(class.clone()),
            JavaType::Ref(_) => self.lookup_class(well_known::OBJECT),
            _ => None,
        }
    }
}

impl TypeSystem for ClassGraph {
    type Type = JavaType;
    type Field = Arc<FieldData>;
    type Method = Arc<MethodData>;

    fn load_class(&self, _context: &JavaType, name: &str, mode: LoadMode) -> Result<JavaType, String> {
        log::trace!("Loading {} ({:?})", name, mode);
        if name.starts_with('[') {
            let field_type = FieldType::<String>::parse(name).map_err(|err| err.to_string())?;
            self.resolve_field_type(field_type)
        } else {
            self.lookup_class(name)
                .map(|class| JavaType::class(&class))
                .ok_or_else(|| format!("Class not found: {}", name))
        }
    }

    fn unloadable(&self, name: &str) -> JavaType {
        JavaType::Unloadable(Arc::from(name))
    }

    fn is_unloadable(&self, ty: &JavaType) -> bool {
        matches!(ty, JavaType::Unloadable(_))
    }

    fn is_interface(&self, ty: &JavaType) -> bool {
        match ty {
            JavaType::Ref(RefType::Object(class)) => class.is_interface(),
            _ => false,
        }
    }

    fn is_abstract(&self, ty: &JavaType) -> bool {
        match ty {
            JavaType::Ref(RefType::Object(class)) => {
                class.access_flags.contains(ClassAccessFlags::ABSTRACT)
            }
            JavaType::Ref(_) => true,
            _ => false,
        }
    }

    fn super_type(&self, ty: &JavaType) -> Option<JavaType> {
        match ty {
            JavaType::Ref(RefType::Object(class)) => {
                class.superclass.as_ref().map(JavaType::class)
            }
            JavaType::Ref(_) => self.lookup_class(well_known::OBJECT).map(|c| JavaType::class(&c)),
            _ => None,
        }
    }

    fn is_subtype_of(&self, ty: &JavaType, super_type: &JavaType) -> bool {
        match (ty, super_type) {
            (JavaType::Ref(sub), JavaType::Ref(sup)) => sub.is_assignable(sup),
            (sub, sup) => sub == sup,
        }
    }

    fn find_field(&self, ty: &JavaType, name: &str, descriptor: &str) -> Option<Arc<FieldData>> {
        self.lookup_start(ty)?.find_field(name, descriptor)
    }

    fn find_method(
        &self,
        ty: &JavaType,
        name: &str,
        descriptor: &str,
        inherited: bool,
    ) -> Option<Arc<MethodData>> {
        let mut next_class = self.lookup_start(ty);
        while let Some(class) = next_class {
            if let Some(method) = class.declared_method(name, descriptor) {
                return Some(method);
            }
            if !inherited {
                break;
            }
            next_class = class.superclass.clone();
        }
        None
    }

    fn find_interface_method(
        &self,
        ty: &JavaType,
        name: &str,
        descriptor: &str,
    ) -> Option<Arc<MethodData>> {
        let mut to_visit: Vec<ClassRef> = self.lookup_start(ty).into_iter().collect();
        while let Some(class) = to_visit.pop() {
            if let Some(method) = class.declared_method(name, descriptor) {
                return Some(method);
            }
            to_visit.extend(class.interfaces.iter().cloned());
        }
        None
    }

    fn object_type(&self) -> JavaType {
        self.lookup_class(well_known::OBJECT)
            .map(|class| JavaType::class(&class))
            .unwrap_or_else(|| self.unloadable(well_known::OBJECT))
    }

    fn field_type(&self, _context: &JavaType, descriptor: &str, _mode: LoadMode) -> JavaType {
        match FieldType::<String>::parse(descriptor) {
            Ok(field_type) => self.resolve_or_unloadable(field_type, descriptor),
            Err(_) => self.unloadable(descriptor),
        }
    }

    fn argument_types(&self, _context: &JavaType, descriptor: &str, _mode: LoadMode) -> Vec<JavaType> {
        match MethodDescriptor::<String>::parse(descriptor) {
            Ok(method) => method
                .parameters
                .into_iter()
                .map(|parameter| {
                    let rendered = crate::jvm::RenderDescriptor::render(&parameter);
                    self.resolve_or_unloadable(parameter, &rendered)
                })
                .collect(),
            Err(_) => vec![],
        }
    }

    fn return_type(&self, _context: &JavaType, descriptor: &str, _mode: LoadMode) -> JavaType {
        match MethodDescriptor::<String>::parse(descriptor) {
            Ok(MethodDescriptor {
                return_type: Some(return_type),
                ..
            }) => {
                let rendered = crate::jvm::RenderDescriptor::render(&return_type);
                self.resolve_or_unloadable(return_type, &rendered)
            }
            Ok(_) => JavaType::Void,
            Err(_) => self.unloadable(descriptor),
        }
    }

    fn is_accessible_from(&self, ty: &JavaType, from: &JavaType) -> bool {
        match (ty, from) {
            (JavaType::Ref(RefType::Object(class)), JavaType::Ref(RefType::Object(from))) => {
                class.access_flags.contains(ClassAccessFlags::PUBLIC)
                    || class.package() == from.package()
            }
            (JavaType::Ref(RefType::ObjectArray(arr)), from) => {
                self.is_accessible_from(&JavaType::class(&arr.element_type), from)
            }
            _ => true,
        }
    }
}

pub struct ClassData {
    /// Binary name of the class, with `.` separators
    pub name: String,

    /// Superclass is only ever missing for `java.lang.Object` itself
    pub superclass: Option<ClassRef>,

    /// Interfaces implemented (or super-interfaces)
    pub interfaces: Vec<ClassRef>,

    pub access_flags: ClassAccessFlags,

    pub methods: Vec<Arc<MethodData>>,

    pub fields: Vec<Arc<FieldData>>,
}

impl ClassData {
    pub fn new(
        name: impl Into<String>,
        superclass: Option<ClassRef>,
        access_flags: ClassAccessFlags,
    ) -> ClassData {
        ClassData {
            name: name.into(),
            superclass,
            interfaces: vec![],
            access_flags,
            methods: vec![],
            fields: vec![],
        }
    }

    pub fn with_interface(mut self, interface: ClassRef) -> ClassData {
        self.interfaces.push(interface);
        self
    }

    pub fn with_field(
        mut self,
        name: &str,
        descriptor: &str,
        access_flags: FieldAccessFlags,
    ) -> ClassData {
        self.fields.push(Arc::new(FieldData {
            class: self.name.clone(),
            name: name.to_owned(),
            descriptor: descriptor.to_owned(),
            access_flags,
        }));
        self
    }

    pub fn with_method(
        mut self,
        name: &str,
        descriptor: &str,
        access_flags: MethodAccessFlags,
    ) -> ClassData {
        self.methods.push(Arc::new(MethodData {
            class: self.name.clone(),
            name: name.to_owned(),
            descriptor: descriptor.to_owned(),
            access_flags,
        }));
        self
    }

    pub fn is_interface(&self) -> bool {
        self.access_flags.contains(ClassAccessFlags::INTERFACE)
    }

    /// Package prefix of the binary name (empty for the default package)
    pub fn package(&self) -> &str {
        self.name.rfind('.').map_or("", |idx| &self.name[..idx])
    }

    pub fn declared_method(&self, name: &str, descriptor: &str) -> Option<Arc<MethodData>> {
        self.methods
            .iter()
            .find(|m| m.name == name && m.descriptor == descriptor)
            .cloned()
    }

    /// Field lookup as in [JVMS 5.4.3.2][0]: the class, then its superinterfaces, then its
    /// superclass
    ///
    /// [0]: https://docs.oracle.com/javase/specs/jvms/se8/html/jvms-5.html#jvms-5.4.3.2
    pub fn find_field(&self, name: &str, descriptor: &str) -> Option<Arc<FieldData>> {
        if let Some(field) = self
            .fields
            .iter()
            .find(|f| f.name == name && f.descriptor == descriptor)
        {
            return Some(field.clone());
        }
        self.interfaces
            .iter()
            .find_map(|interface| interface.find_field(name, descriptor))
            .or_else(|| self.superclass.as_ref()?.find_field(name, descriptor))
    }
}

impl PartialEq for ClassData {
    fn eq(&self, other: &ClassData) -> bool {
        self.name == other.name
    }
}

impl Eq for ClassData {}

impl Debug for ClassData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(PartialEq, Eq)]
pub struct MethodData {
    /// Name of the declaring class
    pub class: String,

    pub name: String,

    pub descriptor: String,

    pub access_flags: MethodAccessFlags,
}

impl Debug for MethodData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}:{}", self.class, self.name, self.descriptor)
    }
}

#[derive(PartialEq, Eq)]
pub struct FieldData {
    /// Name of the declaring class
    pub class: String,

    pub name: String,

    pub descriptor: String,

    pub access_flags: FieldAccessFlags,
}

impl Debug for FieldData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}:{}", self.class, self.name, self.descriptor)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn point(class_graph: &ClassGraph) -> JavaType {
        let java = class_graph.java_lang();
        let base = class_graph.add_class(
            ClassData::new("me.alec.Base", Some(java.object), ClassAccessFlags::PUBLIC)
                .with_field("x", "I", FieldAccessFlags::PROTECTED)
                .with_method("run", "()V", MethodAccessFlags::PUBLIC),
        );
        JavaType::class(&class_graph.add_class(ClassData::new(
            "me.alec.Point",
            Some(base),
            ClassAccessFlags::empty(),
        )))
    }

    #[test]
    fn member_lookup() {
        let class_graph = ClassGraph::with_java_lang();
        let point = point(&class_graph);

        let field = class_graph.find_field(&point, "x", "I").unwrap();
        assert_eq!(field.class, "me.alec.Base");
        assert!(class_graph.find_field(&point, "x", "J").is_none());

        assert!(class_graph.find_method(&point, "run", "()V", true).is_some());
        assert!(class_graph.find_method(&point, "run", "()V", false).is_none());
        let hash_code = class_graph.find_method(&point, "hashCode", "()I", true).unwrap();
        assert_eq!(hash_code.class, well_known::OBJECT);

        let char_sequence = JavaType::class(&class_graph.java_lang().char_sequence);
        assert!(class_graph
            .find_interface_method(&char_sequence, "length", "()I")
            .is_some());
    }

    #[test]
    fn descriptor_types() {
        let class_graph = ClassGraph::with_java_lang();
        let point = point(&class_graph);
        let string = JavaType::class(&class_graph.java_lang().string);

        assert_eq!(
            class_graph.field_type(&point, "Ljava.lang.String;", LoadMode::Link),
            string
        );
        assert_eq!(
            class_graph.argument_types(&point, "(IJLme.alec.Point;)V", LoadMode::Link),
            vec![JavaType::Base(BaseType::Int), JavaType::Base(BaseType::Long), point.clone()]
        );
        assert_eq!(
            class_graph.return_type(&point, "()V", LoadMode::Link),
            JavaType::Void
        );
        assert!(class_graph.is_unloadable(&class_graph.field_type(
            &point,
            "Lme.alec.Missing;",
            LoadMode::Link
        )));
        assert_eq!(
            class_graph.load_class(&point, "me.alec.Missing", LoadMode::Link),
            Err(String::from("Class not found: me.alec.Missing"))
        );
    }

    #[test]
    fn accessibility() {
        let class_graph = ClassGraph::with_java_lang();
        let point = point(&class_graph);
        let other = JavaType::class(&class_graph.add_class(ClassData::new(
            "me.other.Other",
            class_graph.lookup_class(well_known::OBJECT),
            ClassAccessFlags::PUBLIC,
        )));
        let sibling = JavaType::class(&class_graph.add_class(ClassData::new(
            "me.alec.Sibling",
            class_graph.lookup_class(well_known::OBJECT),
            ClassAccessFlags::PUBLIC,
        )));

        assert!(!class_graph.is_accessible_from(&point, &other));
        assert!(class_graph.is_accessible_from(&point, &sibling));
        assert!(class_graph.is_subtype_of(&point, &class_graph.object_type()));
        assert!(!class_graph.is_subtype_of(&other, &point));
    }
}
