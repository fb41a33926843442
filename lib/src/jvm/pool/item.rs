use crate::jvm::class_file::{ClassConstantIndex, ConstantIndex, HandleKind, Utf8ConstantIndex};
use crate::jvm::class_graph::TypeSystem;
use crate::jvm::{Diagnostics, LoadMode, Warning};
use crate::util::{Interned, LinkCell};
use std::any::Any;
use std::fmt::{Debug, Error as FmtError, Formatter};
use std::sync::Arc;

/// Opaque host value injected into the pool by a patch
pub type LiveObject = Arc<dyn Any + Send + Sync>;

/// Resolved constant pool entry
///
/// Everything here is immutable once the pool is resolved, except for the link caches (which
/// are [`LinkCell`]s and so are set at most once).
pub enum ConstantItem<T: TypeSystem> {
    Class(ClassItem<T>),

    /// Only materialized on demand (see [`super::ConstantPool::create_utf8_items`])
    Utf8(Interned),

    Integer(i32),
    Long(i64),
    Float(f32),
    Double(f64),

    /// Constant `java.lang.String`
    String(Interned),

    NameAndType {
        name: Utf8ConstantIndex,
        descriptor: Utf8ConstantIndex,
    },

    Fieldref(FieldrefItem<T>),
    Methodref(MethodrefItem<T>),
    InterfaceMethodref(MethodrefItem<T>),
    MethodHandle(MethodHandleItem),
    MethodType(MethodTypeItem<T>),
    InvokeDynamic(InvokeDynamicItem<T>),

    /// Host value that replaced a string constant
    LiveObject(LiveObject),
}

impl<T: TypeSystem> ConstantItem<T> {
    /// Can this constant be pushed by `ldc` or passed as a static bootstrap argument?
    pub fn is_loadable(&self) -> bool {
        matches!(
            self,
            ConstantItem::Class(_)
                | ConstantItem::Integer(_)
                | ConstantItem::Long(_)
                | ConstantItem::Float(_)
                | ConstantItem::Double(_)
                | ConstantItem::String(_)
                | ConstantItem::MethodHandle(_)
                | ConstantItem::MethodType(_)
                | ConstantItem::LiveObject(_)
        )
    }

    /// Shared field/method reference fields, if this is one
    pub fn member_ref(&self) -> Option<&MemberRef> {
        match self {
            ConstantItem::Fieldref(item) => Some(&item.member),
            ConstantItem::Methodref(item) | ConstantItem::InterfaceMethodref(item) => {
                Some(&item.member)
            }
            _ => None,
        }
    }
}

impl<T: TypeSystem> Debug for ConstantItem<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        match self {
            ConstantItem::Class(class) => write!(f, "Class({})", class.name),
            ConstantItem::Utf8(text) => write!(f, "Utf8({:?})", text),
            ConstantItem::Integer(value) => write!(f, "Integer({})", value),
            ConstantItem::Long(value) => write!(f, "Long({})", value),
            ConstantItem::Float(value) => write!(f, "Float({})", value),
            ConstantItem::Double(value) => write!(f, "Double({})", value),
            ConstantItem::String(text) => write!(f, "String({:?})", text),
            ConstantItem::NameAndType { name, descriptor } => {
                write!(f, "NameAndType(#{}, #{})", (name.0).0, (descriptor.0).0)
            }
            ConstantItem::Fieldref(item) => write!(f, "Fieldref({:?})", item.member),
            ConstantItem::Methodref(item) => write!(f, "Methodref({:?})", item.member),
            ConstantItem::InterfaceMethodref(item) => {
                write!(f, "InterfaceMethodref({:?})", item.member)
            }
            ConstantItem::MethodHandle(item) => {
                write!(f, "MethodHandle({:?}, #{})", item.kind, item.reference.0)
            }
            ConstantItem::MethodType(item) => write!(f, "MethodType({})", item.descriptor),
            ConstantItem::InvokeDynamic(item) => write!(
                f,
                "InvokeDynamic(#{}, {}:{})",
                item.bootstrap_method, item.name, item.descriptor
            ),
            ConstantItem::LiveObject(_) => f.write_str("LiveObject"),
        }
    }
}

/// Class or interface constant
pub struct ClassItem<T: TypeSystem> {
    /// Binary name, with `.` separators (arrays keep their descriptor form)
    pub name: Interned,

    /// Only classes referenced from somewhere that needs them get loaded during link
    pub(super) link_required: bool,

    pub(super) ty: LinkCell<T::Type>,
}

impl<T: TypeSystem> ClassItem<T> {
    pub(super) fn new(name: Interned, ty: Option<T::Type>) -> ClassItem<T> {
        let cell = LinkCell::new();
        if let Some(ty) = ty {
            cell.commit(ty);
        }
        ClassItem {
            name,
            link_required: false,
            ty: cell,
        }
    }

    pub fn is_link_required(&self) -> bool {
        self.link_required
    }

    /// Host type, once linked
    pub fn class_type(&self) -> Option<T::Type> {
        self.ty.get()
    }

    /// Bind the class to a type without consulting the host
    pub(super) fn link_self(&self, this_type: &T::Type) -> T::Type {
        self.ty.commit(this_type.clone())
    }

    pub(super) fn link(
        &self,
        host: &T,
        this_type: &T::Type,
        mode: LoadMode,
        diagnostics: &dyn Diagnostics,
    ) -> Option<T::Type> {
        if !self.link_required {
            return self.ty.get();
        }
        Some(self.ty.get_or_link(|| {
            match host.load_class(this_type, &self.name, mode) {
                Ok(ty) => ty,
                Err(message) => {
                    diagnostics.warn(Warning::ClassLoadingError(message));
                    host.unloadable(&self.name)
                }
            }
        }))
    }
}

/// Fields shared by field, method and interface method references
#[derive(Debug)]
pub struct MemberRef {
    pub class: ClassConstantIndex,

    /// Name of the class constant at `class`
    pub class_name: Interned,

    pub name: Interned,

    /// Descriptor, with `.` separators
    pub descriptor: Interned,
}

/// Link-time resolution of a field reference
pub struct FieldBinding<T: TypeSystem> {
    /// Missing if the field could not be found
    pub field: Option<T::Field>,
    pub field_type: T::Type,
}

impl<T: TypeSystem> Clone for FieldBinding<T> {
    fn clone(&self) -> Self {
        FieldBinding {
            field: self.field.clone(),
            field_type: self.field_type.clone(),
        }
    }
}

pub struct FieldrefItem<T: TypeSystem> {
    pub member: MemberRef,
    pub(super) binding: LinkCell<FieldBinding<T>>,
}

impl<T: TypeSystem> Debug for FieldBinding<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        f.debug_struct("FieldBinding")
            .field("field", &self.field)
            .field("field_type", &self.field_type)
            .finish()
    }
}

impl<T: TypeSystem> FieldrefItem<T> {
    pub(super) fn new(member: MemberRef) -> FieldrefItem<T> {
        FieldrefItem {
            member,
            binding: LinkCell::new(),
        }
    }

    pub fn binding(&self) -> Option<FieldBinding<T>> {
        self.binding.get()
    }

    pub(super) fn link(&self, host: &T, this_type: &T::Type, class_type: Option<T::Type>, mode: LoadMode) {
        let class_type = match class_type {
            Some(class_type) => class_type,
            None => return,
        };
        self.binding.get_or_link(|| {
            let field = if host.is_unloadable(&class_type) {
                None
            } else {
                host.find_field(&class_type, &self.member.name, &self.member.descriptor)
            };
            let field_type = host.field_type(this_type, &self.member.descriptor, mode);
            FieldBinding { field, field_type }
        });
    }
}

/// Link-time resolution of a method reference
pub struct MethodBinding<T: TypeSystem> {
    pub method: Option<T::Method>,

    /// Method `invokespecial` actually dispatches to (differs for super calls)
    pub invokespecial: Option<T::Method>,
}

impl<T: TypeSystem> Clone for MethodBinding<T> {
    fn clone(&self) -> Self {
        MethodBinding {
            method: self.method.clone(),
            invokespecial: self.invokespecial.clone(),
        }
    }
}

impl<T: TypeSystem> Debug for MethodBinding<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        f.debug_struct("MethodBinding")
            .field("method", &self.method)
            .field("invokespecial", &self.invokespecial)
            .finish()
    }
}

/// Argument and return types of a method descriptor
pub struct Signature<T: TypeSystem> {
    pub arguments: Arc<[T::Type]>,
    pub return_type: T::Type,
}

impl<T: TypeSystem> Clone for Signature<T> {
    fn clone(&self) -> Self {
        Signature {
            arguments: self.arguments.clone(),
            return_type: self.return_type.clone(),
        }
    }
}

impl<T: TypeSystem> Debug for Signature<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        write!(f, "{:?} -> {:?}", &self.arguments[..], self.return_type)
    }
}

impl<T: TypeSystem> Signature<T> {
    fn derive(host: &T, this_type: &T::Type, descriptor: &str, mode: LoadMode) -> Signature<T> {
        Signature {
            arguments: host.argument_types(this_type, descriptor, mode).into(),
            return_type: host.return_type(this_type, descriptor, mode),
        }
    }
}

/// Method or interface method reference
pub struct MethodrefItem<T: TypeSystem> {
    pub member: MemberRef,
    pub(super) binding: LinkCell<MethodBinding<T>>,
    pub(super) signature: LinkCell<Signature<T>>,
}

impl<T: TypeSystem> MethodrefItem<T> {
    pub(super) fn new(member: MemberRef) -> MethodrefItem<T> {
        MethodrefItem {
            member,
            binding: LinkCell::new(),
            signature: LinkCell::new(),
        }
    }

    pub fn binding(&self) -> Option<MethodBinding<T>> {
        self.binding.get()
    }

    pub fn signature(&self) -> Option<Signature<T>> {
        self.signature.get()
    }

    fn link_signature(&self, host: &T, this_type: &T::Type, mode: LoadMode) {
        self.signature
            .get_or_link(|| Signature::derive(host, this_type, &self.member.descriptor, mode));
    }

    /// Link a reference to a method on a class
    pub(super) fn link_class_method(
        &self,
        host: &T,
        this_type: &T::Type,
        class_type: Option<T::Type>,
        mode: LoadMode,
    ) {
        let class_type = match class_type {
            Some(class_type) => class_type,
            None => return,
        };
        self.link_signature(host, this_type, mode);
        if host.is_unloadable(&class_type) {
            return;
        }
        self.binding.get_or_link(|| {
            let name: &str = &self.member.name;
            let descriptor: &str = &self.member.descriptor;
            let is_init = name == crate::jvm::INIT;
            let method = host.find_method(&class_type, name, descriptor, !is_init);

            // Super calls resolve against the superclass of the calling class
            let invokespecial = if !is_init
                && !host.is_interface(this_type)
                && *this_type != class_type
                && host.is_subtype_of(this_type, &class_type)
            {
                host.super_type(this_type)
                    .and_then(|super_type| host.find_method(&super_type, name, descriptor, true))
            } else {
                method.clone()
            };
            MethodBinding {
                method,
                invokespecial,
            }
        });
    }

    /// Link a reference to a method on an interface
    pub(super) fn link_interface_method(
        &self,
        host: &T,
        this_type: &T::Type,
        class_type: Option<T::Type>,
        mode: LoadMode,
    ) {
        let class_type = match class_type {
            Some(class_type) => class_type,
            None => return,
        };
        self.link_signature(host, this_type, mode);
        self.binding.get_or_link(|| {
            let name: &str = &self.member.name;
            let descriptor: &str = &self.member.descriptor;
            let method = if host.is_unloadable(&class_type) {
                None
            } else {
                host.find_interface_method(&class_type, name, descriptor)
            };

            // Interface method references may also refer to public methods on `Object`
            let method = method.or_else(|| {
                host.find_method(&host.object_type(), name, descriptor, false)
            });
            MethodBinding {
                method: method.clone(),
                invokespecial: method,
            }
        });
    }
}

/// Method handle constant
#[derive(Debug)]
pub struct MethodHandleItem {
    pub kind: HandleKind,

    /// Field, method, or interface method reference
    pub reference: ConstantIndex,
}

/// Method type constant
pub struct MethodTypeItem<T: TypeSystem> {
    /// Method descriptor, with `.` separators
    pub descriptor: Interned,
    pub(super) signature: LinkCell<Signature<T>>,
}

impl<T: TypeSystem> MethodTypeItem<T> {
    pub(super) fn new(descriptor: Interned) -> MethodTypeItem<T> {
        MethodTypeItem {
            descriptor,
            signature: LinkCell::new(),
        }
    }

    pub fn signature(&self) -> Option<Signature<T>> {
        self.signature.get()
    }

    pub(super) fn link(&self, host: &T, this_type: &T::Type, mode: LoadMode) {
        self.signature
            .get_or_link(|| Signature::derive(host, this_type, &self.descriptor, mode));
    }
}

/// Dynamically computed call site
pub struct InvokeDynamicItem<T: TypeSystem> {
    /// Index into the `BootstrapMethods` table of the class
    pub bootstrap_method: u16,
    pub name: Interned,

    /// Method descriptor, with `.` separators
    pub descriptor: Interned,
    pub(super) signature: LinkCell<Signature<T>>,
}

impl<T: TypeSystem> InvokeDynamicItem<T> {
    pub(super) fn new(bootstrap_method: u16, name: Interned, descriptor: Interned) -> InvokeDynamicItem<T> {
        InvokeDynamicItem {
            bootstrap_method,
            name,
            descriptor,
            signature: LinkCell::new(),
        }
    }

    pub fn signature(&self) -> Option<Signature<T>> {
        self.signature.get()
    }

    pub(super) fn link(&self, host: &T, this_type: &T::Type, mode: LoadMode) {
        self.signature
            .get_or_link(|| Signature::derive(host, this_type, &self.descriptor, mode));
    }
}
