//! Constant pool of a class model
//!
//! The pool goes through three phases, each a distinct type:
//!
//!   1. [`UnresolvedPool::build`] sorts the raw constants into UTF-8 text and pending items
//!   2. [`UnresolvedPool::patch`] optionally overlays host supplied values
//!   3. [`UnresolvedPool::resolve`] validates every item and produces a [`ConstantPool`]
//!
//! The resolved pool is immutable except for the link caches inside its items, which get filled
//! in by [`ConstantPool::link`] (possibly from several threads at once).
//!
//! Pool items never point at each other directly. Everything goes through slot indices, which is
//! what lets a class refer to itself (see [`ConstantPool::link_self`]).

mod item;
mod patch;

pub use item::*;
pub use patch::*;

use super::annotations::AnnotationConstants;
use super::class_file::{
    ClassConstantIndex, ConstantIndex, HandleKind, NameAndTypeConstantIndex, RawConstant,
    Utf8ConstantIndex,
};
use super::class_graph::TypeSystem;
use super::{
    is_valid_class_name, is_valid_field_descriptor, is_valid_field_name,
    is_valid_method_descriptor, is_valid_method_name, to_dotted, Diagnostics, Error, LoadMode,
    ParseOptions, Version, INIT,
};
use crate::util::{Interned, Interner};
use std::fmt::{Debug, Error as FmtError, Formatter};
use std::sync::Arc;

/// Pool that has been built (and maybe patched) but not yet validated
pub struct UnresolvedPool<T: TypeSystem> {
    utf8: Vec<Option<String>>,
    items: Vec<Option<PendingItem<T>>>,
}

enum PendingItem<T: TypeSystem> {
    Raw(RawConstant),
    Class {
        name: Utf8ConstantIndex,

        /// Name supplied by a patch (already dotted)
        renamed: Option<String>,

        /// Type supplied by a patch
        ty: Option<T::Type>,
    },
    LiveObject(LiveObject),
}

impl<T: TypeSystem> PendingItem<T> {
    fn kind(&self) -> &'static str {
        match self {
            PendingItem::Raw(RawConstant::Utf8(_)) => "Utf8",
            PendingItem::Raw(RawConstant::Integer(_)) => "Integer",
            PendingItem::Raw(RawConstant::Float(_)) => "Float",
            PendingItem::Raw(RawConstant::Long(_)) => "Long",
            PendingItem::Raw(RawConstant::Double(_)) => "Double",
            PendingItem::Raw(RawConstant::Class { .. }) | PendingItem::Class { .. } => "Class",
            PendingItem::Raw(RawConstant::String { .. }) => "String",
            PendingItem::Raw(RawConstant::FieldRef { .. }) => "Fieldref",
            PendingItem::Raw(RawConstant::MethodRef { .. }) => "Methodref",
            PendingItem::Raw(RawConstant::InterfaceMethodRef { .. }) => "InterfaceMethodref",
            PendingItem::Raw(RawConstant::NameAndType { .. }) => "NameAndType",
            PendingItem::Raw(RawConstant::MethodHandle { .. }) => "MethodHandle",
            PendingItem::Raw(RawConstant::MethodType { .. }) => "MethodType",
            PendingItem::Raw(RawConstant::InvokeDynamic { .. }) => "InvokeDynamic",
            PendingItem::Raw(RawConstant::Unsupported(_)) => "Unsupported",
            PendingItem::LiveObject(_) => "LiveObject",
        }
    }

    /// Items at a given level only refer to items at strictly lower levels
    fn level(&self) -> usize {
        match self {
            PendingItem::Raw(RawConstant::FieldRef { .. })
            | PendingItem::Raw(RawConstant::MethodRef { .. })
            | PendingItem::Raw(RawConstant::InterfaceMethodRef { .. })
            | PendingItem::Raw(RawConstant::InvokeDynamic { .. }) => 1,
            PendingItem::Raw(RawConstant::MethodHandle { .. }) => 2,
            _ => 0,
        }
    }
}

enum Replacement<T: TypeSystem> {
    Utf8(String),
    Item(PendingItem<T>),
}

const RESOLUTION_LEVELS: usize = 3;

impl<T: TypeSystem> UnresolvedPool<T> {
    /// Sort raw constants into UTF-8 text and items awaiting resolution
    ///
    /// Slot 0 must be empty, as must the padding slot after a long or double.
    pub fn build(constants: &[Option<RawConstant>]) -> Result<UnresolvedPool<T>, Error> {
        if constants.len() > u16::MAX as usize {
            return Err(Error::format("Constant pool is too large"));
        }
        if matches!(constants.first(), Some(Some(_))) {
            return Err(Error::format("Invalid constant pool item #0"));
        }

        let mut utf8 = vec![None; constants.len()];
        let mut items = Vec::with_capacity(constants.len());
        for (index, constant) in constants.iter().enumerate() {
            let item = match constant {
                None => None,
                Some(RawConstant::Utf8(text)) => {
                    utf8[index] = Some(text.clone());
                    None
                }
                Some(RawConstant::Class { name }) => Some(PendingItem::Class {
                    name: *name,
                    renamed: None,
                    ty: None,
                }),
                Some(RawConstant::Unsupported(tag)) => {
                    return Err(Error::format(format!(
                        "Illegal constant pool type 0x{:X}",
                        tag
                    )))
                }
                Some(other) => Some(PendingItem::Raw(other.clone())),
            };
            items.push(item);
        }
        log::trace!("Built constant pool with {} slots", constants.len());

        Ok(UnresolvedPool { utf8, items })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Overlay patches onto the pool
    ///
    /// `patches[i]` applies to slot `i`. Either every patch applies, or (on error) the pool is
    /// left exactly as it was.
    pub fn patch(&mut self, input_name: &str, patches: &[Option<Patch<T>>]) -> Result<(), Error> {
        if patches.len() > self.len() {
            return Err(Error::format_in(
                input_name,
                format!(
                    "{} constant pool patches for a pool of size {}",
                    patches.len(),
                    self.len()
                ),
            ));
        }

        let mut replacements = vec![];
        for (index, patch) in patches.iter().enumerate() {
            if let Some(patch) = patch {
                let replacement = self
                    .replacement(index, patch)
                    .map_err(|err| err.in_class(input_name))?;
                replacements.push((index, replacement));
            }
        }

        log::trace!("Applying {} constant pool patches to {}", replacements.len(), input_name);
        for (index, replacement) in replacements {
            match replacement {
                Replacement::Utf8(text) => self.utf8[index] = Some(text),
                Replacement::Item(item) => self.items[index] = Some(item),
            }
        }
        Ok(())
    }

    fn replacement(&self, index: usize, patch: &Patch<T>) -> Result<Replacement<T>, Error> {
        if self.utf8[index].is_some() {
            return match patch {
                Patch::Text(text) => Ok(Replacement::Utf8(text.clone())),
                _ => Err(illegal_patch(index, "Utf8", patch)),
            };
        }

        let existing = match &self.items[index] {
            Some(existing) => existing,
            None => {
                return Err(Error::NotImplemented(format!(
                    "Constant pool patch for empty slot #{}",
                    index
                )))
            }
        };
        let item = match (existing, patch) {
            (PendingItem::Class { name, .. }, Patch::Text(text)) => PendingItem::Class {
                name: *name,
                renamed: Some(to_dotted(text)),
                ty: None,
            },
            (PendingItem::Class { name, renamed, .. }, Patch::Type(ty)) => PendingItem::Class {
                name: *name,
                renamed: renamed.clone(),
                ty: Some(ty.clone()),
            },
            (PendingItem::Raw(RawConstant::Integer(_)), Patch::Integer(value)) => {
                PendingItem::Raw(RawConstant::Integer(*value))
            }
            (PendingItem::Raw(RawConstant::Long(_)), Patch::Long(value)) => {
                PendingItem::Raw(RawConstant::Long(*value))
            }
            (PendingItem::Raw(RawConstant::Float(_)), Patch::Float(value)) => {
                PendingItem::Raw(RawConstant::Float(*value))
            }
            (PendingItem::Raw(RawConstant::Double(_)), Patch::Double(value)) => {
                PendingItem::Raw(RawConstant::Double(*value))
            }
            (PendingItem::Raw(RawConstant::String { .. }), Patch::Object(object)) => {
                PendingItem::LiveObject(object.clone())
            }
            (PendingItem::Raw(RawConstant::String { .. }), Patch::Text(text)) => {
                PendingItem::LiveObject(Arc::new(text.clone()))
            }
            (
                PendingItem::Class { .. }
                | PendingItem::Raw(
                    RawConstant::Integer(_)
                    | RawConstant::Long(_)
                    | RawConstant::Float(_)
                    | RawConstant::Double(_)
                    | RawConstant::String { .. },
                ),
                _,
            ) => return Err(illegal_patch(index, existing.kind(), patch)),
            (other, _) => {
                return Err(Error::NotImplemented(format!(
                    "Constant pool patch for {} at #{}",
                    other.kind(),
                    index
                )))
            }
        };
        Ok(Replacement::Item(item))
    }

    /// Validate every item, producing the final pool
    ///
    /// Items are resolved in dependency order (classes and name-and-types before the member
    /// references using them, member references before the method handles using those). Any
    /// failure is reported against the class being loaded.
    pub fn resolve(
        self,
        input_name: &str,
        version: Version,
        options: ParseOptions,
        interner: &mut Interner,
    ) -> Result<ConstantPool<T>, Error> {
        let utf8: Vec<Option<Interned>> = self
            .utf8
            .iter()
            .map(|text| text.as_deref().map(|text| interner.intern(text)))
            .collect();
        let mut pending = self.items;
        let mut items: Vec<Option<ConstantItem<T>>> = pending.iter().map(|_| None).collect();

        for level in 0..RESOLUTION_LEVELS {
            for slot in 1..pending.len() {
                if !matches!(&pending[slot], Some(item) if item.level() == level) {
                    continue;
                }
                if let Some(item) = pending[slot].take() {
                    let resolver = Resolver {
                        utf8: &utf8,
                        items: &items,
                        version,
                        options,
                        slot,
                    };
                    let resolved = resolver
                        .resolve(item, interner)
                        .map_err(|err| err.in_class(input_name))?;
                    items[slot] = Some(resolved);
                }
            }
        }
        log::trace!("Resolved constant pool of {}", input_name);

        Ok(ConstantPool { utf8, items })
    }
}

fn illegal_patch<T: TypeSystem>(index: usize, kind: &str, patch: &Patch<T>) -> Error {
    Error::format(format!(
        "Illegal constant pool patch at #{}: {:?} does not fit a {} constant",
        index, patch, kind
    ))
}

/// Context for resolving the item in one slot
struct Resolver<'a, T: TypeSystem> {
    utf8: &'a [Option<Interned>],
    items: &'a [Option<ConstantItem<T>>],
    version: Version,
    options: ParseOptions,
    slot: usize,
}

impl<'a, T: TypeSystem> Resolver<'a, T> {
    fn invalid(&self) -> Error {
        Error::format(format!("Invalid constant pool item #{}", self.slot))
    }

    fn utf8(&self, index: Utf8ConstantIndex) -> Result<&'a Interned, Error> {
        let index = (index.0).0 as usize;
        self.utf8
            .get(index)
            .and_then(Option::as_ref)
            .ok_or_else(|| Error::format(format!("Bad constant pool index #{}", index)))
    }

    fn item(&self, index: ConstantIndex) -> Result<&'a ConstantItem<T>, Error> {
        self.items
            .get(index.0 as usize)
            .and_then(Option::as_ref)
            .ok_or_else(|| self.invalid())
    }

    fn name_and_type(
        &self,
        index: NameAndTypeConstantIndex,
    ) -> Result<(&'a Interned, &'a Interned), Error> {
        match self.item(index.0)? {
            ConstantItem::NameAndType { name, descriptor } => {
                Ok((self.utf8(*name)?, self.utf8(*descriptor)?))
            }
            _ => Err(self.invalid()),
        }
    }

    /// Class name plus raw (not yet dotted) name and descriptor of a member reference
    fn member_parts(
        &self,
        class: ClassConstantIndex,
        name_and_type: NameAndTypeConstantIndex,
    ) -> Result<(&'a Interned, &'a Interned, &'a Interned), Error> {
        let class_name = match self.item(class.0)? {
            ConstantItem::Class(class) => &class.name,
            _ => return Err(self.invalid()),
        };
        let (name, descriptor) = self.name_and_type(name_and_type)?;
        Ok((class_name, name, descriptor))
    }

    fn validate_method(&self, name: &str, descriptor: &str) -> Result<(), Error> {
        if !is_valid_method_descriptor(descriptor) {
            return Err(Error::format(format!(
                "Method {} has invalid signature {}",
                name, descriptor
            )));
        }
        if !is_valid_method_name(name, self.version) {
            if name != INIT {
                return Err(Error::format(format!("Invalid method name \"{}\"", name)));
            }
            if !descriptor.ends_with('V') {
                return Err(Error::format(format!(
                    "Method {} has invalid signature {}",
                    name, descriptor
                )));
            }
        }
        Ok(())
    }

    fn method_ref(
        &self,
        class: ClassConstantIndex,
        name_and_type: NameAndTypeConstantIndex,
        interner: &mut Interner,
    ) -> Result<MemberRef, Error> {
        let (class_name, name, descriptor) = self.member_parts(class, name_and_type)?;
        self.validate_method(name, descriptor)?;
        Ok(MemberRef {
            class,
            class_name: class_name.clone(),
            name: name.clone(),
            descriptor: interner.intern_dotted(descriptor),
        })
    }

    fn resolve(&self, item: PendingItem<T>, interner: &mut Interner) -> Result<ConstantItem<T>, Error> {
        let raw = match item {
            PendingItem::LiveObject(object) => return Ok(ConstantItem::LiveObject(object)),
            PendingItem::Class {
                renamed: Some(renamed),
                ty,
                ..
            } => {
                let name = interner.intern(&renamed);
                return Ok(ConstantItem::Class(ClassItem::new(name, ty)));
            }
            PendingItem::Class {
                name,
                renamed: None,
                ty,
            } => {
                let name = self.utf8(name)?;
                if !is_valid_class_name(name, self.version, self.options) {
                    return Err(Error::format(format!("Invalid class name \"{}\"", name)));
                }
                let name = interner.intern_dotted(name);
                return Ok(ConstantItem::Class(ClassItem::new(name, ty)));
            }
            PendingItem::Raw(raw) => raw,
        };

        let item = match raw {
            RawConstant::Integer(value) => ConstantItem::Integer(value),
            RawConstant::Long(value) => ConstantItem::Long(value),
            RawConstant::Float(value) => ConstantItem::Float(value),
            RawConstant::Double(value) => ConstantItem::Double(value),
            RawConstant::String { value } => ConstantItem::String(self.utf8(value)?.clone()),
            RawConstant::NameAndType { name, descriptor } => {
                self.utf8(name)?;
                self.utf8(descriptor)?;
                ConstantItem::NameAndType { name, descriptor }
            }
            RawConstant::MethodType { descriptor } => {
                let descriptor = self.utf8(descriptor)?;
                if !is_valid_method_descriptor(descriptor) {
                    return Err(Error::format("Invalid MethodType signature"));
                }
                ConstantItem::MethodType(MethodTypeItem::new(interner.intern_dotted(descriptor)))
            }
            RawConstant::FieldRef {
                class,
                name_and_type,
            } => {
                let (class_name, name, descriptor) = self.member_parts(class, name_and_type)?;
                if !is_valid_field_descriptor(descriptor) {
                    return Err(Error::format(format!(
                        "Invalid field signature \"{}\"",
                        descriptor
                    )));
                }
                if !is_valid_field_name(name, self.version) {
                    return Err(Error::format(format!("Invalid field name \"{}\"", name)));
                }
                ConstantItem::Fieldref(FieldrefItem::new(MemberRef {
                    class,
                    class_name: class_name.clone(),
                    name: name.clone(),
                    descriptor: interner.intern_dotted(descriptor),
                }))
            }
            RawConstant::MethodRef {
                class,
                name_and_type,
            } => ConstantItem::Methodref(MethodrefItem::new(self.method_ref(
                class,
                name_and_type,
                interner,
            )?)),
            RawConstant::InterfaceMethodRef {
                class,
                name_and_type,
            } => ConstantItem::InterfaceMethodref(MethodrefItem::new(self.method_ref(
                class,
                name_and_type,
                interner,
            )?)),
            RawConstant::InvokeDynamic {
                bootstrap_method,
                name_and_type,
            } => {
                let (name, descriptor) = self.name_and_type(name_and_type)?;
                self.validate_method(name, descriptor)?;
                ConstantItem::InvokeDynamic(InvokeDynamicItem::new(
                    bootstrap_method,
                    name.clone(),
                    interner.intern_dotted(descriptor),
                ))
            }
            RawConstant::MethodHandle {
                reference_kind,
                reference,
            } => {
                let kind = HandleKind::from_u8(reference_kind)
                    .ok_or_else(|| Error::format("Invalid constant pool item MethodHandle"))?;
                self.validate_method_handle(kind, reference)?;
                ConstantItem::MethodHandle(MethodHandleItem { kind, reference })
            }
            RawConstant::Utf8(_) | RawConstant::Class { .. } | RawConstant::Unsupported(_) => {
                return Err(self.invalid())
            }
        };
        Ok(item)
    }

    /// Check the kind of reference and the name of the member a method handle points to
    fn validate_method_handle(&self, kind: HandleKind, reference: ConstantIndex) -> Result<(), Error> {
        let item = self.item(reference)?;
        let fits = match (kind, item) {
            (_, ConstantItem::Fieldref(_)) => kind.is_field(),
            (HandleKind::InvokeInterface, ConstantItem::InterfaceMethodref(_)) => true,
            (HandleKind::InvokeStatic | HandleKind::InvokeSpecial, ConstantItem::InterfaceMethodref(_)) => {
                self.version.has_java8_features()
            }
            (
                HandleKind::InvokeVirtual
                | HandleKind::InvokeStatic
                | HandleKind::InvokeSpecial
                | HandleKind::NewInvokeSpecial,
                ConstantItem::Methodref(_),
            ) => true,
            _ => false,
        };
        let member = match item.member_ref() {
            Some(member) if fits => member,
            _ => return Err(Error::format("Invalid constant pool item MethodHandle")),
        };

        let bad_name = if kind == HandleKind::NewInvokeSpecial {
            *member.name != *INIT
        } else {
            !kind.is_field() && member.name.starts_with('<')
        };
        if bad_name {
            return Err(Error::format("Bad method name"));
        }
        Ok(())
    }
}

/// Resolved constant pool
///
/// Lookups are by slot index. UTF-8 text is kept apart from the other items, since most of it is
/// only ever used while building the class model.
pub struct ConstantPool<T: TypeSystem> {
    utf8: Vec<Option<Interned>>,
    items: Vec<Option<ConstantItem<T>>>,
}

impl<T: TypeSystem> ConstantPool<T> {
    /// Number of slots (including the unusable slot 0)
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn get(&self, index: impl Into<ConstantIndex>) -> Option<&ConstantItem<T>> {
        self.items.get(index.into().0 as usize)?.as_ref()
    }

    /// Occupied slots, in order
    pub fn iter(&self) -> impl Iterator<Item = (ConstantIndex, &ConstantItem<T>)> {
        self.items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| Some((ConstantIndex(index as u16), item.as_ref()?)))
    }

    pub fn get_utf8(&self, index: impl Into<ConstantIndex>) -> Option<&Interned> {
        self.utf8.get(index.into().0 as usize)?.as_ref()
    }

    /// UTF-8 text at a slot, failing if there isn't any
    pub fn utf8(&self, index: impl Into<ConstantIndex>) -> Result<&Interned, Error> {
        let index = index.into();
        self.get_utf8(index)
            .ok_or_else(|| Error::format(format!("Bad constant pool index #{}", index.0)))
    }

    /// Class item at a slot, failing if there isn't one
    pub fn class(&self, index: impl Into<ConstantIndex>) -> Result<&ClassItem<T>, Error> {
        let index = index.into();
        match self.get(index) {
            Some(ConstantItem::Class(class)) => Ok(class),
            _ => Err(Error::format(format!("Bad constant pool index #{}", index.0))),
        }
    }

    pub fn is_class(&self, index: impl Into<ConstantIndex>) -> bool {
        matches!(self.get(index), Some(ConstantItem::Class(_)))
    }

    pub fn fieldref(&self, index: impl Into<ConstantIndex>) -> Option<&FieldrefItem<T>> {
        match self.get(index)? {
            ConstantItem::Fieldref(item) => Some(item),
            _ => None,
        }
    }

    pub fn methodref(&self, index: impl Into<ConstantIndex>) -> Option<&MethodrefItem<T>> {
        match self.get(index)? {
            ConstantItem::Methodref(item) => Some(item),
            _ => None,
        }
    }

    /// Is there a constant that could be loaded with `ldc` at this index?
    pub fn is_loadable(&self, index: impl Into<ConstantIndex>) -> bool {
        self.get(index).map_or(false, ConstantItem::is_loadable)
    }

    /// Make explicit [`ConstantItem::Utf8`] items for all UTF-8 text
    ///
    /// Needed when something addresses UTF-8 entries as ordinary constants (type annotations).
    pub fn create_utf8_items(&mut self) {
        for (text, item) in self.utf8.iter().zip(self.items.iter_mut()) {
            if let (Some(text), None) = (text, &item) {
                *item = Some(ConstantItem::Utf8(text.clone()));
            }
        }
    }

    /// Flag the class an item depends on as needing to be loaded during link
    ///
    /// Indices that are out of range or that do not name a class dependent item are ignored.
    pub fn mark_link_required(&mut self, index: impl Into<ConstantIndex>) {
        let index = index.into();
        let next = match self.items.get_mut(index.0 as usize) {
            Some(Some(ConstantItem::Class(class))) => {
                class.link_required = true;
                return;
            }
            Some(Some(ConstantItem::Fieldref(FieldrefItem { member, .. })))
            | Some(Some(ConstantItem::Methodref(MethodrefItem { member, .. })))
            | Some(Some(ConstantItem::InterfaceMethodref(MethodrefItem { member, .. }))) => {
                member.class.0
            }
            Some(Some(ConstantItem::MethodHandle(handle))) => handle.reference,
            _ => return,
        };
        self.mark_link_required(next);
    }

    /// Bind the class constant for the class itself
    ///
    /// Has to happen before anything else is linked, so that a class that isn't yet known to the
    /// host (eg. an anonymous class) can still refer to itself.
    pub fn link_self(&self, this_class: ClassConstantIndex, this_type: &T::Type) {
        if let Some(ConstantItem::Class(class)) = self.get(this_class) {
            class.link_self(this_type);
        }
    }

    /// Link every item in the pool against the host
    ///
    /// Safe to call concurrently: every binding is committed at most once and all callers see
    /// the same committed values.
    pub fn link(
        &self,
        host: &T,
        this_class: ClassConstantIndex,
        this_type: &T::Type,
        mode: LoadMode,
        diagnostics: &dyn Diagnostics,
    ) {
        log::trace!("Linking constant pool of {:?}", this_type);
        self.link_self(this_class, this_type);
        for index in 1..self.items.len() {
            self.link_item(ConstantIndex(index as u16), host, this_type, mode, diagnostics);
        }
    }

    fn link_class(
        &self,
        index: ClassConstantIndex,
        host: &T,
        this_type: &T::Type,
        mode: LoadMode,
        diagnostics: &dyn Diagnostics,
    ) -> Option<T::Type> {
        match self.get(index)? {
            ConstantItem::Class(class) => class.link(host, this_type, mode, diagnostics),
            _ => None,
        }
    }

    fn link_item(
        &self,
        index: ConstantIndex,
        host: &T,
        this_type: &T::Type,
        mode: LoadMode,
        diagnostics: &dyn Diagnostics,
    ) {
        let item = match self.get(index) {
            Some(item) => item,
            None => return,
        };
        match item {
            ConstantItem::Class(class) => {
                class.link(host, this_type, mode, diagnostics);
            }
            ConstantItem::Fieldref(field) => {
                let class_type =
                    self.link_class(field.member.class, host, this_type, mode, diagnostics);
                field.link(host, this_type, class_type, mode);
            }
            ConstantItem::Methodref(method) => {
                let class_type =
                    self.link_class(method.member.class, host, this_type, mode, diagnostics);
                method.link_class_method(host, this_type, class_type, mode);
            }
            ConstantItem::InterfaceMethodref(method) => {
                let class_type =
                    self.link_class(method.member.class, host, this_type, mode, diagnostics);
                method.link_interface_method(host, this_type, class_type, mode);
            }
            ConstantItem::MethodHandle(handle) => {
                self.link_item(handle.reference, host, this_type, mode, diagnostics);
            }
            ConstantItem::MethodType(method_type) => method_type.link(host, this_type, mode),
            ConstantItem::InvokeDynamic(call_site) => call_site.link(host, this_type, mode),
            ConstantItem::Utf8(_)
            | ConstantItem::Integer(_)
            | ConstantItem::Long(_)
            | ConstantItem::Float(_)
            | ConstantItem::Double(_)
            | ConstantItem::String(_)
            | ConstantItem::NameAndType { .. }
            | ConstantItem::LiveObject(_) => (),
        }
    }
}

impl<T: TypeSystem> AnnotationConstants for ConstantPool<T> {
    fn utf8_at(&self, index: ConstantIndex) -> Option<&str> {
        self.get_utf8(index).map(Interned::as_str)
    }

    fn int_at(&self, index: ConstantIndex) -> Option<i32> {
        match self.get(index)? {
            ConstantItem::Integer(value) => Some(*value),
            _ => None,
        }
    }

    fn long_at(&self, index: ConstantIndex) -> Option<i64> {
        match self.get(index)? {
            ConstantItem::Long(value) => Some(*value),
            _ => None,
        }
    }

    fn float_at(&self, index: ConstantIndex) -> Option<f32> {
        match self.get(index)? {
            ConstantItem::Float(value) => Some(*value),
            _ => None,
        }
    }

    fn double_at(&self, index: ConstantIndex) -> Option<f64> {
        match self.get(index)? {
            ConstantItem::Double(value) => Some(*value),
            _ => None,
        }
    }
}

impl<T: TypeSystem> Debug for ConstantPool<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        f.debug_map().entries(self.iter().map(|(index, item)| (index.0, item))).finish()
    }
}
