use super::member::{has_duplicates, read_signature, DeclaringClass};
use super::{Field, FieldConstant, Method, MethodMarkers};
use crate::jvm::annotations::{markers, read_annotations, Annotation};
use crate::jvm::class_file::{AttributeKind, AttributeReader, ClassConstantIndex, ClassFile, ConstantIndex};
use crate::jvm::class_graph::TypeSystem;
use crate::jvm::code::{remove_assertion_init, Code};
use crate::jvm::pool::{ConstantItem, ConstantPool, Patch, UnresolvedPool};
use crate::jvm::{
    well_known, ClassAccessFlags, Diagnostics, Error, InnerClassAccessFlags, LoadMode,
    ParseOptions, Version,
};
use crate::util::{Interned, Interner};
use std::fmt::{Debug, Error as FmtError, Formatter};

/// Validated model of a class file
///
/// Construction resolves the constant pool and decodes every member and attribute the model knows
/// about. After that the only things that change are the internal visibility override and the
/// link caches inside the constant pool.
pub struct Class<T: TypeSystem> {
    version: Version,
    access_flags: ClassAccessFlags,
    this_class: ClassConstantIndex,
    name: Interned,
    super_class: Option<Interned>,
    interfaces: Vec<Interned>,
    pool: ConstantPool<T>,

    fields: Vec<Field>,
    methods: Vec<Method>,

    source_file: Option<Interned>,
    signature: Option<Interned>,
    enclosing_method: Option<EnclosingMethod>,
    inner_classes: Vec<InnerClass>,
    bootstrap_methods: Vec<BootstrapMethod>,
    annotations: Vec<Annotation>,
    type_annotations: Option<Vec<u8>>,
    ikvm_assembly: Option<Interned>,
    is_deprecated: bool,
    is_internal: bool,
}

/// Entry of the `InnerClasses` attribute
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InnerClass {
    pub inner_class: ClassConstantIndex,
    pub outer_class: Option<ClassConstantIndex>,

    /// Simple name (missing for anonymous classes)
    pub name: Option<Interned>,

    pub access_flags: InnerClassAccessFlags,
}

/// Contents of the `EnclosingMethod` attribute
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnclosingMethod {
    pub class: Interned,

    /// Name and (dotted) descriptor, missing when the class is not enclosed by a method
    pub method: Option<(Interned, Interned)>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BootstrapMethod {
    /// Index of a method handle constant
    pub method_handle: ConstantIndex,

    /// Indices of loadable constants
    pub arguments: Vec<ConstantIndex>,
}

impl<T: TypeSystem> Class<T> {
    /// Build the model of a class
    ///
    /// `input_name` is the name the class is expected to have. It is only used in error messages,
    /// since the real name is not known until the constant pool is resolved. Patches, if any,
    /// replace constant pool entries before resolution.
    pub fn new(
        class_file: &ClassFile,
        input_name: &str,
        options: ParseOptions,
        patches: Option<&[Option<Patch<T>>]>,
        diagnostics: &dyn Diagnostics,
    ) -> Result<Class<T>, Error> {
        let version = class_file.version;
        if !version.is_supported() {
            return Err(Error::UnsupportedClassVersion {
                class_name: input_name.to_owned(),
                version,
            });
        }
        log::trace!("Building class model of {} (version {})", input_name, version);
        Class::build(class_file, input_name, options, patches, diagnostics)
            .map_err(|err| err.in_class(input_name))
    }

    fn build(
        class_file: &ClassFile,
        input_name: &str,
        options: ParseOptions,
        patches: Option<&[Option<Patch<T>>]>,
        diagnostics: &dyn Diagnostics,
    ) -> Result<Class<T>, Error> {
        let version = class_file.version;
        let mut interner = Interner::new();
        let mut unresolved = UnresolvedPool::build(&class_file.constants)?;
        if let Some(patches) = patches {
            unresolved.patch(input_name, patches)?;
        }
        let mut pool = unresolved.resolve(input_name, version, options, &mut interner)?;

        let mut access_flags = ClassAccessFlags::from_bits_truncate(class_file.access_flags);
        if access_flags.contains(ClassAccessFlags::INTERFACE) && !version.has_java5_features() {
            access_flags |= ClassAccessFlags::ABSTRACT;
        }
        check_class_flags(access_flags, version, class_file.access_flags)?;
        let is_interface = access_flags.contains(ClassAccessFlags::INTERFACE);

        let this_class = class_file.this_class;
        let name = match pool.get(this_class) {
            Some(ConstantItem::Class(class)) => class.name.clone(),
            _ => return Err(Error::format("Invalid this_class constant pool index")),
        };
        if name.starts_with('[') {
            return Err(Error::format("Bad name"));
        }

        let super_class = if ConstantIndex::from(class_file.super_class).0 == 0 {
            if name != well_known::OBJECT {
                return Err(Error::format("Bad superclass index"));
            }
            None
        } else {
            match pool.get(class_file.super_class) {
                Some(ConstantItem::Class(class)) => Some(class.name.clone()),
                _ => return Err(Error::format("Bad superclass index")),
            }
        };
        if is_interface && super_class.as_deref() != Some(well_known::OBJECT) {
            return Err(Error::format(
                "Interfaces must have java.lang.Object as superclass",
            ));
        }

        let mut interfaces = Vec::with_capacity(class_file.interfaces.len());
        for index in &class_file.interfaces {
            match pool.get(*index) {
                Some(ConstantItem::Class(class)) => interfaces.push(class.name.clone()),
                _ => return Err(Error::format("Interface name has bad constant type")),
            }
        }
        if has_duplicates(&interfaces) {
            return Err(Error::format("Repetitive interface name"));
        }

        let mut declaring = DeclaringClass {
            name: &name,
            version,
            is_interface,
            options,
            interner: &mut interner,
            diagnostics,
        };
        let mut fields = class_file
            .fields
            .iter()
            .map(|info| Field::new(info, &mut pool, &mut declaring))
            .collect::<Result<Vec<_>, Error>>()?;
        let field_keys: Vec<_> = fields.iter().map(|field| field.member.key()).collect();
        if has_duplicates(&field_keys) {
            return Err(Error::format("Repetitive field name/signature"));
        }

        let mut methods = class_file
            .methods
            .iter()
            .map(|info| Method::new(info, &mut pool, &mut declaring))
            .collect::<Result<Vec<_>, Error>>()?;
        let method_keys: Vec<_> = methods.iter().map(|method| method.member.key()).collect();
        if has_duplicates(&method_keys) {
            return Err(Error::format("Repetitive method name/signature"));
        }

        if options.contains(ParseOptions::REMOVE_ASSERTIONS) {
            remove_assertions(&mut fields, &mut methods, &pool, &name);
        }

        let mut class = Class {
            version,
            access_flags,
            this_class,
            name,
            super_class,
            interfaces,
            pool,
            fields,
            methods,
            source_file: None,
            signature: None,
            enclosing_method: None,
            inner_classes: vec![],
            bootstrap_methods: vec![],
            annotations: vec![],
            type_annotations: None,
            ikvm_assembly: None,
            is_deprecated: false,
            is_internal: false,
        };
        for attribute in &class_file.attributes {
            let kind = AttributeKind::classify(class.pool.utf8(attribute.name_index)?, version);
            class.read_attribute(kind, &attribute.info, options, &mut interner)?;
        }

        for (_, item) in class.pool.iter() {
            if let ConstantItem::InvokeDynamic(call_site) = item {
                if call_site.bootstrap_method as usize >= class.bootstrap_methods.len() {
                    return Err(Error::format("Short length on BootstrapMethods in class file"));
                }
            }
        }

        Ok(class)
    }

    fn read_attribute(
        &mut self,
        kind: AttributeKind,
        info: &[u8],
        options: ParseOptions,
        interner: &mut Interner,
    ) -> Result<(), Error> {
        match kind {
            AttributeKind::Deprecated => {
                if !info.is_empty() {
                    return Err(Error::format("Invalid Deprecated attribute length"));
                }
                self.is_deprecated = true;
            }
            AttributeKind::SourceFile => {
                if info.len() != 2 {
                    return Err(Error::format("SourceFile attribute has incorrect length"));
                }
                let index = AttributeReader::new(info).index()?;
                self.source_file = Some(self.pool.utf8(index)?.clone());
            }
            AttributeKind::InnerClasses => {
                self.inner_classes = read_inner_classes(info, &mut self.pool)?;
            }
            AttributeKind::Signature => {
                self.signature = Some(read_signature(info, &self.pool)?);
            }
            AttributeKind::EnclosingMethod => {
                self.enclosing_method = Some(read_enclosing_method(info, &self.pool, interner)?);
            }
            AttributeKind::RuntimeVisibleAnnotations => {
                self.annotations = read_annotations(&mut AttributeReader::new(info), &self.pool)?;
            }
            AttributeKind::RuntimeInvisibleAnnotations => {
                let annotations = read_annotations(&mut AttributeReader::new(info), &self.pool)?;
                let internal = annotations
                    .iter()
                    .any(|annotation| annotation.type_name == markers::INTERNAL);
                if internal && options.contains(ParseOptions::STATIC_COMPILER) {
                    self.set_internal();
                }
            }
            AttributeKind::BootstrapMethods => {
                self.bootstrap_methods = read_bootstrap_methods(info, &mut self.pool)?;
            }
            AttributeKind::RuntimeVisibleTypeAnnotations => {
                self.pool.create_utf8_items();
                self.type_annotations = Some(info.to_vec());
            }
            AttributeKind::IkvmAssembly => {
                if info.len() != 2 {
                    return Err(Error::format("IKVM.NET.Assembly attribute has incorrect length"));
                }
                let index = AttributeReader::new(info).index()?;
                self.ikvm_assembly = Some(self.pool.utf8(index)?.clone());
            }
            _ => (),
        }
        Ok(())
    }

    /// Binary name, with `.` separators
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Missing only for `java.lang.Object`
    pub fn super_class_name(&self) -> Option<&str> {
        self.super_class.as_deref()
    }

    pub fn interfaces(&self) -> &[Interned] {
        &self.interfaces
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn access_flags(&self) -> ClassAccessFlags {
        self.access_flags
    }

    pub fn is_interface(&self) -> bool {
        self.access_flags.contains(ClassAccessFlags::INTERFACE)
    }

    pub fn this_class(&self) -> ClassConstantIndex {
        self.this_class
    }

    pub fn constant_pool(&self) -> &ConstantPool<T> {
        &self.pool
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn field(&self, name: &str, descriptor: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|field| field.member.name == name && field.member.descriptor == descriptor)
    }

    pub fn method(&self, name: &str, descriptor: &str) -> Option<&Method> {
        self.methods
            .iter()
            .find(|method| method.member.name == name && method.member.descriptor == descriptor)
    }

    pub fn source_file(&self) -> Option<&str> {
        self.source_file.as_deref()
    }

    /// Source file qualified by the package directory (eg. `me/alec/Point.java`)
    pub fn source_path(&self) -> Option<String> {
        let source_file = self.source_file.as_deref()?;
        Some(match self.name.rfind('.') {
            Some(end) => format!("{}/{}", self.name[..end].replace('.', "/"), source_file),
            None => source_file.to_owned(),
        })
    }

    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    pub fn enclosing_method(&self) -> Option<&EnclosingMethod> {
        self.enclosing_method.as_ref()
    }

    pub fn inner_classes(&self) -> &[InnerClass] {
        &self.inner_classes
    }

    pub fn bootstrap_methods(&self) -> &[BootstrapMethod] {
        &self.bootstrap_methods
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Raw `RuntimeVisibleTypeAnnotations` payload
    pub fn type_annotations(&self) -> Option<&[u8]> {
        self.type_annotations.as_deref()
    }

    /// Assembly named by the `IKVM.NET.Assembly` attribute
    pub fn ikvm_assembly(&self) -> Option<&str> {
        self.ikvm_assembly.as_deref()
    }

    pub fn is_deprecated(&self) -> bool {
        self.is_deprecated
    }

    pub fn is_internal(&self) -> bool {
        self.is_internal
    }

    /// Hide the class from other assemblies (this clears `public`)
    pub fn set_internal(&mut self) {
        self.is_internal = true;
        self.access_flags.remove(ClassAccessFlags::PUBLIC);
    }

    /// Link the constant pool against the host
    ///
    /// `this_type` is the host's type for this class. It is bound to the class's own constant
    /// before anything else, so the class can refer to itself even if the host cannot load it by
    /// name. May be called concurrently.
    pub fn link(&self, host: &T, this_type: &T::Type, mode: LoadMode, diagnostics: &dyn Diagnostics) {
        self.pool
            .link(host, self.this_class, this_type, mode, diagnostics)
    }
}

impl<T: TypeSystem> Debug for Class<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("access_flags", &self.access_flags)
            .field("super_class", &self.super_class)
            .field("interfaces", &self.interfaces)
            .field("fields", &self.fields)
            .field("methods", &self.methods)
            .finish()
    }
}

fn check_class_flags(flags: ClassAccessFlags, version: Version, bits: u16) -> Result<(), Error> {
    let is_interface = flags.contains(ClassAccessFlags::INTERFACE);
    let illegal = (is_interface && flags.contains(ClassAccessFlags::FINAL))
        || flags.contains(ClassAccessFlags::ABSTRACT | ClassAccessFlags::FINAL)
        || (version.has_java5_features()
            && flags.contains(ClassAccessFlags::ANNOTATION)
            && !is_interface)
        || (version.has_java5_features()
            && is_interface
            && (!flags.contains(ClassAccessFlags::ABSTRACT)
                || flags.intersects(ClassAccessFlags::SUPER | ClassAccessFlags::ENUM)));
    if illegal {
        return Err(Error::format(format!("Illegal class modifiers 0x{:X}", bits)));
    }
    Ok(())
}

/// Skip the `$assertionsDisabled` initialization in the static initializer, if there is one
fn remove_assertions<T: TypeSystem>(
    fields: &mut [Field],
    methods: &mut [Method],
    pool: &ConstantPool<T>,
    this_class: &str,
) {
    let clinit = match methods.iter_mut().find(|method| method.is_class_initializer()) {
        Some(clinit) => clinit,
        None => return,
    };
    let code = match clinit.code.as_mut().and_then(Code::decoded_mut) {
        Some(code) => code,
        None => return,
    };
    let is_static_final = |name: &str| {
        fields.iter().any(|field| {
            field.member.name == name
                && field.member.descriptor == "Z"
                && field.is_static()
                && field.is_final()
        })
    };
    let field_name = match remove_assertion_init(code, pool, this_class, is_static_final) {
        Some(field) => field.name.clone(),
        None => return,
    };
    if let Some(field) = fields
        .iter_mut()
        .find(|field| field.member.name == field_name && field.member.descriptor == "Z")
    {
        field.constant_value = Some(FieldConstant::Boolean(true));
    }
    clinit.markers |= MethodMarkers::HAS_ASSERTIONS;
}

fn read_inner_classes<T: TypeSystem>(
    info: &[u8],
    pool: &mut ConstantPool<T>,
) -> Result<Vec<InnerClass>, Error> {
    let mut reader = AttributeReader::new(info);
    let count = reader.u16()? as usize;
    if info.len() != 2 + 8 * count {
        return Err(Error::format("InnerClasses attribute has incorrect length"));
    }

    let mut inner_classes = Vec::with_capacity(count);
    for _ in 0..count {
        let inner_class = reader.u16()?;
        let outer_class = reader.u16()?;
        let name = reader.u16()?;
        let access_flags = reader.u16()?;

        if !pool.is_class(inner_class) {
            return Err(Error::format("inner_class_info_index has bad constant type"));
        }
        if outer_class != 0 && !pool.is_class(outer_class) {
            return Err(Error::format("outer_class_info_index has bad constant type"));
        }
        if name != 0 && pool.get_utf8(name).is_none() {
            return Err(Error::format("inner_name_index has bad constant type"));
        }
        if inner_class == outer_class {
            return Err(Error::format("Class is both inner and outer class"));
        }

        pool.mark_link_required(inner_class);
        if outer_class != 0 {
            pool.mark_link_required(outer_class);
        }
        inner_classes.push(InnerClass {
            inner_class: ClassConstantIndex::from(inner_class),
            outer_class: (outer_class != 0).then(|| ClassConstantIndex::from(outer_class)),
            name: match name {
                0 => None,
                name => pool.get_utf8(name).cloned(),
            },
            access_flags: InnerClassAccessFlags::from_bits_truncate(access_flags),
        });
    }
    Ok(inner_classes)
}

fn read_enclosing_method<T: TypeSystem>(
    info: &[u8],
    pool: &ConstantPool<T>,
    interner: &mut Interner,
) -> Result<EnclosingMethod, Error> {
    if info.len() != 4 {
        return Err(Error::format("Wrong EnclosingMethod attribute length"));
    }
    let mut reader = AttributeReader::new(info);
    let class = pool.class(reader.index()?)?.name.clone();
    let method_index = reader.index()?;
    let method = match pool.get(method_index) {
        _ if method_index.0 == 0 => None,
        Some(ConstantItem::NameAndType { name, descriptor }) => Some((
            pool.utf8(*name)?.clone(),
            interner.intern_dotted(pool.utf8(*descriptor)?),
        )),
        _ => {
            return Err(Error::format(format!(
                "Bad constant pool index #{}",
                method_index.0
            )))
        }
    };
    Ok(EnclosingMethod { class, method })
}

/// Read the bootstrap methods, checking that every handle and argument is a usable constant
fn read_bootstrap_methods<T: TypeSystem>(
    info: &[u8],
    pool: &mut ConstantPool<T>,
) -> Result<Vec<BootstrapMethod>, Error> {
    let mut reader = AttributeReader::new(info);
    let count = reader.u16()?;
    let mut bootstrap_methods = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let method_handle = reader.index()?;
        if !matches!(pool.get(method_handle), Some(ConstantItem::MethodHandle(_))) {
            return Err(Error::format(format!(
                "bootstrap_method_index {} has bad constant type",
                method_handle.0
            )));
        }
        pool.mark_link_required(method_handle);

        let argument_count = reader.u16()?;
        let mut arguments = Vec::with_capacity(argument_count as usize);
        for _ in 0..argument_count {
            let argument = reader.index()?;
            if !pool.is_loadable(argument) {
                return Err(Error::format(format!(
                    "argument_index {} has bad constant type",
                    argument.0
                )));
            }
            pool.mark_link_required(argument);
            arguments.push(argument);
        }
        bootstrap_methods.push(BootstrapMethod {
            method_handle,
            arguments,
        });
    }
    if !reader.is_at_end() {
        return Err(Error::format("Bad length on BootstrapMethods"));
    }
    Ok(bootstrap_methods)
}
