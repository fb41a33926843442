use super::member::{DeclaringClass, Member};
use crate::jvm::annotations::{
    markers, read_annotations, read_element_value, read_parameter_annotations, Annotation,
    ElementValue,
};
use crate::jvm::class_file::{AttributeKind, AttributeReader, MemberInfo};
use crate::jvm::class_graph::TypeSystem;
use crate::jvm::code::Code;
use crate::jvm::pool::ConstantPool;
use crate::jvm::{
    has_conflicting_visibility, is_valid_method_descriptor, is_valid_method_name, Error,
    MethodAccessFlags, ParseOptions, VerifyError, Version, Warning, CLINIT, INIT,
};
use crate::util::Interned;
use bitflags::bitflags;
use byteorder::{BigEndian, ByteOrder};

bitflags! {
    /// Facts about a method gathered from marker annotations and code rewrites
    #[derive(Default)]
    pub struct MethodMarkers: u16 {
        const CALLER_SENSITIVE = 0x0001;
        const LAMBDA_FORM_COMPILED = 0x0002;
        const LAMBDA_FORM_HIDDEN = 0x0004;
        const FORCE_INLINE = 0x0008;
        const MODULE_INITIALIZER = 0x0010;

        /// The `$assertionsDisabled` initialization was removed from this static initializer
        const HAS_ASSERTIONS = 0x0020;
    }
}

/// Access flags a method parameter may carry (`final`, `synthetic`, `mandated`)
const PARAMETER_FLAGS: u16 = 0x0010 | 0x1000 | 0x8000;

/// Method declared in a class
#[derive(Clone, Debug)]
pub struct Method {
    pub member: Member<MethodAccessFlags>,

    /// Absent exactly for `abstract` and `native` methods
    pub code: Option<Code>,

    /// Declared thrown classes (binary names)
    pub exceptions: Vec<Interned>,

    pub parameter_annotations: Option<Vec<Vec<Annotation>>>,

    /// Default value of an annotation type element
    pub annotation_default: Option<ElementValue>,

    pub parameters: MethodParameters,

    /// Field named by an `ikvm.lang.InterlockedCompareAndSet` annotation
    pub interlocked_compare_and_set: Option<String>,

    pub markers: MethodMarkers,
}

/// Contents of the `MethodParameters` attribute
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MethodParameters {
    Absent,
    Present(Vec<MethodParameter>),

    /// The attribute was there, but could not be used
    Malformed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodParameter {
    pub name: Option<Interned>,
    pub access_flags: u16,
}

impl Method {
    pub(super) fn new<T: TypeSystem>(
        info: &MemberInfo,
        pool: &mut ConstantPool<T>,
        class: &mut DeclaringClass,
    ) -> Result<Method, Error> {
        let name = pool.utf8(info.name_index)?.clone();
        let raw_descriptor = pool.utf8(info.descriptor_index)?;
        if !is_valid_method_descriptor(raw_descriptor) {
            return Err(Error::format(format!(
                "Method {}.{} has invalid signature {}",
                class.name, name, raw_descriptor
            )));
        }
        if !is_valid_method_name(&name, class.version) {
            if name != INIT && name != CLINIT {
                return Err(Error::format(format!("Illegal method name \"{}\"", name)));
            }
            if !raw_descriptor.ends_with('V') {
                return Err(Error::format(format!(
                    "Method \"{}\" has illegal signature \"{}\"",
                    name, raw_descriptor
                )));
            }
        }
        let descriptor = class.interner.intern_dotted(raw_descriptor);
        let access_flags = method_flags(
            &name,
            &descriptor,
            info.access_flags,
            class.name,
            class.version,
            class.is_interface,
        )?;

        let mut method = Method {
            member: Member::new(name, descriptor, access_flags),
            code: None,
            exceptions: vec![],
            parameter_annotations: None,
            annotation_default: None,
            parameters: MethodParameters::Absent,
            interlocked_compare_and_set: None,
            markers: MethodMarkers::empty(),
        };

        let mut has_exceptions = false;
        for attribute in &info.attributes {
            let kind = AttributeKind::classify(pool.utf8(attribute.name_index)?, class.version);
            if method.member.read_common_attribute(kind, &attribute.info, pool)? {
                if kind == AttributeKind::RuntimeVisibleAnnotations
                    && class.options.contains(ParseOptions::TRUSTED_ANNOTATIONS)
                {
                    method.apply_trusted_annotations();
                }
                continue;
            }
            match kind {
                AttributeKind::Code => {
                    if method.code.is_some() {
                        return Err(Error::format("Duplicate Code attribute"));
                    }
                    method.code = Some(Code::decode(
                        &attribute.info,
                        pool,
                        &method.member.name,
                        &method.member.descriptor,
                        method.is_static(),
                        class.options,
                    )?);
                }
                AttributeKind::Exceptions => {
                    if has_exceptions {
                        return Err(Error::format("Duplicate Exceptions attribute"));
                    }
                    has_exceptions = true;
                    method.exceptions = read_exceptions(&attribute.info, pool)?;
                }
                AttributeKind::RuntimeVisibleParameterAnnotations => {
                    let mut reader = AttributeReader::new(&attribute.info);
                    let annotations = read_parameter_annotations(&mut reader, &*pool)?;
                    reader.expect_end("RuntimeVisibleParameterAnnotations")?;
                    method.parameter_annotations = Some(annotations);
                }
                AttributeKind::AnnotationDefault => {
                    let mut reader = AttributeReader::new(&attribute.info);
                    let value = read_element_value(&mut reader, &*pool)?;
                    reader.expect_end("AnnotationDefault")?;
                    method.annotation_default = Some(value);
                }
                AttributeKind::MethodParameters => {
                    if method.parameters != MethodParameters::Absent {
                        return Err(Error::format("Duplicate MethodParameters attribute"));
                    }
                    method.parameters = read_method_parameters(&attribute.info, pool);
                }
                AttributeKind::RuntimeInvisibleAnnotations => {
                    let mut reader = AttributeReader::new(&attribute.info);
                    for annotation in read_annotations(&mut reader, &*pool)? {
                        method.apply_invisible_annotation(&annotation, class);
                    }
                }
                _ => (),
            }
        }

        if method.is_abstract() || method.is_native() {
            if method.code.is_some() {
                return Err(Error::format("Code attribute in native or abstract methods"));
            }
        } else if method.code.is_none() {
            if method.member.name != CLINIT {
                return Err(Error::format(
                    "Absent Code attribute in method that is not native or abstract",
                ));
            }
            method.code = Some(Code::missing(VerifyError::new(format!(
                "Class {}, method {} signature {}: No Code attribute",
                class.name, method.member.name, method.member.descriptor
            ))));
        }

        Ok(method)
    }

    pub fn name(&self) -> &str {
        &self.member.name
    }

    pub fn descriptor(&self) -> &str {
        &self.member.descriptor
    }

    pub fn is_static(&self) -> bool {
        self.member.access_flags.contains(MethodAccessFlags::STATIC)
    }

    pub fn is_abstract(&self) -> bool {
        self.member.access_flags.contains(MethodAccessFlags::ABSTRACT)
    }

    pub fn is_native(&self) -> bool {
        self.member.access_flags.contains(MethodAccessFlags::NATIVE)
    }

    pub fn is_constructor(&self) -> bool {
        self.member.name == INIT
    }

    pub fn is_class_initializer(&self) -> bool {
        self.member.name == CLINIT && self.member.descriptor == "()V"
    }

    pub fn has_assertions(&self) -> bool {
        self.markers.contains(MethodMarkers::HAS_ASSERTIONS)
    }

    fn apply_trusted_annotations(&mut self) {
        for annotation in &self.member.annotations {
            self.markers |= match annotation.type_name.as_str() {
                markers::CALLER_SENSITIVE => MethodMarkers::CALLER_SENSITIVE,
                markers::LAMBDA_FORM_COMPILED => MethodMarkers::LAMBDA_FORM_COMPILED,
                markers::LAMBDA_FORM_HIDDEN => MethodMarkers::LAMBDA_FORM_HIDDEN,
                markers::FORCE_INLINE => MethodMarkers::FORCE_INLINE,
                _ => MethodMarkers::empty(),
            };
        }
    }

    fn apply_invisible_annotation(&mut self, annotation: &Annotation, class: &DeclaringClass) {
        let warning = match annotation.type_name.as_str() {
            markers::INTERNAL if class.options.contains(ParseOptions::STATIC_COMPILER) => {
                if !class.is_interface {
                    self.member.is_internal = true;
                    self.member.access_flags.remove(MethodAccessFlags::VISIBILITY);
                    return;
                }
                Warning::InternalOnInterfaceMethod {
                    class: class.name.to_owned(),
                    member: self.member.name.to_string(),
                }
            }
            markers::MODULE_INITIALIZER => {
                let valid = !class.is_interface
                    && !self.is_constructor()
                    && !self.is_class_initializer()
                    && self.is_static()
                    && !self.member.access_flags.contains(MethodAccessFlags::PRIVATE)
                    && self.member.descriptor == "()V";
                if valid {
                    self.markers |= MethodMarkers::MODULE_INITIALIZER;
                    return;
                }
                Warning::MalformedModuleInitializer {
                    class: class.name.to_owned(),
                    member: self.member.name.to_string(),
                }
            }
            markers::INTERLOCKED_COMPARE_AND_SET => {
                let field = annotation.element("value").and_then(ElementValue::as_str);
                if let (true, Some(field)) = (self.is_static(), field) {
                    self.interlocked_compare_and_set = Some(field.to_owned());
                    return;
                }
                Warning::MalformedInterlockedCompareAndSet {
                    class: class.name.to_owned(),
                    member: self.member.name.to_string(),
                }
            }
            _ => return,
        };
        class.diagnostics.warn(warning);
    }
}

fn method_flags(
    name: &str,
    descriptor: &str,
    bits: u16,
    class_name: &str,
    version: Version,
    is_interface: bool,
) -> Result<MethodAccessFlags, Error> {
    let flags = MethodAccessFlags::from_bits_truncate(bits);

    // Only `strictfp` survives on a static initializer, everything else is implied
    if name == CLINIT && descriptor == "()V" && (!version.has_java7_features() || flags.contains(MethodAccessFlags::STATIC)) {
        return Ok((flags & MethodAccessFlags::STRICT) | MethodAccessFlags::STATIC | MethodAccessFlags::PRIVATE);
    }

    let illegal = (name == INIT
        && flags.intersects(
            MethodAccessFlags::STATIC
                | MethodAccessFlags::SYNCHRONIZED
                | MethodAccessFlags::FINAL
                | MethodAccessFlags::ABSTRACT
                | MethodAccessFlags::NATIVE,
        ))
        || has_conflicting_visibility(bits)
        || (flags.contains(MethodAccessFlags::ABSTRACT)
            && flags.intersects(
                MethodAccessFlags::FINAL
                    | MethodAccessFlags::NATIVE
                    | MethodAccessFlags::PRIVATE
                    | MethodAccessFlags::STATIC
                    | MethodAccessFlags::SYNCHRONIZED,
            ))
        || (is_interface && !version.has_java8_features() && !flags.contains(MethodAccessFlags::PUBLIC | MethodAccessFlags::ABSTRACT))
        || (is_interface && version.has_java8_features() && !flags.intersects(MethodAccessFlags::PUBLIC | MethodAccessFlags::PRIVATE))
        || (is_interface
            && flags.intersects(MethodAccessFlags::FINAL | MethodAccessFlags::NATIVE | MethodAccessFlags::SYNCHRONIZED));
    if illegal {
        return Err(Error::format(format!(
            "Method {} in class {} has illegal modifiers: 0x{:X}",
            name, class_name, bits
        )));
    }
    Ok(flags)
}

fn read_exceptions<T: TypeSystem>(info: &[u8], pool: &ConstantPool<T>) -> Result<Vec<Interned>, Error> {
    let mut reader = AttributeReader::new(info);
    let count = reader.u16()? as usize;
    if info.len() != 2 + 2 * count {
        return Err(Error::format("Exceptions attribute has incorrect length"));
    }
    let mut exceptions = Vec::with_capacity(count);
    for _ in 0..count {
        exceptions.push(pool.class(reader.index()?)?.name.clone());
    }
    Ok(exceptions)
}

/// Decode `MethodParameters`, which is never fatal
fn read_method_parameters<T: TypeSystem>(info: &[u8], pool: &ConstantPool<T>) -> MethodParameters {
    let (count, entries) = match info.split_first() {
        Some((count, entries)) if entries.len() == 4 * *count as usize => (*count, entries),
        _ => return MethodParameters::Malformed,
    };
    let mut parameters = Vec::with_capacity(count as usize);
    for entry in entries.chunks_exact(4) {
        let name_index = BigEndian::read_u16(&entry[0..2]);
        let access_flags = BigEndian::read_u16(&entry[2..4]);
        let name = match name_index {
            0 => None,
            index => match pool.get_utf8(index) {
                Some(name) => Some(name.clone()),
                None => return MethodParameters::Malformed,
            },
        };
        if access_flags & !PARAMETER_FLAGS != 0 {
            return MethodParameters::Malformed;
        }
        parameters.push(MethodParameter { name, access_flags });
    }
    MethodParameters::Present(parameters)
}
