use super::member::{DeclaringClass, Member};
use crate::jvm::annotations::{markers, read_annotations, Annotation};
use crate::jvm::class_file::{AttributeKind, AttributeReader, MemberInfo};
use crate::jvm::class_graph::TypeSystem;
use crate::jvm::pool::{ConstantItem, ConstantPool};
use crate::jvm::{
    has_conflicting_visibility, is_valid_field_descriptor, is_valid_field_name, Error,
    FieldAccessFlags, ParseOptions, Warning,
};
use crate::util::Interned;

/// Field declared in a class
#[derive(Clone, Debug)]
pub struct Field {
    pub member: Member<FieldAccessFlags>,

    /// Value from the `ConstantValue` attribute, typed according to the field descriptor
    pub constant_value: Option<FieldConstant>,

    /// Accessor names from an `ikvm.lang.Property` annotation
    pub property: Option<Property>,
}

/// Constant value of a field
#[derive(Clone, Debug, PartialEq)]
pub enum FieldConstant {
    Boolean(bool),
    Byte(i8),
    Char(u16),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(Interned),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Property {
    pub getter: Option<String>,
    pub setter: Option<String>,
}

impl Field {
    pub(super) fn new<T: TypeSystem>(
        info: &MemberInfo,
        pool: &mut ConstantPool<T>,
        class: &mut DeclaringClass,
    ) -> Result<Field, Error> {
        let name = pool.utf8(info.name_index)?.clone();
        let raw_descriptor = pool.utf8(info.descriptor_index)?;
        if !is_valid_field_descriptor(raw_descriptor) {
            return Err(Error::format(format!(
                "Field \"{}\" has invalid signature \"{}\"",
                name, raw_descriptor
            )));
        }
        if !is_valid_field_name(&name, class.version) {
            return Err(Error::format(format!("Illegal field name \"{}\"", name)));
        }
        let descriptor = class.interner.intern_dotted(raw_descriptor);

        let flags = FieldAccessFlags::from_bits_truncate(info.access_flags);
        let illegal = has_conflicting_visibility(info.access_flags)
            || flags.contains(FieldAccessFlags::FINAL | FieldAccessFlags::VOLATILE)
            || (class.is_interface
                && (!flags.contains(
                    FieldAccessFlags::PUBLIC | FieldAccessFlags::STATIC | FieldAccessFlags::FINAL,
                ) || flags.contains(FieldAccessFlags::TRANSIENT)));
        if illegal {
            return Err(Error::format(format!(
                "Illegal field modifiers: 0x{:X}",
                info.access_flags
            )));
        }

        let mut field = Field {
            member: Member::new(name, descriptor, flags),
            constant_value: None,
            property: None,
        };

        for attribute in &info.attributes {
            let kind = AttributeKind::classify(pool.utf8(attribute.name_index)?, class.version);
            if field.member.read_common_attribute(kind, &attribute.info, pool)? {
                continue;
            }
            match kind {
                AttributeKind::ConstantValue => {
                    if attribute.info.len() != 2 {
                        return Err(Error::format("ConstantValue attribute has incorrect length"));
                    }
                    let index = AttributeReader::new(&attribute.info).index()?;
                    field.constant_value = Some(field.read_constant(pool.get(index))?);
                }
                AttributeKind::RuntimeInvisibleAnnotations => {
                    let mut reader = AttributeReader::new(&attribute.info);
                    for annotation in read_annotations(&mut reader, &*pool)? {
                        field.apply_invisible_annotation(&annotation, class);
                    }
                }
                _ => (),
            }
        }

        Ok(field)
    }

    pub fn name(&self) -> &str {
        &self.member.name
    }

    pub fn descriptor(&self) -> &str {
        &self.member.descriptor
    }

    pub fn is_static(&self) -> bool {
        self.member.access_flags.contains(FieldAccessFlags::STATIC)
    }

    pub fn is_final(&self) -> bool {
        self.member.access_flags.contains(FieldAccessFlags::FINAL)
    }

    fn read_constant<T: TypeSystem>(&self, item: Option<&ConstantItem<T>>) -> Result<FieldConstant, Error> {
        let bad_index = || Error::format("Bad index into constant pool");
        let constant = match (&*self.member.descriptor, item) {
            ("I", Some(ConstantItem::Integer(int))) => FieldConstant::Int(*int),
            ("S", Some(ConstantItem::Integer(int))) => FieldConstant::Short(*int as i16),
            ("B", Some(ConstantItem::Integer(int))) => FieldConstant::Byte(*int as i8),
            ("C", Some(ConstantItem::Integer(int))) => FieldConstant::Char(*int as u16),
            ("Z", Some(ConstantItem::Integer(int))) => FieldConstant::Boolean(*int != 0),
            ("J", Some(ConstantItem::Long(long))) => FieldConstant::Long(*long),
            ("F", Some(ConstantItem::Float(float))) => FieldConstant::Float(*float),
            ("D", Some(ConstantItem::Double(double))) => FieldConstant::Double(*double),
            ("Ljava.lang.String;", Some(ConstantItem::String(string))) => {
                FieldConstant::String(string.clone())
            }
            ("I" | "S" | "B" | "C" | "Z" | "J" | "F" | "D" | "Ljava.lang.String;", _) => {
                return Err(bad_index())
            }
            _ => return Err(Error::format("Invalid signature for constant")),
        };
        Ok(constant)
    }

    fn apply_invisible_annotation(&mut self, annotation: &Annotation, class: &DeclaringClass) {
        match annotation.type_name.as_str() {
            markers::INTERNAL if class.options.contains(ParseOptions::STATIC_COMPILER) => {
                self.member.is_internal = true;
                self.member.access_flags.remove(FieldAccessFlags::VISIBILITY);
            }
            markers::PROPERTY => {
                let warning = if self.property.is_some() {
                    Warning::DuplicatePropertyAnnotation {
                        class: class.name.to_owned(),
                        member: self.member.name.to_string(),
                    }
                } else if let Some(property) = read_property(annotation) {
                    self.property = Some(property);
                    return;
                } else {
                    Warning::MalformedPropertyAnnotation {
                        class: class.name.to_owned(),
                        member: self.member.name.to_string(),
                    }
                };
                class.diagnostics.warn(warning);
            }
            _ => (),
        }
    }
}

/// Accessor names, each given at most once as a string element named `get` or `set`
fn read_property(annotation: &Annotation) -> Option<Property> {
    let mut property = Property::default();
    for (name, value) in &annotation.elements {
        let accessor = match name.as_str() {
            "get" => &mut property.getter,
            "set" => &mut property.setter,
            _ => return None,
        };
        if accessor.is_some() {
            return None;
        }
        *accessor = Some(value.as_str()?.to_owned());
    }
    Some(property)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::annotations::ElementValue;

    fn property(elements: &[(&str, ElementValue)]) -> Annotation {
        Annotation {
            type_name: String::from(markers::PROPERTY),
            elements: elements
                .iter()
                .map(|(name, value)| (String::from(*name), value.clone()))
                .collect(),
        }
    }

    fn string(value: &str) -> ElementValue {
        ElementValue::String(String::from(value))
    }

    #[test]
    fn getter_and_setter() {
        let annotation = property(&[("get", string("getX")), ("set", string("setX"))]);
        assert_eq!(
            read_property(&annotation),
            Some(Property {
                getter: Some(String::from("getX")),
                setter: Some(String::from("setX")),
            })
        );
        assert_eq!(read_property(&property(&[])), Some(Property::default()));
    }

    #[test]
    fn malformed_property() {
        assert_eq!(read_property(&property(&[("get", ElementValue::Int(1))])), None);
        assert_eq!(read_property(&property(&[("other", string("x"))])), None);
        assert_eq!(
            read_property(&property(&[("get", string("a")), ("get", string("b"))])),
            None
        );
    }
}
