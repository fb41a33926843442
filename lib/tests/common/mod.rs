//! Helpers for assembling class file records by hand

#![allow(dead_code)]

use byteorder::{BigEndian, WriteBytesExt};
use classlink::jvm::class_file::{Attribute, ClassFile, MemberInfo, RawConstant};
use classlink::jvm::{ClassAccessFlags, Version};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Builder for a [`ClassFile`], deduplicating constants as they are added
pub struct ClassFileBuilder {
    pub version: Version,
    pub constants: Vec<Option<RawConstant>>,
    pub access_flags: u16,
    pub this_class: u16,
    pub super_class: u16,
    pub interfaces: Vec<u16>,
    pub fields: Vec<MemberInfo>,
    pub methods: Vec<MemberInfo>,
    pub attributes: Vec<Attribute>,
}

impl ClassFileBuilder {
    /// Public class with the given internal name (eg. `me/alec/Point`) extending `java/lang/Object`
    pub fn new(name: &str) -> ClassFileBuilder {
        ClassFileBuilder::with_version(name, Version::JAVA8)
    }

    pub fn with_version(name: &str, version: Version) -> ClassFileBuilder {
        let mut builder = ClassFileBuilder {
            version,
            constants: vec![None],
            access_flags: (ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER).bits(),
            this_class: 0,
            super_class: 0,
            interfaces: vec![],
            fields: vec![],
            methods: vec![],
            attributes: vec![],
        };
        builder.this_class = builder.class(name);
        builder.super_class = builder.class("java/lang/Object");
        builder
    }

    fn push(&mut self, constant: RawConstant) -> u16 {
        if let Some(index) = self.constants.iter().position(|c| c.as_ref() == Some(&constant)) {
            return index as u16;
        }
        self.constants.push(Some(constant));
        (self.constants.len() - 1) as u16
    }

    pub fn utf8(&mut self, text: &str) -> u16 {
        self.push(RawConstant::Utf8(String::from(text)))
    }

    pub fn class(&mut self, name: &str) -> u16 {
        let name = self.utf8(name);
        self.push(RawConstant::Class { name: name.into() })
    }

    pub fn string(&mut self, text: &str) -> u16 {
        let value = self.utf8(text);
        self.push(RawConstant::String { value: value.into() })
    }

    pub fn integer(&mut self, value: i32) -> u16 {
        self.push(RawConstant::Integer(value))
    }

    pub fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name = self.utf8(name);
        let descriptor = self.utf8(descriptor);
        self.push(RawConstant::NameAndType {
            name: name.into(),
            descriptor: descriptor.into(),
        })
    }

    pub fn fieldref(&mut self, class: &str, name: &str, descriptor: &str) -> u16 {
        let class = self.class(class);
        let name_and_type = self.name_and_type(name, descriptor);
        self.push(RawConstant::FieldRef {
            class: class.into(),
            name_and_type: name_and_type.into(),
        })
    }

    pub fn methodref(&mut self, class: &str, name: &str, descriptor: &str) -> u16 {
        let class = self.class(class);
        let name_and_type = self.name_and_type(name, descriptor);
        self.push(RawConstant::MethodRef {
            class: class.into(),
            name_and_type: name_and_type.into(),
        })
    }

    pub fn attribute(&mut self, name: &str, info: Vec<u8>) -> Attribute {
        Attribute {
            name_index: self.utf8(name).into(),
            info,
        }
    }

    pub fn field(&mut self, access_flags: u16, name: &str, descriptor: &str, attributes: Vec<Attribute>) {
        let member = self.member(access_flags, name, descriptor, attributes);
        self.fields.push(member);
    }

    pub fn method(&mut self, access_flags: u16, name: &str, descriptor: &str, attributes: Vec<Attribute>) {
        let member = self.member(access_flags, name, descriptor, attributes);
        self.methods.push(member);
    }

    fn member(&mut self, access_flags: u16, name: &str, descriptor: &str, attributes: Vec<Attribute>) -> MemberInfo {
        MemberInfo {
            access_flags,
            name_index: self.utf8(name).into(),
            descriptor_index: self.utf8(descriptor).into(),
            attributes,
        }
    }

    pub fn class_attribute(&mut self, name: &str, info: Vec<u8>) {
        let attribute = self.attribute(name, info);
        self.attributes.push(attribute);
    }

    pub fn build(&self) -> ClassFile {
        ClassFile {
            version: self.version,
            constants: self.constants.clone(),
            access_flags: self.access_flags,
            this_class: self.this_class.into(),
            super_class: self.super_class.into(),
            interfaces: self.interfaces.iter().map(|index| (*index).into()).collect(),
            fields: self.fields.clone(),
            methods: self.methods.clone(),
            attributes: self.attributes.clone(),
        }
    }
}

/// Payload of a `Code` attribute with no nested attributes
///
/// Handlers are `(start_pc, end_pc, handler_pc, catch_type)`.
pub fn code(max_stack: u16, max_locals: u16, bytecode: &[u8], handlers: &[(u16, u16, u16, u16)]) -> Vec<u8> {
    let mut info = vec![];
    info.write_u16::<BigEndian>(max_stack).unwrap();
    info.write_u16::<BigEndian>(max_locals).unwrap();
    info.write_u32::<BigEndian>(bytecode.len() as u32).unwrap();
    info.extend_from_slice(bytecode);
    info.write_u16::<BigEndian>(handlers.len() as u16).unwrap();
    for (start_pc, end_pc, handler_pc, catch_type) in handlers {
        info.write_u16::<BigEndian>(*start_pc).unwrap();
        info.write_u16::<BigEndian>(*end_pc).unwrap();
        info.write_u16::<BigEndian>(*handler_pc).unwrap();
        info.write_u16::<BigEndian>(*catch_type).unwrap();
    }
    info.write_u16::<BigEndian>(0).unwrap();
    info
}

/// Big-endian encoding of a sequence of `u16`s
pub fn u16s(values: &[u16]) -> Vec<u8> {
    let mut bytes = vec![];
    for value in values {
        bytes.write_u16::<BigEndian>(*value).unwrap();
    }
    bytes
}
