use crate::jvm::binary_format::{read_bytes, Deserialize};
use byteorder::ReadBytesExt;
use std::io::{Error, ErrorKind, Result};

/// Constants as they appear in the constant pool of a class file
///
/// Indices inside of constants are typed by what they are _supposed_ to point at, but nothing at
/// this level checks that they actually do. That is the job of the constant pool.
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se8/html/jvms-4.html#jvms-4.4
#[derive(Debug, Clone, PartialEq)]
pub enum RawConstant {
    /// Constant (modified) UTF-8 encoded raw string value
    Utf8(String),

    /// Constant primitive of type `int`
    Integer(i32),

    /// Constant primitive of type `float`
    Float(f32),

    /// Constant primitive of type `long`
    Long(i64),

    /// Constant primitive of type `double`
    Double(f64),

    /// Class or an interface
    Class { name: Utf8ConstantIndex },

    /// Constant object of type `java.lang.String`
    String { value: Utf8ConstantIndex },

    /// Field
    FieldRef {
        class: ClassConstantIndex,
        name_and_type: NameAndTypeConstantIndex,
    },

    /// Method on a class
    MethodRef {
        class: ClassConstantIndex,
        name_and_type: NameAndTypeConstantIndex,
    },

    /// Method on an interface
    InterfaceMethodRef {
        class: ClassConstantIndex,
        name_and_type: NameAndTypeConstantIndex,
    },

    /// Name and a type (eg. for a field or a method)
    NameAndType {
        name: Utf8ConstantIndex,
        descriptor: Utf8ConstantIndex,
    },

    /// Constant object of type `java.lang.invoke.MethodHandle`
    MethodHandle {
        /// Raw reference kind (see [`HandleKind`])
        reference_kind: u8,

        /// Depending on the kind, this is supposed to point to a field or (interface) method ref
        reference: ConstantIndex,
    },

    /// Method type
    MethodType { descriptor: Utf8ConstantIndex },

    /// Dynamically-computed call site
    InvokeDynamic {
        /// Index into the `BootstrapMethods` attribute
        bootstrap_method: u16,
        name_and_type: NameAndTypeConstantIndex,
    },

    /// Well-formed constant of a kind that the model does not handle (eg. `CONSTANT_Module`)
    Unsupported(u8),
}

impl RawConstant {
    pub const UTF8: u8 = 1;
    pub const INTEGER: u8 = 3;
    pub const FLOAT: u8 = 4;
    pub const LONG: u8 = 5;
    pub const DOUBLE: u8 = 6;
    pub const CLASS: u8 = 7;
    pub const STRING: u8 = 8;
    pub const FIELD_REF: u8 = 9;
    pub const METHOD_REF: u8 = 10;
    pub const INTERFACE_METHOD_REF: u8 = 11;
    pub const NAME_AND_TYPE: u8 = 12;
    pub const METHOD_HANDLE: u8 = 15;
    pub const METHOD_TYPE: u8 = 16;
    pub const DYNAMIC: u8 = 17;
    pub const INVOKE_DYNAMIC: u8 = 18;
    pub const MODULE: u8 = 19;
    pub const PACKAGE: u8 = 20;

    /// Number of constant pool entries the constant occupies in the class file
    ///
    /// > In retrospect, making 8-byte constants take two constant pool entries was a poor choice.
    pub fn width(&self) -> usize {
        match self {
            RawConstant::Long(_) | RawConstant::Double(_) => 2,
            _ => 1,
        }
    }
}

impl Deserialize for RawConstant {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> Result<Self> {
        let tag = u8::deserialize(reader)?;
        let constant = match tag {
            RawConstant::UTF8 => {
                let len = u16::deserialize(reader)?;
                let bytes = read_bytes(reader, len as usize)?;
                let string = decode_modified_utf8(&bytes).ok_or_else(|| {
                    Error::new(ErrorKind::InvalidData, "Illegal UTF8 string in constant pool")
                })?;
                RawConstant::Utf8(string)
            }
            RawConstant::INTEGER => RawConstant::Integer(i32::deserialize(reader)?),
            RawConstant::FLOAT => RawConstant::Float(f32::deserialize(reader)?),
            RawConstant::LONG => RawConstant::Long(i64::deserialize(reader)?),
            RawConstant::DOUBLE => RawConstant::Double(f64::deserialize(reader)?),
            RawConstant::CLASS => RawConstant::Class {
                name: Deserialize::deserialize(reader)?,
            },
            RawConstant::STRING => RawConstant::String {
                value: Deserialize::deserialize(reader)?,
            },
            RawConstant::FIELD_REF => RawConstant::FieldRef {
                class: Deserialize::deserialize(reader)?,
                name_and_type: Deserialize::deserialize(reader)?,
            },
            RawConstant::METHOD_REF => RawConstant::MethodRef {
                class: Deserialize::deserialize(reader)?,
                name_and_type: Deserialize::deserialize(reader)?,
            },
            RawConstant::INTERFACE_METHOD_REF => RawConstant::InterfaceMethodRef {
                class: Deserialize::deserialize(reader)?,
                name_and_type: Deserialize::deserialize(reader)?,
            },
            RawConstant::NAME_AND_TYPE => RawConstant::NameAndType {
                name: Deserialize::deserialize(reader)?,
                descriptor: Deserialize::deserialize(reader)?,
            },
            RawConstant::METHOD_HANDLE => RawConstant::MethodHandle {
                reference_kind: u8::deserialize(reader)?,
                reference: Deserialize::deserialize(reader)?,
            },
            RawConstant::METHOD_TYPE => RawConstant::MethodType {
                descriptor: Deserialize::deserialize(reader)?,
            },
            RawConstant::INVOKE_DYNAMIC => RawConstant::InvokeDynamic {
                bootstrap_method: u16::deserialize(reader)?,
                name_and_type: Deserialize::deserialize(reader)?,
            },
            RawConstant::DYNAMIC => {
                let _payload = u32::deserialize(reader)?;
                RawConstant::Unsupported(tag)
            }
            RawConstant::MODULE | RawConstant::PACKAGE => {
                let _name = u16::deserialize(reader)?;
                RawConstant::Unsupported(tag)
            }
            other => {
                let msg = format!("Unknown constant pool type {}", other);
                return Err(Error::new(ErrorKind::InvalidData, msg));
            }
        };
        Ok(constant)
    }
}

/// Decode the modified UTF-8 format used in class files
///
/// See [this `DataInput` section for details][0]. Quoting from that section:
///
/// > The differences between this format and the standard UTF-8 format are the following:
/// >
/// >  * The null byte `\u0000` is encoded in 2-byte format rather than 1-byte, so that the encoded
/// >    strings never have embedded nulls.
/// >  * Only the 1-byte, 2-byte, and 3-byte formats are used.
/// >  * Supplementary characters are represented in the form of surrogate pairs.
///
/// Unpaired surrogates cannot be represented in a Rust string, so they are rejected along with
/// any other malformed input.
///
/// [0]: https://docs.oracle.com/en/java/javase/17/docs/api/java.base/java/io/DataInput.html#modified-utf-8
pub fn decode_modified_utf8(bytes: &[u8]) -> Option<String> {
    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b0 = bytes[i] as u16;
        match bytes[i] >> 4 {
            0x0..=0x7 if b0 != 0 => {
                units.push(b0);
                i += 1;
            }
            0xC | 0xD => {
                let b1 = *bytes.get(i + 1)? as u16;
                if b1 & 0xC0 != 0x80 {
                    return None;
                }
                units.push((b0 & 0x1F) << 6 | (b1 & 0x3F));
                i += 2;
            }
            0xE => {
                let b1 = *bytes.get(i + 1)? as u16;
                let b2 = *bytes.get(i + 2)? as u16;
                if b1 & 0xC0 != 0x80 || b2 & 0xC0 != 0x80 {
                    return None;
                }
                units.push((b0 & 0x0F) << 12 | (b1 & 0x3F) << 6 | (b2 & 0x3F));
                i += 3;
            }
            _ => return None,
        }
    }
    String::from_utf16(&units).ok()
}


#[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Debug)]
pub struct ConstantIndex(pub u16);

#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub struct Utf8ConstantIndex(pub ConstantIndex);

#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub struct ClassConstantIndex(pub ConstantIndex);

#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub struct NameAndTypeConstantIndex(pub ConstantIndex);

macro_rules! typed_index {
    ($($name:ident),*) => {
        $(
            impl From<$name> for ConstantIndex {
                fn from(index: $name) -> ConstantIndex {
                    index.0
                }
            }

            impl From<u16> for $name {
                fn from(index: u16) -> $name {
                    $name(ConstantIndex(index))
                }
            }

            impl Deserialize for $name {
                fn deserialize<R: ReadBytesExt>(reader: &mut R) -> Result<Self> {
                    Ok($name(ConstantIndex::deserialize(reader)?))
                }
            }
        )*
    };
}

typed_index!(
    Utf8ConstantIndex,
    ClassConstantIndex,
    NameAndTypeConstantIndex
);

impl From<u16> for ConstantIndex {
    fn from(index: u16) -> ConstantIndex {
        ConstantIndex(index)
    }
}

impl Deserialize for ConstantIndex {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> Result<Self> {
        Ok(ConstantIndex(u16::deserialize(reader)?))
    }
}

/// Type of method handle
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se8/html/jvms-5.html#jvms-5.4.3.5-220
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum HandleKind {
    GetField,
    GetStatic,
    PutField,
    PutStatic,
    InvokeVirtual,
    InvokeStatic,
    InvokeSpecial,
    NewInvokeSpecial,
    InvokeInterface,
}

impl HandleKind {
    pub fn from_u8(kind: u8) -> Option<HandleKind> {
        let kind = match kind {
            1 => HandleKind::GetField,
            2 => HandleKind::GetStatic,
            3 => HandleKind::PutField,
            4 => HandleKind::PutStatic,
            5 => HandleKind::InvokeVirtual,
            6 => HandleKind::InvokeStatic,
            7 => HandleKind::InvokeSpecial,
            8 => HandleKind::NewInvokeSpecial,
            9 => HandleKind::InvokeInterface,
            _ => return None,
        };
        Some(kind)
    }

    /// Does the handle refer to a field (as opposed to a method)?
    pub fn is_field(self) -> bool {
        matches!(
            self,
            HandleKind::GetField | HandleKind::GetStatic | HandleKind::PutField | HandleKind::PutStatic
        )
    }
}
