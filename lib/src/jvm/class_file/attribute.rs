use super::{ConstantIndex, Utf8ConstantIndex};
use crate::jvm::binary_format::{read_bytes, Deserialize};
use crate::jvm::{Error, Version};
use byteorder::ReadBytesExt;
use std::io::{Cursor, Result as IoResult};

/// Attributes (used in classes, fields, methods, and even on some attributes)
///
/// The payload is kept as raw bytes. Interpreting it requires the constant pool, so that happens
/// while building the class model.
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se8/html/jvms-4.html#jvms-4.7
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name_index: Utf8ConstantIndex,
    pub info: Vec<u8>,
}

impl Deserialize for Attribute {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> IoResult<Self> {
        let name_index = Utf8ConstantIndex::deserialize(reader)?;

        // Attribute info length is 4 bytes
        let len = u32::deserialize(reader)?;
        let info = read_bytes(reader, len as usize)?;

        Ok(Attribute { name_index, info })
    }
}

/// Attributes the model knows how to interpret
///
/// Classification happens _before_ dispatch and takes the class file version into account: an
/// attribute that is only defined from some version onwards is classified as
/// [`AttributeKind::Unknown`] (and so skipped) in older class files.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    AnnotationDefault,
    BootstrapMethods,
    Code,
    ConstantValue,
    Deprecated,
    EnclosingMethod,
    Exceptions,
    IkvmAssembly,
    InnerClasses,
    LineNumberTable,
    LocalVariableTable,
    MethodParameters,
    RuntimeInvisibleAnnotations,
    RuntimeVisibleAnnotations,
    RuntimeVisibleParameterAnnotations,
    RuntimeVisibleTypeAnnotations,
    Signature,
    SourceFile,
    Unknown,
}

impl AttributeKind {
    pub fn from_name(name: &str) -> AttributeKind {
        match name {
            "AnnotationDefault" => AttributeKind::AnnotationDefault,
            "BootstrapMethods" => AttributeKind::BootstrapMethods,
            "Code" => AttributeKind::Code,
            "ConstantValue" => AttributeKind::ConstantValue,
            "Deprecated" => AttributeKind::Deprecated,
            "EnclosingMethod" => AttributeKind::EnclosingMethod,
            "Exceptions" => AttributeKind::Exceptions,
            "IKVM.NET.Assembly" => AttributeKind::IkvmAssembly,
            "InnerClasses" => AttributeKind::InnerClasses,
            "LineNumberTable" => AttributeKind::LineNumberTable,
            "LocalVariableTable" => AttributeKind::LocalVariableTable,
            "MethodParameters" => AttributeKind::MethodParameters,
            "RuntimeInvisibleAnnotations" => AttributeKind::RuntimeInvisibleAnnotations,
            "RuntimeVisibleAnnotations" => AttributeKind::RuntimeVisibleAnnotations,
            "RuntimeVisibleParameterAnnotations" => {
                AttributeKind::RuntimeVisibleParameterAnnotations
            }
            "RuntimeVisibleTypeAnnotations" => AttributeKind::RuntimeVisibleTypeAnnotations,
            "Signature" => AttributeKind::Signature,
            "SourceFile" => AttributeKind::SourceFile,
            _ => AttributeKind::Unknown,
        }
    }

    /// Is this attribute defined in a class file of the given version?
    pub fn is_defined_in(self, version: Version) -> bool {
        match self {
            AttributeKind::AnnotationDefault
            | AttributeKind::EnclosingMethod
            | AttributeKind::RuntimeInvisibleAnnotations
            | AttributeKind::RuntimeVisibleAnnotations
            | AttributeKind::RuntimeVisibleParameterAnnotations
            | AttributeKind::Signature => version.has_java5_features(),
            AttributeKind::BootstrapMethods => version.has_java7_features(),
            AttributeKind::MethodParameters | AttributeKind::RuntimeVisibleTypeAnnotations => {
                version.has_java8_features()
            }
            _ => true,
        }
    }

    /// Classify an attribute name, taking version gating into account
    pub fn classify(name: &str, version: Version) -> AttributeKind {
        let kind = AttributeKind::from_name(name);
        if kind.is_defined_in(version) {
            kind
        } else {
            log::trace!("Ignoring {} attribute in version {} class file", name, version);
            AttributeKind::Unknown
        }
    }
}

/// Cursor over the payload of an attribute
///
/// Reads past the end of the payload surface as a truncated class file error.
pub struct AttributeReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> AttributeReader<'a> {
    pub fn new(info: &'a [u8]) -> AttributeReader<'a> {
        AttributeReader {
            cursor: Cursor::new(info),
        }
    }

    pub fn u8(&mut self) -> Result<u8, Error> {
        Ok(u8::deserialize(&mut self.cursor)?)
    }

    pub fn u16(&mut self) -> Result<u16, Error> {
        Ok(u16::deserialize(&mut self.cursor)?)
    }

    pub fn u32(&mut self) -> Result<u32, Error> {
        Ok(u32::deserialize(&mut self.cursor)?)
    }

    pub fn index(&mut self) -> Result<ConstantIndex, Error> {
        Ok(ConstantIndex::deserialize(&mut self.cursor)?)
    }

    /// Borrow the next `len` bytes of the payload
    pub fn bytes(&mut self, len: usize) -> Result<&'a [u8], Error> {
        let start = self.cursor.position() as usize;
        let info: &'a [u8] = *self.cursor.get_ref();
        let end = start
            .checked_add(len)
            .filter(|end| *end <= info.len())
            .ok_or_else(|| Error::format("Truncated class file"))?;
        self.cursor.set_position(end as u64);
        Ok(&info[start..end])
    }

    /// Parse a nested attribute
    pub fn attribute(&mut self) -> Result<Attribute, Error> {
        Ok(Attribute::deserialize(&mut self.cursor)?)
    }

    /// Number of bytes consumed so far
    pub fn position(&self) -> usize {
        self.cursor.position() as usize
    }

    pub fn is_at_end(&self) -> bool {
        self.position() >= self.cursor.get_ref().len()
    }

    /// Fail with a "wrong length" error if there are leftover bytes
    pub fn expect_end(&self, attribute_name: &str) -> Result<(), Error> {
        if self.is_at_end() {
            Ok(())
        } else {
            Err(Error::format(format!(
                "{} attribute has wrong length",
                attribute_name
            )))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn version_gating() {
        let old = Version::new(48, 0);
        assert_eq!(AttributeKind::classify("Signature", old), AttributeKind::Unknown);
        assert_eq!(
            AttributeKind::classify("Signature", Version::JAVA5),
            AttributeKind::Signature
        );
        assert_eq!(
            AttributeKind::classify("BootstrapMethods", Version::JAVA6),
            AttributeKind::Unknown
        );
        assert_eq!(
            AttributeKind::classify("RuntimeVisibleTypeAnnotations", Version::JAVA7),
            AttributeKind::Unknown
        );
        assert_eq!(AttributeKind::classify("Code", old), AttributeKind::Code);
        assert_eq!(AttributeKind::classify("Foo", Version::JAVA8), AttributeKind::Unknown);
    }

    #[test]
    fn reader_truncation() {
        let mut reader = AttributeReader::new(&[0, 1, 2]);
        assert_eq!(reader.u16().unwrap(), 1);
        assert!(!reader.is_at_end());
        assert_eq!(reader.u16(), Err(Error::format("Truncated class file")));
    }

    #[test]
    fn reader_length_check() {
        let mut reader = AttributeReader::new(&[0, 7, 9]);
        reader.u16().unwrap();
        assert!(reader.expect_end("SourceFile").is_err());
        reader.u8().unwrap();
        assert!(reader.expect_end("SourceFile").is_ok());
    }
}
