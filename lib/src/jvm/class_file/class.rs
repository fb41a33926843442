use super::{Attribute, ClassConstantIndex, RawConstant, Utf8ConstantIndex};
use crate::jvm::binary_format::Deserialize;
use crate::jvm::Version;
use byteorder::ReadBytesExt;
use std::fmt::{Display, Error as FmtError, Formatter};
use std::io::{Cursor, ErrorKind};

/// Representation of the [`class` file format of the JVM][0]
///
/// This is the raw record the class model is built from: indices are still just numbers and
/// attributes are still uninterpreted byte blobs.
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se8/html/jvms-4.html
#[derive(Debug, Clone, PartialEq)]
pub struct ClassFile {
    pub version: Version,

    /// Constant pool slots, indexed the same way as in the class file
    ///
    /// Slot 0 is always empty, and so is the slot following a `long` or `double` constant.
    pub constants: Vec<Option<RawConstant>>,

    pub access_flags: u16,
    pub this_class: ClassConstantIndex,

    /// Index `0` means there is no superclass
    pub super_class: ClassConstantIndex,
    pub interfaces: Vec<ClassConstantIndex>,
    pub fields: Vec<MemberInfo>,
    pub methods: Vec<MemberInfo>,
    pub attributes: Vec<Attribute>,
}

/// Field or method, as it appears in the class file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    pub access_flags: u16,
    pub name_index: Utf8ConstantIndex,
    pub descriptor_index: Utf8ConstantIndex,
    pub attributes: Vec<Attribute>,
}

impl Deserialize for MemberInfo {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> std::io::Result<Self> {
        Ok(MemberInfo {
            access_flags: u16::deserialize(reader)?,
            name_index: Deserialize::deserialize(reader)?,
            descriptor_index: Deserialize::deserialize(reader)?,
            attributes: Deserialize::deserialize(reader)?,
        })
    }
}

/// Failure to read the raw structure of a class file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    BadMagic(u32),
    Truncated,
    Malformed(String),
    TrailingBytes(usize),
}

impl Display for ReadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        match self {
            ReadError::BadMagic(magic) => write!(f, "Bad magic number {:#010X}", magic),
            ReadError::Truncated => f.write_str("Truncated class file"),
            ReadError::Malformed(msg) => f.write_str(msg),
            ReadError::TrailingBytes(count) => {
                write!(f, "Extra bytes at the end of class file ({} bytes)", count)
            }
        }
    }
}

impl std::error::Error for ReadError {}

impl From<std::io::Error> for ReadError {
    fn from(err: std::io::Error) -> ReadError {
        match err.kind() {
            ErrorKind::UnexpectedEof => ReadError::Truncated,
            _ => ReadError::Malformed(err.to_string()),
        }
    }
}

/// Every class file format error is also a class model format error
impl From<ReadError> for crate::jvm::Error {
    fn from(err: ReadError) -> crate::jvm::Error {
        crate::jvm::Error::format(err.to_string())
    }
}

impl ClassFile {
    /// Magic header bytes that go at the front of the class file
    pub const MAGIC: u32 = 0xCAFEBABE;

    /// Parse a complete class file
    pub fn parse(bytes: &[u8]) -> Result<ClassFile, ReadError> {
        let mut reader = Cursor::new(bytes);

        let magic = u32::deserialize(&mut reader)?;
        if magic != ClassFile::MAGIC {
            return Err(ReadError::BadMagic(magic));
        }
        let minor_version = u16::deserialize(&mut reader)?;
        let major_version = u16::deserialize(&mut reader)?;

        let constant_pool_count = u16::deserialize(&mut reader)?;
        let mut constants: Vec<Option<RawConstant>> = vec![None];
        while constants.len() < constant_pool_count as usize {
            let constant = RawConstant::deserialize(&mut reader)?;
            let width = constant.width();
            constants.push(Some(constant));
            if width == 2 {
                constants.push(None);
            }
        }
        if constants.len() > constant_pool_count.max(1) as usize {
            return Err(ReadError::Malformed(String::from(
                "Wide constant at the end of the constant pool",
            )));
        }

        let class_file = ClassFile {
            version: Version::new(major_version, minor_version),
            constants,
            access_flags: u16::deserialize(&mut reader)?,
            this_class: Deserialize::deserialize(&mut reader)?,
            super_class: Deserialize::deserialize(&mut reader)?,
            interfaces: Deserialize::deserialize(&mut reader)?,
            fields: Deserialize::deserialize(&mut reader)?,
            methods: Deserialize::deserialize(&mut reader)?,
            attributes: Deserialize::deserialize(&mut reader)?,
        };

        let leftover = bytes.len() - reader.position() as usize;
        if leftover != 0 {
            return Err(ReadError::TrailingBytes(leftover));
        }

        log::trace!(
            "Read class file version {} with {} constant pool slots",
            class_file.version,
            class_file.constants.len()
        );
        Ok(class_file)
    }
}
