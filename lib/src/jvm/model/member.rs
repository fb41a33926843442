use crate::jvm::annotations::{read_annotations, Annotation};
use crate::jvm::class_file::{AttributeKind, AttributeReader};
use crate::jvm::class_graph::TypeSystem;
use crate::jvm::pool::ConstantPool;
use crate::jvm::{Diagnostics, Error, ParseOptions, Version};
use crate::util::{Interned, Interner};
use std::collections::HashSet;
use std::hash::Hash;

/// Above this many members, duplicate detection switches from pairwise comparison to hashing
const PAIRWISE_LIMIT: usize = 100;

/// Parts shared by fields and methods
#[derive(Clone, Debug)]
pub struct Member<Flags> {
    pub name: Interned,

    /// Descriptor, with `.` separators
    pub descriptor: Interned,

    pub access_flags: Flags,

    /// Generic signature from the `Signature` attribute
    pub signature: Option<Interned>,

    /// Decoded `RuntimeVisibleAnnotations`
    pub annotations: Vec<Annotation>,

    /// Raw `RuntimeVisibleTypeAnnotations` payload
    pub type_annotations: Option<Vec<u8>>,

    pub is_deprecated: bool,

    /// Marked with `ikvm.lang.Internal` (visibility flags have been cleared)
    pub is_internal: bool,
}

impl<Flags> Member<Flags> {
    pub(super) fn new(name: Interned, descriptor: Interned, access_flags: Flags) -> Member<Flags> {
        Member {
            name,
            descriptor,
            access_flags,
            signature: None,
            annotations: vec![],
            type_annotations: None,
            is_deprecated: false,
            is_internal: false,
        }
    }

    /// Identity of the member within its class
    pub fn key(&self) -> MemberKey {
        MemberKey {
            name: self.name.clone(),
            descriptor: self.descriptor.clone(),
        }
    }

    /// Decode the attributes that mean the same thing on fields and methods
    ///
    /// Returns `false` if the attribute is not one of those.
    pub(super) fn read_common_attribute<T: TypeSystem>(
        &mut self,
        kind: AttributeKind,
        info: &[u8],
        pool: &mut ConstantPool<T>,
    ) -> Result<bool, Error> {
        match kind {
            AttributeKind::Deprecated => {
                if !info.is_empty() {
                    return Err(Error::format("Invalid Deprecated attribute length"));
                }
                self.is_deprecated = true;
            }
            AttributeKind::Signature => {
                self.signature = Some(read_signature(info, pool)?);
            }
            AttributeKind::RuntimeVisibleAnnotations => {
                self.annotations = read_annotations(&mut AttributeReader::new(info), &*pool)?;
            }
            AttributeKind::RuntimeVisibleTypeAnnotations => {
                // Type annotations address UTF-8 text as ordinary constants
                pool.create_utf8_items();
                self.type_annotations = Some(info.to_vec());
            }
            _ => return Ok(false),
        }
        Ok(true)
    }
}

/// Name and descriptor, which must be unique among the fields (or methods) of a class
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MemberKey {
    pub name: Interned,
    pub descriptor: Interned,
}

/// What a member needs to know about the class declaring it
pub(super) struct DeclaringClass<'a> {
    pub name: &'a str,
    pub version: Version,
    pub is_interface: bool,
    pub options: ParseOptions,
    pub interner: &'a mut Interner,
    pub diagnostics: &'a dyn Diagnostics,
}

pub(super) fn read_signature<T: TypeSystem>(info: &[u8], pool: &ConstantPool<T>) -> Result<Interned, Error> {
    if info.len() != 2 {
        return Err(Error::format("Signature attribute has incorrect length"));
    }
    let mut reader = AttributeReader::new(info);
    Ok(pool.utf8(reader.index()?)?.clone())
}

/// Check if any two keys are equal
///
/// Small inputs are compared pairwise, larger ones go through a hash set.
pub fn has_duplicates<K: Eq + Hash>(keys: &[K]) -> bool {
    if keys.len() < PAIRWISE_LIMIT {
        has_duplicates_pairwise(keys)
    } else {
        has_duplicates_hashed(keys)
    }
}

pub fn has_duplicates_pairwise<K: Eq>(keys: &[K]) -> bool {
    keys.iter()
        .enumerate()
        .any(|(i, key)| keys[i + 1..].contains(key))
}

pub fn has_duplicates_hashed<K: Eq + Hash>(keys: &[K]) -> bool {
    let mut seen = HashSet::with_capacity(keys.len());
    !keys.iter().all(|key| seen.insert(key))
}
