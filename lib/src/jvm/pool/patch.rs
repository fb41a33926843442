use super::LiveObject;
use crate::jvm::class_graph::TypeSystem;
use std::fmt::{Debug, Error as FmtError, Formatter};

/// Replacement value for one constant pool slot
///
/// Patches are how a host defines anonymous classes out of a template class file. Each kind of
/// patch only fits certain kinds of slot:
///
///   - [`Patch::Text`] replaces a UTF-8 entry, renames a class, or becomes a live object in a
///     string slot
///   - [`Patch::Type`] binds a class entry to an existing host type
///   - the numeric patches replace numeric constants of the same kind
///   - [`Patch::Object`] turns a string slot into a live object
pub enum Patch<T: TypeSystem> {
    Text(String),
    Type(T::Type),
    Integer(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Object(LiveObject),
}

impl<T: TypeSystem> Debug for Patch<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        match self {
            Patch::Text(text) => write!(f, "Text({:?})", text),
            Patch::Type(ty) => write!(f, "Type({:?})", ty),
            Patch::Integer(value) => write!(f, "Integer({})", value),
            Patch::Long(value) => write!(f, "Long({})", value),
            Patch::Float(value) => write!(f, "Float({})", value),
            Patch::Double(value) => write!(f, "Double({})", value),
            Patch::Object(_) => f.write_str("Object"),
        }
    }
}
