//! Decoded annotation trees
//!
//! See [JVMS 4.7.16][0] for the format. Annotations are decoded eagerly while building the class
//! model, but a bad constant referenced from inside an element value does not fail the class: the
//! element becomes an [`ElementValue::Error`] instead, mirroring what reflection reports for it.
//!
//! [0]: https://docs.oracle.com/javase/specs/jvms/se8/html/jvms-4.html#jvms-4.7.16

use super::class_file::{AttributeReader, ConstantIndex};
use super::Error;

/// Marker annotations the class model reacts to
pub mod markers {
    pub const INTERNAL: &str = "Likvm/lang/Internal;";
    pub const PROPERTY: &str = "Likvm/lang/Property;";
    pub const INTERLOCKED_COMPARE_AND_SET: &str = "Likvm/lang/InterlockedCompareAndSet;";
    pub const MODULE_INITIALIZER: &str = "Likvm/lang/ModuleInitializer;";
    pub const CALLER_SENSITIVE: &str = "Lsun/reflect/CallerSensitive;";
    pub const LAMBDA_FORM_COMPILED: &str = "Ljava/lang/invoke/LambdaForm$Compiled;";
    pub const LAMBDA_FORM_HIDDEN: &str = "Ljava/lang/invoke/LambdaForm$Hidden;";
    pub const FORCE_INLINE: &str = "Ljava/lang/invoke/ForceInline;";
}

/// Annotation with its element/value pairs
#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
    /// Field descriptor of the annotation type (eg. `Ljava/lang/Deprecated;`)
    pub type_name: String,

    pub elements: Vec<(String, ElementValue)>,
}

impl Annotation {
    /// Value of the first element with the given name
    pub fn element(&self, name: &str) -> Option<&ElementValue> {
        self.elements
            .iter()
            .find(|(element_name, _)| element_name == name)
            .map(|(_, value)| value)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ElementValue {
    Boolean(bool),
    Byte(i8),
    Char(u16),
    Short(i16),
    Int(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    String(String),
    Enum {
        type_name: String,
        const_name: String,
    },
    /// Return descriptor of the class (`V` for `void.class`)
    Class(String),
    Annotation(Box<Annotation>),
    Array(Vec<ElementValue>),

    /// Element whose constant could not be read
    Error { exception: String, message: String },
}

impl ElementValue {
    fn wrong_constant_type() -> ElementValue {
        ElementValue::Error {
            exception: String::from("java.lang.IllegalArgumentException"),
            message: String::from("Wrong type at constant pool index"),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ElementValue::String(value) => Some(value),
            _ => None,
        }
    }
}

/// Constant pool lookups needed to decode annotations
///
/// Lookups return `None` when the index is out of range or points at a constant of the wrong
/// kind.
pub trait AnnotationConstants {
    fn utf8_at(&self, index: ConstantIndex) -> Option<&str>;
    fn int_at(&self, index: ConstantIndex) -> Option<i32>;
    fn long_at(&self, index: ConstantIndex) -> Option<i64>;
    fn float_at(&self, index: ConstantIndex) -> Option<f32>;
    fn double_at(&self, index: ConstantIndex) -> Option<f64>;
}

fn utf8<C: AnnotationConstants + ?Sized>(constants: &C, index: ConstantIndex) -> Result<String, Error> {
    constants
        .utf8_at(index)
        .map(String::from)
        .ok_or_else(|| Error::format(format!("Bad constant pool index #{}", index.0)))
}

/// Read an attribute payload made of a `u16` count followed by that many annotations
pub fn read_annotations<C: AnnotationConstants + ?Sized>(
    reader: &mut AttributeReader,
    constants: &C,
) -> Result<Vec<Annotation>, Error> {
    let count = reader.u16()?;
    let mut annotations = Vec::with_capacity(count as usize);
    for _ in 0..count {
        annotations.push(read_annotation(reader, constants)?);
    }
    Ok(annotations)
}

/// Read a `RuntimeVisibleParameterAnnotations` payload
///
/// Unlike most tables, the parameter count is a single byte.
pub fn read_parameter_annotations<C: AnnotationConstants + ?Sized>(
    reader: &mut AttributeReader,
    constants: &C,
) -> Result<Vec<Vec<Annotation>>, Error> {
    let num_parameters = reader.u8()?;
    let mut parameters = Vec::with_capacity(num_parameters as usize);
    for _ in 0..num_parameters {
        parameters.push(read_annotations(reader, constants)?);
    }
    Ok(parameters)
}

pub fn read_annotation<C: AnnotationConstants + ?Sized>(
    reader: &mut AttributeReader,
    constants: &C,
) -> Result<Annotation, Error> {
    let type_name = utf8(constants, reader.index()?)?;
    let num_pairs = reader.u16()?;
    let mut elements = Vec::with_capacity(num_pairs as usize);
    for _ in 0..num_pairs {
        let name = utf8(constants, reader.index()?)?;
        let value = read_element_value(reader, constants)?;
        elements.push((name, value));
    }
    Ok(Annotation {
        type_name,
        elements,
    })
}

/// Read one `element_value`
///
/// Truncation and unknown tags are fatal. Constants of the wrong kind are not.
pub fn read_element_value<C: AnnotationConstants + ?Sized>(
    reader: &mut AttributeReader,
    constants: &C,
) -> Result<ElementValue, Error> {
    let tag = reader.u8()?;
    let value = match tag {
        b'B' | b'C' | b'S' | b'Z' | b'I' => {
            let index = reader.index()?;
            constants.int_at(index).map(|int| match tag {
                b'B' => ElementValue::Byte(int as i8),
                b'C' => ElementValue::Char(int as u16),
                b'S' => ElementValue::Short(int as i16),
                b'Z' => ElementValue::Boolean(int != 0),
                _ => ElementValue::Int(int),
            })
        }
        b'J' => constants.long_at(reader.index()?).map(ElementValue::Long),
        b'F' => constants.float_at(reader.index()?).map(ElementValue::Float),
        b'D' => constants.double_at(reader.index()?).map(ElementValue::Double),
        b's' => constants
            .utf8_at(reader.index()?)
            .map(|s| ElementValue::String(s.to_owned())),
        b'e' => {
            let type_name = constants.utf8_at(reader.index()?).map(String::from);
            let const_name = constants.utf8_at(reader.index()?).map(String::from);
            type_name
                .zip(const_name)
                .map(|(type_name, const_name)| ElementValue::Enum {
                    type_name,
                    const_name,
                })
        }
        b'c' => constants
            .utf8_at(reader.index()?)
            .map(|s| ElementValue::Class(s.to_owned())),
        b'@' => Some(ElementValue::Annotation(Box::new(read_annotation(
            reader, constants,
        )?))),
        b'[' => {
            let num_values = reader.u16()?;
            let mut values = Vec::with_capacity(num_values as usize);
            for _ in 0..num_values {
                values.push(read_element_value(reader, constants)?);
            }
            Some(ElementValue::Array(values))
        }
        other => {
            return Err(Error::format(format!(
                "Invalid tag {} in annotation element_value",
                other
            )))
        }
    };
    Ok(value.unwrap_or_else(ElementValue::wrong_constant_type))
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct Constants {
        utf8: HashMap<u16, &'static str>,
        ints: HashMap<u16, i32>,
    }

    impl AnnotationConstants for Constants {
        fn utf8_at(&self, index: ConstantIndex) -> Option<&str> {
            self.utf8.get(&index.0).copied()
        }
        fn int_at(&self, index: ConstantIndex) -> Option<i32> {
            self.ints.get(&index.0).copied()
        }
        fn long_at(&self, _index: ConstantIndex) -> Option<i64> {
            None
        }
        fn float_at(&self, _index: ConstantIndex) -> Option<f32> {
            None
        }
        fn double_at(&self, _index: ConstantIndex) -> Option<f64> {
            None
        }
    }

    fn constants() -> Constants {
        let mut constants = Constants::default();
        constants.utf8.insert(1, "Likvm/lang/Property;");
        constants.utf8.insert(2, "get");
        constants.utf8.insert(3, "getFoo");
        constants.utf8.insert(4, "flag");
        constants.ints.insert(5, 1);
        constants
    }

    #[test]
    fn property_annotation() {
        let payload = [
            0, 1, // one annotation
            0, 1, // type
            0, 2, // two pairs
            0, 2, b's', 0, 3, // get = "getFoo"
            0, 4, b'Z', 0, 5, // flag = true
        ];
        let mut reader = AttributeReader::new(&payload);
        let annotations = read_annotations(&mut reader, &constants()).unwrap();
        assert!(reader.is_at_end());
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].type_name, markers::PROPERTY);
        assert_eq!(
            annotations[0].element("get"),
            Some(&ElementValue::String(String::from("getFoo")))
        );
        assert_eq!(annotations[0].element("flag"), Some(&ElementValue::Boolean(true)));
    }

    #[test]
    fn wrong_constant_is_recoverable() {
        // `I` pointing at a UTF-8 constant, then an array holding a long with a bad index
        let payload = [b'I', 0, 3];
        let value = read_element_value(&mut AttributeReader::new(&payload), &constants()).unwrap();
        assert_eq!(value, ElementValue::wrong_constant_type());

        let payload = [b'[', 0, 1, b'J', 0, 99];
        let value = read_element_value(&mut AttributeReader::new(&payload), &constants()).unwrap();
        assert_eq!(
            value,
            ElementValue::Array(vec![ElementValue::wrong_constant_type()])
        );
    }

    #[test]
    fn fatal_failures() {
        let bad_tag = [b'x', 0, 1];
        assert!(read_element_value(&mut AttributeReader::new(&bad_tag), &constants()).is_err());

        let truncated = [b'I', 0];
        assert!(read_element_value(&mut AttributeReader::new(&truncated), &constants()).is_err());

        // Annotation type names must be readable
        let bad_type = [0, 9, 0, 0];
        assert!(read_annotation(&mut AttributeReader::new(&bad_type), &constants()).is_err());
    }

    #[test]
    fn parameter_annotations() {
        let payload = [2, 0, 0, 0, 1, 0, 1, 0, 0];
        let mut reader = AttributeReader::new(&payload);
        let parameters = read_parameter_annotations(&mut reader, &constants()).unwrap();
        assert!(reader.is_at_end());
        assert_eq!(parameters.len(), 2);
        assert!(parameters[0].is_empty());
        assert_eq!(parameters[1][0].type_name, markers::PROPERTY);
    }
}
