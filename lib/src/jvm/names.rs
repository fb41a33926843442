use super::{is_valid_field_descriptor, ParseOptions, Version};

/// Instance initialization method name
pub const INIT: &str = "<init>";

/// Class initialization method name
pub const CLINIT: &str = "<clinit>";

/// Binary names (with `.` separators, as they appear in the model) of the classes the model
/// refers to by name
pub mod well_known {
    pub const OBJECT: &str = "java.lang.Object";
    pub const CLASS: &str = "java.lang.Class";
    pub const STRING: &str = "java.lang.String";
    pub const CLONEABLE: &str = "java.lang.Cloneable";
    pub const SERIALIZABLE: &str = "java.io.Serializable";
    pub const THROWABLE: &str = "java.lang.Throwable";
}

const FORBIDDEN_IN_FIELD_NAMES: &[char] = &['.', ';', '[', '/'];
const FORBIDDEN_IN_METHOD_NAMES: &[char] = &['.', ';', '[', '/', '<', '>'];

/// Check if a string is a valid unqualified field name for the given class file version
///
/// See <https://docs.oracle.com/javase/specs/jvms/se8/html/jvms-4.html#jvms-4.2.2>. Before
/// version 49, names must also be Java identifiers.
pub fn is_valid_field_name(name: &str, version: Version) -> bool {
    !name.is_empty()
        && !name.contains(FORBIDDEN_IN_FIELD_NAMES)
        && (version.has_java5_features() || is_valid_pre49_identifier(name))
}

/// Check if a string is a valid unqualified method name for the given class file version
///
/// The special `<init>` and `<clinit>` names are _not_ considered valid here. Callers are
/// expected to carve those out explicitly.
pub fn is_valid_method_name(name: &str, version: Version) -> bool {
    !name.is_empty()
        && !name.contains(FORBIDDEN_IN_METHOD_NAMES)
        && (version.has_java5_features() || is_valid_pre49_identifier(name))
}

fn is_valid_pre49_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '$' || c == '_' => (),
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '$' || c == '_')
}

/// Check if a string from a `CONSTANT_Class` entry is a valid class name
///
/// Array classes are named by their field descriptor (eg. `[Ljava/lang/String;`). For class
/// files before version 49, the segments of the name must be identifiers unless relaxed
/// validation has been requested. From version 49 onwards, the only restriction is on the
/// characters that would be ambiguous in a binary name.
pub fn is_valid_class_name(name: &str, version: Version, options: ParseOptions) -> bool {
    let chars: Vec<char> = name.chars().collect();
    let first = match chars.first() {
        Some(first) => *first,
        None => return false,
    };
    let strict = !version.has_java5_features()
        && !options.contains(ParseOptions::RELAXED_CLASS_NAME_VALIDATION);
    if strict && !(first.is_alphabetic() || first == '$' || first == '_' || first == '[' || first == '/')
    {
        return false;
    }

    // Array names are checked as descriptors, then only the element class name is scanned
    let mut start = 0;
    let mut end = chars.len();
    if first == '[' {
        if !is_valid_field_descriptor(name) {
            return false;
        }
        while chars[start] == '[' {
            start += 1;
        }
        if name.ends_with(';') {
            start += 1;
            end -= 1;
        }
    } else if strict {
        start = 1;
    }

    let mut prev = if start == 0 { '\0' } else { chars[start - 1] };
    for &c in chars.iter().take(end).skip(start) {
        let valid = if strict {
            c.is_alphanumeric() || c == '$' || c == '_' || (c == '/' && prev != '/')
        } else {
            c != '.' && c != ';' && c != '[' && !(c == '/' && prev == '/')
        };
        if !valid {
            return false;
        }
        prev = c;
    }
    true
}

/// Replace the internal `/` package separator with `.`
pub fn to_dotted(name: &str) -> String {
    name.replace('/', ".")
}

#[cfg(test)]
mod test {
    use super::*;

    const OLD: Version = Version::new(48, 0);
    const NEW: Version = Version::JAVA5;

    #[test]
    fn field_names() {
        assert!(is_valid_field_name("count", OLD));
        assert!(is_valid_field_name("$assertionsDisabled", OLD));
        assert!(!is_valid_field_name("", NEW));
        assert!(!is_valid_field_name("a.b", NEW));
        assert!(!is_valid_field_name("a;", NEW));
        assert!(!is_valid_field_name("[a", NEW));
        assert!(!is_valid_field_name("a/b", NEW));

        // Only identifiers before Java 5
        assert!(!is_valid_field_name("1abc", OLD));
        assert!(is_valid_field_name("1abc", NEW));
        assert!(!is_valid_field_name("a-b", OLD));
        assert!(is_valid_field_name("a-b", NEW));
        assert!(is_valid_field_name("<a>", NEW));
    }

    #[test]
    fn method_names() {
        assert!(is_valid_method_name("run", OLD));
        assert!(!is_valid_method_name(INIT, NEW));
        assert!(!is_valid_method_name(CLINIT, OLD));
        assert!(!is_valid_method_name("a>b", NEW));
        assert!(is_valid_method_name("a-b", NEW));
        assert!(!is_valid_method_name("a-b", OLD));
    }

    #[test]
    fn class_names() {
        let opts = ParseOptions::empty();
        assert!(is_valid_class_name("java/lang/Object", OLD, opts));
        assert!(is_valid_class_name("Foo$1", OLD, opts));
        assert!(is_valid_class_name("[I", OLD, opts));
        assert!(is_valid_class_name("[[Ljava/lang/String;", NEW, opts));
        assert!(!is_valid_class_name("", NEW, opts));
        assert!(!is_valid_class_name("[", NEW, opts));
        assert!(!is_valid_class_name("[Lfoo", NEW, opts));
        assert!(!is_valid_class_name("java//Object", NEW, opts));
        assert!(!is_valid_class_name("java.lang.Object", NEW, opts));
        assert!(!is_valid_class_name("1Foo", OLD, opts));
        assert!(is_valid_class_name("1Foo", NEW, opts));

        // Identifier segments are only required for old class files
        assert!(!is_valid_class_name("foo/b-r", OLD, opts));
        assert!(is_valid_class_name("foo/b-r", NEW, opts));
        assert!(is_valid_class_name(
            "foo/b-r",
            OLD,
            ParseOptions::RELAXED_CLASS_NAME_VALIDATION
        ));
    }
}
