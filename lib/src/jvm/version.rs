use std::fmt::{Display, Error as FmtError, Formatter};

/// Version of the class file, which gates the attributes and naming rules that apply
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct Version {
    pub minor_version: u16,
    pub major_version: u16,
}

impl Version {
    /// JDK 1.1, the oldest format this crate accepts
    pub const JAVA1: Version = Version::new(45, 0);

    /// Java SE 5: generic signatures, annotations, unrestricted member names
    pub const JAVA5: Version = Version::new(49, 0);

    /// Java SE 6
    pub const JAVA6: Version = Version::new(50, 0);

    /// Java SE 7: `invokedynamic` and bootstrap methods
    pub const JAVA7: Version = Version::new(51, 0);

    /// Java SE 8: type annotations, method parameters, private interface methods
    pub const JAVA8: Version = Version::new(52, 0);

    pub const fn new(major_version: u16, minor_version: u16) -> Version {
        Version {
            minor_version,
            major_version,
        }
    }

    /// Range of versions this crate can model (inclusive on both ends)
    pub fn is_supported(self) -> bool {
        self >= Version::JAVA1 && self <= Version::JAVA8
    }

    /// Can the class file carry generic signatures, annotations, and unrestricted names?
    pub fn has_java5_features(self) -> bool {
        self.major_version >= 49
    }

    /// Can the class file carry bootstrap methods?
    pub fn has_java7_features(self) -> bool {
        self.major_version >= 51
    }

    /// Can the class file carry type annotations and method parameters?
    pub fn has_java8_features(self) -> bool {
        self.major_version >= 52
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Version) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Version) -> std::cmp::Ordering {
        (self.major_version, self.minor_version).cmp(&(other.major_version, other.minor_version))
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        write!(f, "{}.{}", self.major_version, self.minor_version)
    }
}
