use bitflags::bitflags;

bitflags! {
    /// Access flags on classes
    ///
    /// [0]: https://docs.oracle.com/javase/specs/jvms/se8/html/jvms-4.html#jvms-4.1-200-E.1
    pub struct ClassAccessFlags: u16 {
        const PUBLIC = 0x0001;
        const FINAL = 0x0010;
        const SUPER = 0x0020;
        const INTERFACE = 0x0200;
        const ABSTRACT = 0x0400;
        const SYNTHETIC = 0x1000;
        const ANNOTATION = 0x2000;
        const ENUM = 0x4000;
    }
}

bitflags! {
    /// Access flags on methods
    ///
    /// [0]: https://docs.oracle.com/javase/specs/jvms/se8/html/jvms-4.html#jvms-4.6-200-A.1
    pub struct MethodAccessFlags: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const SYNCHRONIZED = 0x0020;
        const BRIDGE = 0x0040;
        const VARARGS = 0x0080;
        const NATIVE = 0x0100;
        const ABSTRACT = 0x0400;
        const STRICT = 0x0800;
        const SYNTHETIC = 0x1000;
    }
}

bitflags! {
    /// Access flags on fields
    ///
    /// [0]: https://docs.oracle.com/javase/specs/jvms/se8/html/jvms-4.html#jvms-4.5-200-A.1
    pub struct FieldAccessFlags: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const VOLATILE = 0x0040;
        const TRANSIENT = 0x0080;
        const SYNTHETIC = 0x1000;
        const ENUM = 0x4000;
    }
}

bitflags! {
    /// Access flags on inner classes
    ///
    /// [0]: https://docs.oracle.com/javase/specs/jvms/se8/html/jvms-4.html#jvms-4.7.6-300-D.1-D.1
    pub struct InnerClassAccessFlags: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const INTERFACE = 0x0200;
        const ABSTRACT = 0x0400;
        const SYNTHETIC = 0x1000;
        const ANNOTATION = 0x2000;
        const ENUM = 0x4000;
    }
}

impl MethodAccessFlags {
    /// Visibility bits, cleared when a member is marked internal
    pub const VISIBILITY: MethodAccessFlags = MethodAccessFlags::from_bits_truncate(0x0007);
}

impl FieldAccessFlags {
    /// Visibility bits, cleared when a member is marked internal
    pub const VISIBILITY: FieldAccessFlags = FieldAccessFlags::from_bits_truncate(0x0007);
}

/// At most one of `public`, `private`, and `protected` may be set
pub(crate) fn has_conflicting_visibility(bits: u16) -> bool {
    (bits & 0x0007).count_ones() > 1
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn unknown_bits_are_dropped() {
        let flags = ClassAccessFlags::from_bits_truncate(0x8021);
        assert_eq!(flags, ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER);
    }

    #[test]
    fn visibility_conflicts() {
        assert!(!has_conflicting_visibility(0x0001));
        assert!(!has_conflicting_visibility(0x0008));
        assert!(has_conflicting_visibility(0x0003));
        assert!(has_conflicting_visibility(0x0006));
        assert!(has_conflicting_visibility(0x0005));
    }
}
