use bitflags::bitflags;

bitflags! {
    /// Knobs controlling how much of a class file gets decoded and which rules apply
    pub struct ParseOptions: u32 {
        /// Decode `LocalVariableTable` attributes inside `Code`
        const LOCAL_VARIABLE_TABLE = 0x0001;

        /// Decode `LineNumberTable` attributes inside `Code`
        const LINE_NUMBER_TABLE = 0x0002;

        /// Rewrite the `$assertionsDisabled` initialization out of static initializers
        const REMOVE_ASSERTIONS = 0x0004;

        /// Honour the JDK-internal marker annotations (`CallerSensitive`, `ForceInline`, ...)
        const TRUSTED_ANNOTATIONS = 0x0008;

        /// Skip the strict identifier rules for class names in pre-49 class files
        const RELAXED_CLASS_NAME_VALIDATION = 0x0010;

        /// The model is being built for the ahead-of-time compiler rather than the runtime
        const STATIC_COMPILER = 0x0020;
    }
}

impl ParseOptions {
    pub const DEBUG_TABLES: ParseOptions = ParseOptions::from_bits_truncate(0x0003);
}

impl Default for ParseOptions {
    fn default() -> ParseOptions {
        ParseOptions::empty()
    }
}

/// How eagerly the host type system should load classes referenced during linking
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LoadMode {
    /// Load the class, falling back to an unloadable placeholder on failure
    Link,

    /// Only return classes that have already been loaded
    ReturnUnloadable,

    /// Load the class and warn about failures
    LoadOrWarn,
}

impl Default for LoadMode {
    fn default() -> LoadMode {
        LoadMode::Link
    }
}
