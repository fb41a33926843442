use parking_lot::Mutex;
use std::fmt::{Display, Error as FmtError, Formatter};

/// Non-fatal problem noticed while building or linking a class model
///
/// The offending construct is ignored; the class itself still loads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A second `ikvm.lang.Property` annotation on the same field
    DuplicatePropertyAnnotation { class: String, member: String },

    /// An `ikvm.lang.Property` annotation without a usable getter/setter pair
    MalformedPropertyAnnotation { class: String, member: String },

    /// `ikvm.lang.Internal` is not allowed on interface methods
    InternalOnInterfaceMethod { class: String, member: String },

    /// `ikvm.lang.ModuleInitializer` on a method that cannot be one
    MalformedModuleInitializer { class: String, member: String },

    /// `ikvm.lang.InterlockedCompareAndSet` on a non-static method, or without a field name
    MalformedInterlockedCompareAndSet { class: String, member: String },

    /// A referenced class could not be loaded while linking
    ClassLoadingError(String),
}

impl Display for Warning {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        match self {
            Warning::DuplicatePropertyAnnotation { class, member } => write!(
                f,
                "Ignoring duplicate ikvm.lang.Property annotation on {}.{}",
                class, member
            ),
            Warning::MalformedPropertyAnnotation { class, member } => write!(
                f,
                "Ignoring malformed ikvm.lang.Property annotation on {}.{}",
                class, member
            ),
            Warning::InternalOnInterfaceMethod { class, member } => write!(
                f,
                "ikvm.lang.Internal is not supported on interface method {}.{}",
                class, member
            ),
            Warning::MalformedModuleInitializer { class, member } => write!(
                f,
                "Ignoring ikvm.lang.ModuleInitializer on {}.{}",
                class, member
            ),
            Warning::MalformedInterlockedCompareAndSet { class, member } => write!(
                f,
                "Ignoring InterlockedCompareAndSet annotation on {}.{}",
                class, member
            ),
            Warning::ClassLoadingError(message) => f.write_str(message),
        }
    }
}

/// Sink for non-fatal warnings
pub trait Diagnostics: Sync {
    fn warn(&self, warning: Warning);
}

/// Forward warnings to the `log` facade
#[derive(Copy, Clone, Debug, Default)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn warn(&self, warning: Warning) {
        log::warn!("{}", warning);
    }
}

/// Keep warnings around so they can be inspected later
#[derive(Debug, Default)]
pub struct CollectingDiagnostics {
    warnings: Mutex<Vec<Warning>>,
}

impl CollectingDiagnostics {
    pub fn new() -> CollectingDiagnostics {
        CollectingDiagnostics::default()
    }

    /// Snapshot of the warnings reported so far
    pub fn warnings(&self) -> Vec<Warning> {
        self.warnings.lock().clone()
    }
}

impl Diagnostics for CollectingDiagnostics {
    fn warn(&self, warning: Warning) {
        log::debug!("{}", warning);
        self.warnings.lock().push(warning);
    }
}
