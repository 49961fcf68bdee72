use std::fmt;

/// Reasons a class could not be resolved
///
/// The verifier never propagates these: a class that fails to resolve is modelled as an
/// unresolved type instead. They are still kept around for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// The descriptor could not even be parsed
    BadDescriptor { descriptor: String, reason: String },

    /// No class loader in the delegation chain defines the class
    ClassNotFound(String),

    /// The class is defined, but linking it (or one of its super types) failed
    NoClassDefFound(String),

    /// An array class with this component could not be created
    NoArrayClass(String),
}

impl fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionError::BadDescriptor { descriptor, reason } => {
                write!(f, "Bad descriptor '{}': {}", descriptor, reason)
            }
            ResolutionError::ClassNotFound(descriptor) => {
                write!(f, "Class not found: {}", descriptor)
            }
            ResolutionError::NoClassDefFound(descriptor) => {
                write!(f, "Class failed to link: {}", descriptor)
            }
            ResolutionError::NoArrayClass(descriptor) => {
                write!(f, "Cannot create array of {}", descriptor)
            }
        }
    }
}

impl std::error::Error for ResolutionError {}
