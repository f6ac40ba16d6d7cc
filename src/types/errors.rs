use std::fmt;

/// Possible errors returned by the constructors and parsers of this crate.
///
/// Lookups never fail: a miss is an empty result, not an error. Invariant
/// violations, e.g. setting a bit outside of a bitmap, panic instead of
/// returning one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FibError {
    /// A name could not be parsed or constructed. The string describes the
    /// offending part.
    InvalidName(String),
    /// A backend configuration holds a value the backend cannot work with,
    /// e.g. a bloom filter with zero bits.
    InvalidConfig(&'static str),
    /// An egress port does not fit into the port range of the backend.
    PortOutOfRange { port: usize, ports: usize },
}

impl std::error::Error for FibError {}

impl fmt::Display for FibError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FibError::InvalidName(reason) => {
                write!(f, "Error: Invalid name: {}.", reason)
            }
            FibError::InvalidConfig(reason) => {
                write!(f, "Error: Invalid configuration: {}.", reason)
            }
            FibError::PortOutOfRange { port, ports } => {
                write!(
                    f,
                    "Error: Egress port {} is out of range, the FIB has {} \
                    ports.",
                    port, ports
                )
            }
        }
    }
}

/// An unrecoverable error, returned when a lock around a FIB was poisoned
/// by a panicking writer. The table should be considered corrupt and the
/// application receiving this error should probably terminate.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FatalError;

impl std::fmt::Display for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Error: A Fatal error has occurred. The FIB must be considered \
             corrupted. The application should terminate."
        )
    }
}

pub type FatalResult<T> = Result<T, FatalError>;

impl std::error::Error for FatalError {}
