//! Class-file format errors.

/// Structural problems found while parsing or re-emitting a class file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassFormatError {
    /// The stream does not start with `0xCAFEBABE`.
    BadMagic(u32),

    /// Major/minor version outside the range this codec understands.
    UnsupportedVersion { major: u16, minor: u16 },

    /// Ran out of bytes.
    Truncated {
        /// Offset of the read that failed
        offset: usize,
        /// Bytes the read needed
        needed: usize,
        /// Total length of the buffer being read
        available: usize,
    },

    /// A constant pool entry carries an unknown tag byte.
    InvalidConstantTag { index: u16, tag: u8 },

    /// A pool index points outside the pool or at an entry of the wrong kind.
    InvalidConstantIndex {
        index: u16,
        /// What the referrer expected to find there
        expected: &'static str,
    },

    /// A known attribute whose body does not match its declared layout.
    InvalidAttribute { name: String, reason: String },

    /// `this_class` names an empty, `.` or `..` package segment.
    InvalidClassName(String),

    /// Bytes left over after the last class attribute.
    TrailingBytes(usize),

    /// Appending rewritten names would push the pool past 65535 slots.
    PoolOverflow,
}

impl std::fmt::Display for ClassFormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassFormatError::BadMagic(magic) => {
                write!(f, "bad magic number 0x{:08X} (expected 0xCAFEBABE)", magic)
            }
            ClassFormatError::UnsupportedVersion { major, minor } => {
                write!(f, "unsupported class file version {}.{}", major, minor)
            }
            ClassFormatError::Truncated {
                offset,
                needed,
                available,
            } => write!(
                f,
                "truncated class file: need {} bytes at offset {}, have {}",
                needed, offset, available
            ),
            ClassFormatError::InvalidConstantTag { index, tag } => {
                write!(f, "constant pool entry #{} has unknown tag {}", index, tag)
            }
            ClassFormatError::InvalidConstantIndex { index, expected } => {
                write!(f, "constant pool index #{} is not a valid {}", index, expected)
            }
            ClassFormatError::InvalidAttribute { name, reason } => {
                write!(f, "malformed {} attribute: {}", name, reason)
            }
            ClassFormatError::InvalidClassName(name) => {
                write!(f, "invalid class name {:?}", name)
            }
            ClassFormatError::TrailingBytes(count) => {
                write!(f, "{} unexpected bytes after the class structure", count)
            }
            ClassFormatError::PoolOverflow => {
                write!(f, "constant pool would exceed 65535 entries")
            }
        }
    }
}

impl std::error::Error for ClassFormatError {}

pub type Result<T> = std::result::Result<T, ClassFormatError>;
