//! Class-file codec with symbolic class-name substitution.
//!
//! [`ParsedClass`] decodes a class file into its top-level structure and
//! re-encodes it losslessly. [`ParsedClass::substitute_names`] rewrites every
//! class-name occurrence in symbolic-reference positions (class constants,
//! field and method descriptors, generic signatures, annotation types) through
//! a [`NameMapper`], leaving string literals and member names untouched and
//! keeping all existing constant pool indices stable.

mod attributes;
mod class;
pub mod constant_pool;
mod error;
pub mod mutf8;
pub mod names;
mod reader;
mod substitute;
mod summary;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use class::{
    Attribute, MemberInfo, ParsedClass, MAGIC, MAX_MAJOR_VERSION, MIN_MAJOR_VERSION,
    RUNTIME_INVISIBLE_ANNOTATIONS, RUNTIME_VISIBLE_ANNOTATIONS,
};
pub use constant_pool::{Constant, ConstantPool};
pub use error::{ClassFormatError, Result};
pub use names::{NameMapper, NameRole, SingleName};
pub use substitute::Substitution;
pub use summary::ClassSummary;
