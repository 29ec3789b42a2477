//! Constant pool representation.
//!
//! Entries keep their on-disk payloads so an untouched pool re-serializes to the
//! exact input bytes. Index 0 and the second slot of `Long`/`Double` entries are
//! held as [`Constant::Unusable`] so that vector positions equal pool indices.

use crate::error::{ClassFormatError, Result};
use crate::mutf8;
use crate::reader::ByteReader;

pub const TAG_UTF8: u8 = 1;
pub const TAG_INTEGER: u8 = 3;
pub const TAG_FLOAT: u8 = 4;
pub const TAG_LONG: u8 = 5;
pub const TAG_DOUBLE: u8 = 6;
pub const TAG_CLASS: u8 = 7;
pub const TAG_STRING: u8 = 8;
pub const TAG_FIELDREF: u8 = 9;
pub const TAG_METHODREF: u8 = 10;
pub const TAG_INTERFACE_METHODREF: u8 = 11;
pub const TAG_NAME_AND_TYPE: u8 = 12;
pub const TAG_METHOD_HANDLE: u8 = 15;
pub const TAG_METHOD_TYPE: u8 = 16;
pub const TAG_DYNAMIC: u8 = 17;
pub const TAG_INVOKE_DYNAMIC: u8 = 18;
pub const TAG_MODULE: u8 = 19;
pub const TAG_PACKAGE: u8 = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constant {
    /// Raw modified UTF-8 bytes
    Utf8(Vec<u8>),
    Integer(u32),
    Float(u32),
    Long(u64),
    Double(u64),
    Class {
        name_index: u16,
    },
    String {
        string_index: u16,
    },
    FieldRef {
        class_index: u16,
        name_and_type_index: u16,
    },
    MethodRef {
        class_index: u16,
        name_and_type_index: u16,
    },
    InterfaceMethodRef {
        class_index: u16,
        name_and_type_index: u16,
    },
    NameAndType {
        name_index: u16,
        descriptor_index: u16,
    },
    MethodHandle {
        reference_kind: u8,
        reference_index: u16,
    },
    MethodType {
        descriptor_index: u16,
    },
    Dynamic {
        bootstrap_method_attr_index: u16,
        name_and_type_index: u16,
    },
    InvokeDynamic {
        bootstrap_method_attr_index: u16,
        name_and_type_index: u16,
    },
    Module {
        name_index: u16,
    },
    Package {
        name_index: u16,
    },
    Unusable,
}

impl Constant {
    pub(crate) fn write(&self, out: &mut Vec<u8>) {
        match self {
            Constant::Utf8(bytes) => {
                out.push(TAG_UTF8);
                out.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
                out.extend_from_slice(bytes);
            }
            Constant::Integer(v) => {
                out.push(TAG_INTEGER);
                out.extend_from_slice(&v.to_be_bytes());
            }
            Constant::Float(v) => {
                out.push(TAG_FLOAT);
                out.extend_from_slice(&v.to_be_bytes());
            }
            Constant::Long(v) => {
                out.push(TAG_LONG);
                out.extend_from_slice(&v.to_be_bytes());
            }
            Constant::Double(v) => {
                out.push(TAG_DOUBLE);
                out.extend_from_slice(&v.to_be_bytes());
            }
            Constant::Class { name_index } => write_tag_u16(out, TAG_CLASS, *name_index),
            Constant::String { string_index } => write_tag_u16(out, TAG_STRING, *string_index),
            Constant::FieldRef {
                class_index,
                name_and_type_index,
            } => write_tag_u16_pair(out, TAG_FIELDREF, *class_index, *name_and_type_index),
            Constant::MethodRef {
                class_index,
                name_and_type_index,
            } => write_tag_u16_pair(out, TAG_METHODREF, *class_index, *name_and_type_index),
            Constant::InterfaceMethodRef {
                class_index,
                name_and_type_index,
            } => write_tag_u16_pair(
                out,
                TAG_INTERFACE_METHODREF,
                *class_index,
                *name_and_type_index,
            ),
            Constant::NameAndType {
                name_index,
                descriptor_index,
            } => write_tag_u16_pair(out, TAG_NAME_AND_TYPE, *name_index, *descriptor_index),
            Constant::MethodHandle {
                reference_kind,
                reference_index,
            } => {
                out.push(TAG_METHOD_HANDLE);
                out.push(*reference_kind);
                out.extend_from_slice(&reference_index.to_be_bytes());
            }
            Constant::MethodType { descriptor_index } => {
                write_tag_u16(out, TAG_METHOD_TYPE, *descriptor_index)
            }
            Constant::Dynamic {
                bootstrap_method_attr_index,
                name_and_type_index,
            } => write_tag_u16_pair(
                out,
                TAG_DYNAMIC,
                *bootstrap_method_attr_index,
                *name_and_type_index,
            ),
            Constant::InvokeDynamic {
                bootstrap_method_attr_index,
                name_and_type_index,
            } => write_tag_u16_pair(
                out,
                TAG_INVOKE_DYNAMIC,
                *bootstrap_method_attr_index,
                *name_and_type_index,
            ),
            Constant::Module { name_index } => write_tag_u16(out, TAG_MODULE, *name_index),
            Constant::Package { name_index } => write_tag_u16(out, TAG_PACKAGE, *name_index),
            Constant::Unusable => {}
        }
    }
}

fn write_tag_u16(out: &mut Vec<u8>, tag: u8, a: u16) {
    out.push(tag);
    out.extend_from_slice(&a.to_be_bytes());
}

fn write_tag_u16_pair(out: &mut Vec<u8>, tag: u8, a: u16, b: u16) {
    out.push(tag);
    out.extend_from_slice(&a.to_be_bytes());
    out.extend_from_slice(&b.to_be_bytes());
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantPool {
    entries: Vec<Constant>,
}

impl ConstantPool {
    pub(crate) fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        let count = reader.read_u16()?;
        let mut entries = Vec::with_capacity(count as usize);
        entries.push(Constant::Unusable);

        let mut index: u16 = 1;
        while index < count {
            let tag = reader.read_u8()?;
            let constant = match tag {
                TAG_UTF8 => {
                    let len = reader.read_u16()? as usize;
                    Constant::Utf8(reader.read_bytes(len)?.to_vec())
                }
                TAG_INTEGER => Constant::Integer(reader.read_u32()?),
                TAG_FLOAT => Constant::Float(reader.read_u32()?),
                TAG_LONG => Constant::Long(reader.read_u64()?),
                TAG_DOUBLE => Constant::Double(reader.read_u64()?),
                TAG_CLASS => Constant::Class {
                    name_index: reader.read_u16()?,
                },
                TAG_STRING => Constant::String {
                    string_index: reader.read_u16()?,
                },
                TAG_FIELDREF => Constant::FieldRef {
                    class_index: reader.read_u16()?,
                    name_and_type_index: reader.read_u16()?,
                },
                TAG_METHODREF => Constant::MethodRef {
                    class_index: reader.read_u16()?,
                    name_and_type_index: reader.read_u16()?,
                },
                TAG_INTERFACE_METHODREF => Constant::InterfaceMethodRef {
                    class_index: reader.read_u16()?,
                    name_and_type_index: reader.read_u16()?,
                },
                TAG_NAME_AND_TYPE => Constant::NameAndType {
                    name_index: reader.read_u16()?,
                    descriptor_index: reader.read_u16()?,
                },
                TAG_METHOD_HANDLE => Constant::MethodHandle {
                    reference_kind: reader.read_u8()?,
                    reference_index: reader.read_u16()?,
                },
                TAG_METHOD_TYPE => Constant::MethodType {
                    descriptor_index: reader.read_u16()?,
                },
                TAG_DYNAMIC => Constant::Dynamic {
                    bootstrap_method_attr_index: reader.read_u16()?,
                    name_and_type_index: reader.read_u16()?,
                },
                TAG_INVOKE_DYNAMIC => Constant::InvokeDynamic {
                    bootstrap_method_attr_index: reader.read_u16()?,
                    name_and_type_index: reader.read_u16()?,
                },
                TAG_MODULE => Constant::Module {
                    name_index: reader.read_u16()?,
                },
                TAG_PACKAGE => Constant::Package {
                    name_index: reader.read_u16()?,
                },
                other => return Err(ClassFormatError::InvalidConstantTag { index, tag: other }),
            };

            let wide = matches!(constant, Constant::Long(_) | Constant::Double(_));
            entries.push(constant);
            if wide {
                if index + 1 >= count {
                    return Err(ClassFormatError::InvalidConstantIndex {
                        index,
                        expected: "8-byte constant with room for its second slot",
                    });
                }
                entries.push(Constant::Unusable);
                index += 2;
            } else {
                index += 1;
            }
        }

        Ok(Self { entries })
    }

    pub(crate) fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&(self.entries.len() as u16).to_be_bytes());
        for entry in &self.entries[1..] {
            entry.write(out);
        }
    }

    /// Value of `constant_pool_count`: number of slots including index 0.
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, index: u16) -> Option<&Constant> {
        self.entries.get(index as usize)
    }

    pub(crate) fn get_mut(&mut self, index: u16) -> Option<&mut Constant> {
        self.entries.get_mut(index as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, &Constant)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, c)| (i as u16, c))
    }

    pub fn utf8_bytes(&self, index: u16) -> Result<&[u8]> {
        match self.get(index) {
            Some(Constant::Utf8(bytes)) => Ok(bytes),
            _ => Err(ClassFormatError::InvalidConstantIndex {
                index,
                expected: "CONSTANT_Utf8",
            }),
        }
    }

    /// Decoded text of a `CONSTANT_Utf8` entry.
    pub fn utf8(&self, index: u16) -> Result<String> {
        let bytes = self.utf8_bytes(index)?;
        mutf8::decode(bytes).ok_or(ClassFormatError::InvalidConstantIndex {
            index,
            expected: "well-formed modified UTF-8 string",
        })
    }

    /// Name stored behind a `CONSTANT_Class` entry.
    pub fn class_name(&self, index: u16) -> Result<String> {
        match self.get(index) {
            Some(Constant::Class { name_index }) => self.utf8(*name_index),
            _ => Err(ClassFormatError::InvalidConstantIndex {
                index,
                expected: "CONSTANT_Class",
            }),
        }
    }

    /// Append a new `CONSTANT_Utf8` entry and return its index.
    pub(crate) fn push_utf8(&mut self, bytes: Vec<u8>) -> Result<u16> {
        if self.entries.len() >= u16::MAX as usize {
            return Err(ClassFormatError::PoolOverflow);
        }
        self.entries.push(Constant::Utf8(bytes));
        Ok((self.entries.len() - 1) as u16)
    }
}
