//! Locating name-bearing constant pool references.
//!
//! [`NameSlots`] records every place a `CONSTANT_Utf8` index is used as a class
//! name, descriptor or signature, together with the UTF-8 entries that are also
//! referenced in roles that must keep their text (string literals, member
//! names, attribute names and the like). Attribute positions are byte offsets
//! into the top-level attribute body so a slot can be repointed by patching a
//! single `u16` without re-encoding the attribute.

use std::collections::{BTreeSet, HashSet};

use crate::class::{Attribute, ParsedClass};
use crate::constant_pool::{Constant, ConstantPool};
use crate::error::{ClassFormatError, Result};
use crate::names::NameRole;
use crate::reader::ByteReader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AttributeOwner {
    Class,
    Field(usize),
    Method(usize),
}

/// Where a name-role UTF-8 index is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SlotSite {
    /// `Class.name_index`, `NameAndType.descriptor_index` or `MethodType.descriptor_index`
    Pool(u16),
    FieldDescriptor(usize),
    MethodDescriptor(usize),
    Attribute {
        owner: AttributeOwner,
        attr: usize,
        offset: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NameSlot {
    pub site: SlotSite,
    pub utf8_index: u16,
    pub role: NameRole,
}

#[derive(Debug, Default)]
pub(crate) struct NameSlots {
    pub slots: Vec<NameSlot>,
    pinned: HashSet<u16>,
}

#[derive(Debug, Clone, Copy)]
enum IndexUse {
    Name(NameRole),
    /// Type of an annotation applied directly by the attribute
    TopLevelAnnotation,
    Pinned,
}

impl NameSlots {
    pub fn collect(class: &ParsedClass) -> Result<Self> {
        let pool = &class.constant_pool;
        let mut slots = NameSlots::default();

        for (index, constant) in pool.iter() {
            match constant {
                Constant::Class { name_index } => {
                    slots.add(pool, SlotSite::Pool(index), *name_index, NameRole::ClassName)?
                }
                Constant::NameAndType {
                    name_index,
                    descriptor_index,
                } => {
                    slots.pinned.insert(*name_index);
                    slots.add(
                        pool,
                        SlotSite::Pool(index),
                        *descriptor_index,
                        NameRole::Descriptor,
                    )?;
                }
                Constant::MethodType { descriptor_index } => slots.add(
                    pool,
                    SlotSite::Pool(index),
                    *descriptor_index,
                    NameRole::Descriptor,
                )?,
                Constant::String { string_index } => {
                    slots.pinned.insert(*string_index);
                }
                Constant::Module { name_index } | Constant::Package { name_index } => {
                    slots.pinned.insert(*name_index);
                }
                _ => {}
            }
        }

        for (i, field) in class.fields.iter().enumerate() {
            slots.pinned.insert(field.name_index);
            slots.add(
                pool,
                SlotSite::FieldDescriptor(i),
                field.descriptor_index,
                NameRole::Descriptor,
            )?;
            slots.walk_attributes(pool, AttributeOwner::Field(i), &field.attributes)?;
        }
        for (i, method) in class.methods.iter().enumerate() {
            slots.pinned.insert(method.name_index);
            slots.add(
                pool,
                SlotSite::MethodDescriptor(i),
                method.descriptor_index,
                NameRole::Descriptor,
            )?;
            slots.walk_attributes(pool, AttributeOwner::Method(i), &method.attributes)?;
        }
        slots.walk_attributes(pool, AttributeOwner::Class, &class.attributes)?;

        Ok(slots)
    }

    /// Whether a UTF-8 entry is also used in a role whose text must not change.
    pub fn is_pinned(&self, utf8_index: u16) -> bool {
        self.pinned.contains(&utf8_index)
    }

    /// Distinct (UTF-8 index, role) pairs.
    pub fn roles(&self) -> BTreeSet<(u16, NameRole)> {
        self.slots.iter().map(|s| (s.utf8_index, s.role)).collect()
    }

    fn add(&mut self, pool: &ConstantPool, site: SlotSite, utf8_index: u16, role: NameRole) -> Result<()> {
        pool.utf8_bytes(utf8_index)?;
        self.slots.push(NameSlot {
            site,
            utf8_index,
            role,
        });
        Ok(())
    }

    fn walk_attributes(
        &mut self,
        pool: &ConstantPool,
        owner: AttributeOwner,
        attributes: &[Attribute],
    ) -> Result<()> {
        for (attr_idx, attr) in attributes.iter().enumerate() {
            self.pinned.insert(attr.name_index);
            let Ok(name) = pool.utf8(attr.name_index) else {
                continue;
            };
            let mut found: Vec<(usize, u16, IndexUse)> = Vec::new();
            walk_attribute(pool, &name, &attr.info, 0, &mut found).map_err(|e| invalid(&name, e))?;
            for (offset, index, usage) in found {
                match usage {
                    IndexUse::Pinned => {
                        self.pinned.insert(index);
                    }
                    IndexUse::Name(role) => self.add(
                        pool,
                        SlotSite::Attribute {
                            owner,
                            attr: attr_idx,
                            offset,
                        },
                        index,
                        role,
                    )?,
                    IndexUse::TopLevelAnnotation => self.add(
                        pool,
                        SlotSite::Attribute {
                            owner,
                            attr: attr_idx,
                            offset,
                        },
                        index,
                        NameRole::Descriptor,
                    )?,
                }
            }
        }
        Ok(())
    }
}

fn invalid(name: &str, err: ClassFormatError) -> ClassFormatError {
    match err {
        ClassFormatError::InvalidAttribute { .. } => err,
        other => ClassFormatError::InvalidAttribute {
            name: name.to_string(),
            reason: other.to_string(),
        },
    }
}

/// Type indices of the annotations held by a `Runtime[In]VisibleAnnotations` body.
pub(crate) fn annotation_type_indices(info: &[u8]) -> Result<Vec<u16>> {
    let mut found = Vec::new();
    let mut reader = ByteReader::new(info);
    let count = reader.read_u16()?;
    for _ in 0..count {
        annotation(&mut reader, 0, true, &mut found)?;
    }
    Ok(found
        .into_iter()
        .filter(|(_, _, usage)| matches!(usage, IndexUse::TopLevelAnnotation))
        .map(|(_, index, _)| index)
        .collect())
}

type Found = Vec<(usize, u16, IndexUse)>;

fn record(reader: &mut ByteReader<'_>, base: usize, usage: IndexUse, found: &mut Found) -> Result<u16> {
    let offset = base + reader.position();
    let index = reader.read_u16()?;
    found.push((offset, index, usage));
    Ok(index)
}

/// Walk one attribute body located at `base` within the top-level attribute.
fn walk_attribute(
    pool: &ConstantPool,
    name: &str,
    info: &[u8],
    base: usize,
    found: &mut Found,
) -> Result<()> {
    let mut reader = ByteReader::new(info);
    match name {
        "Code" => {
            reader.skip(4)?; // max_stack, max_locals
            let code_len = reader.read_u32()? as usize;
            reader.skip(code_len)?;
            let exception_table_len = reader.read_u16()? as usize;
            reader.skip(exception_table_len * 8)?;
            nested_attributes(pool, &mut reader, base, found)?;
        }
        "Signature" => {
            record(&mut reader, base, IndexUse::Name(NameRole::Signature), found)?;
        }
        "LocalVariableTable" | "LocalVariableTypeTable" => {
            let role = if name == "LocalVariableTable" {
                NameRole::Descriptor
            } else {
                NameRole::Signature
            };
            let count = reader.read_u16()?;
            for _ in 0..count {
                reader.skip(4)?; // start_pc, length
                record(&mut reader, base, IndexUse::Pinned, found)?;
                record(&mut reader, base, IndexUse::Name(role), found)?;
                reader.skip(2)?;
            }
        }
        "RuntimeVisibleAnnotations" | "RuntimeInvisibleAnnotations" => {
            let count = reader.read_u16()?;
            for _ in 0..count {
                annotation(&mut reader, base, true, found)?;
            }
        }
        "RuntimeVisibleParameterAnnotations" | "RuntimeInvisibleParameterAnnotations" => {
            let parameters = reader.read_u8()?;
            for _ in 0..parameters {
                let count = reader.read_u16()?;
                for _ in 0..count {
                    annotation(&mut reader, base, false, found)?;
                }
            }
        }
        "RuntimeVisibleTypeAnnotations" | "RuntimeInvisibleTypeAnnotations" => {
            let count = reader.read_u16()?;
            for _ in 0..count {
                type_annotation(&mut reader, base, found)?;
            }
        }
        "AnnotationDefault" => element_value(&mut reader, base, found)?,
        "Record" => {
            let count = reader.read_u16()?;
            for _ in 0..count {
                record(&mut reader, base, IndexUse::Pinned, found)?;
                record(&mut reader, base, IndexUse::Name(NameRole::Descriptor), found)?;
                nested_attributes(pool, &mut reader, base, found)?;
            }
        }
        "SourceFile" => {
            record(&mut reader, base, IndexUse::Pinned, found)?;
        }
        "InnerClasses" => {
            let count = reader.read_u16()?;
            for _ in 0..count {
                reader.skip(4)?; // inner and outer class_info
                record(&mut reader, base, IndexUse::Pinned, found)?;
                reader.skip(2)?;
            }
        }
        "MethodParameters" => {
            let count = reader.read_u8()?;
            for _ in 0..count {
                record(&mut reader, base, IndexUse::Pinned, found)?;
                reader.skip(2)?;
            }
        }
        _ => return Ok(()),
    }

    if reader.remaining() > 0 {
        return Err(ClassFormatError::InvalidAttribute {
            name: name.to_string(),
            reason: format!("{} unexpected trailing bytes", reader.remaining()),
        });
    }
    Ok(())
}

fn nested_attributes(
    pool: &ConstantPool,
    reader: &mut ByteReader<'_>,
    base: usize,
    found: &mut Found,
) -> Result<()> {
    let count = reader.read_u16()?;
    for _ in 0..count {
        let name_index = record(reader, base, IndexUse::Pinned, found)?;
        let len = reader.read_u32()? as usize;
        let start = base + reader.position();
        let body = reader.read_bytes(len)?;
        if let Ok(name) = pool.utf8(name_index) {
            walk_attribute(pool, &name, body, start, found).map_err(|e| invalid(&name, e))?;
        }
    }
    Ok(())
}

fn annotation(
    reader: &mut ByteReader<'_>,
    base: usize,
    top_level: bool,
    found: &mut Found,
) -> Result<()> {
    let usage = if top_level {
        IndexUse::TopLevelAnnotation
    } else {
        IndexUse::Name(NameRole::Descriptor)
    };
    record(reader, base, usage, found)?;
    let pairs = reader.read_u16()?;
    for _ in 0..pairs {
        record(reader, base, IndexUse::Pinned, found)?;
        element_value(reader, base, found)?;
    }
    Ok(())
}

fn element_value(reader: &mut ByteReader<'_>, base: usize, found: &mut Found) -> Result<()> {
    let tag = reader.read_u8()?;
    match tag {
        b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' => reader.skip(2)?,
        b's' => {
            record(reader, base, IndexUse::Pinned, found)?;
        }
        b'e' => {
            record(reader, base, IndexUse::Name(NameRole::Descriptor), found)?;
            record(reader, base, IndexUse::Pinned, found)?;
        }
        b'c' => {
            record(reader, base, IndexUse::Name(NameRole::Descriptor), found)?;
        }
        b'@' => annotation(reader, base, false, found)?,
        b'[' => {
            let count = reader.read_u16()?;
            for _ in 0..count {
                element_value(reader, base, found)?;
            }
        }
        other => {
            return Err(ClassFormatError::InvalidAttribute {
                name: "annotation".to_string(),
                reason: format!("unknown element_value tag {:?}", other as char),
            })
        }
    }
    Ok(())
}

fn type_annotation(reader: &mut ByteReader<'_>, base: usize, found: &mut Found) -> Result<()> {
    let target_type = reader.read_u8()?;
    match target_type {
        0x00 | 0x01 | 0x16 => reader.skip(1)?,
        0x10 | 0x11 | 0x12 | 0x17 | 0x42..=0x46 => reader.skip(2)?,
        0x13..=0x15 => {}
        0x40 | 0x41 => {
            let len = reader.read_u16()? as usize;
            reader.skip(len * 6)?;
        }
        0x47..=0x4B => reader.skip(3)?,
        other => {
            return Err(ClassFormatError::InvalidAttribute {
                name: "type_annotation".to_string(),
                reason: format!("unknown target_type 0x{:02X}", other),
            })
        }
    }
    let path_len = reader.read_u8()? as usize;
    reader.skip(path_len * 2)?;
    annotation(reader, base, false, found)
}
