//! Whole-class symbolic name substitution.

use std::collections::{BTreeMap, HashMap};

use tracing::trace;

use crate::attributes::{AttributeOwner, NameSlots, SlotSite};
use crate::class::ParsedClass;
use crate::constant_pool::Constant;
use crate::error::{ClassFormatError, Result};
use crate::mutf8;
use crate::names::NameMapper;
use crate::reader::patch_u16;

/// Result of [`ParsedClass::substitute_names`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub bytes: Vec<u8>,
    pub changed: bool,
}

impl ParsedClass {
    /// Rewrite every symbolic class-name occurrence that `mapper` maps.
    ///
    /// A UTF-8 entry used only in name roles, and rewritten to the same text in
    /// all of them, is replaced in place. Otherwise the original entry is kept
    /// and each new text is appended to the pool, with only the name-role
    /// referrers repointed. Existing pool indices never move, so code bodies
    /// are carried over unchanged.
    pub fn substitute_names<M: NameMapper + ?Sized>(&self, mapper: &M) -> Result<Substitution> {
        let slots = NameSlots::collect(self)?;

        let mut by_utf8: BTreeMap<u16, Vec<usize>> = BTreeMap::new();
        for (i, slot) in slots.slots.iter().enumerate() {
            by_utf8.entry(slot.utf8_index).or_default().push(i);
        }

        let mut in_place: Vec<(u16, String)> = Vec::new();
        let mut repoint: Vec<(usize, String)> = Vec::new();
        for (utf8_index, slot_ids) in by_utf8 {
            let Ok(value) = self.constant_pool.utf8(utf8_index) else {
                continue;
            };
            let rewrites: Vec<(usize, Option<String>)> = slot_ids
                .iter()
                .map(|&s| (s, slots.slots[s].role.remap(&value, mapper)))
                .collect();
            if rewrites.iter().all(|(_, r)| r.is_none()) {
                continue;
            }

            let first = rewrites[0].1.as_deref();
            let uniform = first.is_some() && rewrites.iter().all(|(_, r)| r.as_deref() == first);
            if uniform && !slots.is_pinned(utf8_index) {
                if let Some(new_value) = first {
                    trace!(utf8_index, from = %value, to = new_value, "rewrite pool entry");
                    in_place.push((utf8_index, new_value.to_string()));
                }
            } else {
                for (slot, rewritten) in rewrites {
                    if let Some(new_value) = rewritten {
                        repoint.push((slot, new_value));
                    }
                }
            }
        }

        if in_place.is_empty() && repoint.is_empty() {
            return Ok(Substitution {
                bytes: self.raw_bytes().to_vec(),
                changed: false,
            });
        }

        let mut out = self.clone();
        for (utf8_index, new_value) in in_place {
            if let Some(entry) = out.constant_pool.get_mut(utf8_index) {
                *entry = Constant::Utf8(mutf8::encode(&new_value));
            }
        }

        let mut appended: HashMap<String, u16> = HashMap::new();
        for (slot_id, new_value) in repoint {
            let new_index = match appended.get(&new_value) {
                Some(&index) => index,
                None => {
                    let index = out.constant_pool.push_utf8(mutf8::encode(&new_value))?;
                    trace!(index, value = %new_value, "append pool entry");
                    appended.insert(new_value, index);
                    index
                }
            };
            out.repoint(slots.slots[slot_id].site, new_index)?;
        }

        let bytes = out.to_bytes();
        let changed = bytes != self.raw_bytes();
        Ok(Substitution { bytes, changed })
    }

    fn repoint(&mut self, site: SlotSite, utf8_index: u16) -> Result<()> {
        match site {
            SlotSite::Pool(index) => match self.constant_pool.get_mut(index) {
                Some(Constant::Class { name_index }) => *name_index = utf8_index,
                Some(Constant::NameAndType {
                    descriptor_index, ..
                })
                | Some(Constant::MethodType { descriptor_index }) => *descriptor_index = utf8_index,
                _ => {
                    return Err(ClassFormatError::InvalidConstantIndex {
                        index,
                        expected: "name-bearing constant",
                    })
                }
            },
            SlotSite::FieldDescriptor(i) => self.fields[i].descriptor_index = utf8_index,
            SlotSite::MethodDescriptor(i) => self.methods[i].descriptor_index = utf8_index,
            SlotSite::Attribute {
                owner,
                attr,
                offset,
            } => {
                let attribute = match owner {
                    AttributeOwner::Class => &mut self.attributes[attr],
                    AttributeOwner::Field(i) => &mut self.fields[i].attributes[attr],
                    AttributeOwner::Method(i) => &mut self.methods[i].attributes[attr],
                };
                patch_u16(&mut attribute.info, offset, utf8_index);
            }
        }
        Ok(())
    }
}
