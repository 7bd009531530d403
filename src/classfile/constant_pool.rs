use super::reader::ClassReader;
use super::ParseError;

/// One parsed constant pool entry.
///
/// Every tag defined by the class file format is represented so that the
/// parser can skip entries it has no use for without losing its position.
#[derive(Clone, Debug)]
pub(crate) enum PoolEntry {
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class { name_index: u16 },
    String { string_index: u16 },
    FieldRef { class_index: u16, name_and_type_index: u16 },
    MethodRef { class_index: u16, name_and_type_index: u16 },
    InterfaceMethodRef { class_index: u16, name_and_type_index: u16 },
    NameAndType { name_index: u16, descriptor_index: u16 },
    MethodHandle { reference_kind: u8, reference_index: u16 },
    MethodType { descriptor_index: u16 },
    Dynamic { bootstrap_method_index: u16, name_and_type_index: u16 },
    InvokeDynamic { bootstrap_method_index: u16, name_and_type_index: u16 },
    Module { name_index: u16 },
    Package { name_index: u16 },
}

/// Constant pool indexed from 1, with the phantom slot after every
/// `Long`/`Double` entry left unoccupied.
#[derive(Clone, Debug)]
pub(crate) struct ConstantPool {
    entries: Vec<Option<PoolEntry>>,
}

impl ConstantPool {
    pub(crate) fn parse(reader: &mut ClassReader<'_>) -> Result<ConstantPool, ParseError> {
        let count = reader.u16()?;
        let mut entries: Vec<Option<PoolEntry>> = Vec::with_capacity(count as usize);
        entries.push(None);

        let mut index = 1u16;
        while index < count {
            let tag = reader.u8()?;
            let entry = match tag {
                1 => {
                    let len = reader.u16()? as usize;
                    let bytes = reader.bytes(len)?;
                    // Modified UTF-8 differs from UTF-8 only for NUL and
                    // supplementary characters; lossy decoding keeps names usable.
                    PoolEntry::Utf8(String::from_utf8_lossy(bytes).into_owned())
                }
                3 => PoolEntry::Integer(reader.u32()? as i32),
                4 => PoolEntry::Float(f32::from_bits(reader.u32()?)),
                5 => {
                    let high = reader.u32()? as u64;
                    let low = reader.u32()? as u64;
                    PoolEntry::Long(((high << 32) | low) as i64)
                }
                6 => {
                    let high = reader.u32()? as u64;
                    let low = reader.u32()? as u64;
                    PoolEntry::Double(f64::from_bits((high << 32) | low))
                }
                7 => PoolEntry::Class { name_index: reader.u16()? },
                8 => PoolEntry::String { string_index: reader.u16()? },
                9 => PoolEntry::FieldRef {
                    class_index: reader.u16()?,
                    name_and_type_index: reader.u16()?,
                },
                10 => PoolEntry::MethodRef {
                    class_index: reader.u16()?,
                    name_and_type_index: reader.u16()?,
                },
                11 => PoolEntry::InterfaceMethodRef {
                    class_index: reader.u16()?,
                    name_and_type_index: reader.u16()?,
                },
                12 => PoolEntry::NameAndType {
                    name_index: reader.u16()?,
                    descriptor_index: reader.u16()?,
                },
                15 => PoolEntry::MethodHandle {
                    reference_kind: reader.u8()?,
                    reference_index: reader.u16()?,
                },
                16 => PoolEntry::MethodType { descriptor_index: reader.u16()? },
                17 => PoolEntry::Dynamic {
                    bootstrap_method_index: reader.u16()?,
                    name_and_type_index: reader.u16()?,
                },
                18 => PoolEntry::InvokeDynamic {
                    bootstrap_method_index: reader.u16()?,
                    name_and_type_index: reader.u16()?,
                },
                19 => PoolEntry::Module { name_index: reader.u16()? },
                20 => PoolEntry::Package { name_index: reader.u16()? },
                tag => return Err(ParseError::UnknownPoolTag { tag, index }),
            };

            let two_slots = matches!(entry, PoolEntry::Long(_) | PoolEntry::Double(_));
            entries.push(Some(entry));
            index += 1;
            if two_slots {
                entries.push(None);
                index += 1;
            }
        }

        Ok(ConstantPool { entries })
    }

    fn entry(&self, index: u16) -> Result<&PoolEntry, ParseError> {
        self.entries
            .get(index as usize)
            .and_then(|slot| slot.as_ref())
            .ok_or(ParseError::BadPoolIndex(index))
    }

    pub(crate) fn utf8(&self, index: u16) -> Result<&str, ParseError> {
        match self.entry(index)? {
            PoolEntry::Utf8(text) => Ok(text),
            _ => Err(ParseError::WrongPoolEntry { index, expected: "Utf8" }),
        }
    }

    pub(crate) fn class_name(&self, index: u16) -> Result<&str, ParseError> {
        match self.entry(index)? {
            PoolEntry::Class { name_index } => self.utf8(*name_index),
            _ => Err(ParseError::WrongPoolEntry { index, expected: "Class" }),
        }
    }

    /// Class name behind an optional class index, `None` when the index is 0
    /// (the super class slot of `java/lang/Object`).
    pub(crate) fn optional_class_name(&self, index: u16) -> Result<Option<&str>, ParseError> {
        if index == 0 {
            return Ok(None);
        }
        self.class_name(index).map(Some)
    }

    /// Owner, name, and descriptor of a field/method/interface-method reference.
    pub(crate) fn member_ref(&self, index: u16) -> Result<(&str, &str, &str), ParseError> {
        let (class_index, name_and_type_index) = match self.entry(index)? {
            PoolEntry::FieldRef { class_index, name_and_type_index }
            | PoolEntry::MethodRef { class_index, name_and_type_index }
            | PoolEntry::InterfaceMethodRef { class_index, name_and_type_index } => {
                (*class_index, *name_and_type_index)
            }
            _ => {
                return Err(ParseError::WrongPoolEntry { index, expected: "member reference" });
            }
        };
        let owner = self.class_name(class_index)?;
        let (name, descriptor) = match self.entry(name_and_type_index)? {
            PoolEntry::NameAndType { name_index, descriptor_index } => {
                (self.utf8(*name_index)?, self.utf8(*descriptor_index)?)
            }
            _ => {
                return Err(ParseError::WrongPoolEntry {
                    index: name_and_type_index,
                    expected: "NameAndType",
                });
            }
        };
        Ok((owner, name, descriptor))
    }
}
