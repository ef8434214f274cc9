//! Constant-pool decoding.
//!
//! The pool is a transient per-parse lookup table; nothing in it outlives
//! the [`RawClassRecord`](crate::raw::RawClassRecord) built from it.

use super::reader::ByteCursor;
use super::ParseError;

/// One constant-pool entry.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Constant {
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
    MethodHandle,
    MethodType,
    Dynamic,
    InvokeDynamic { name_and_type_index: u16 },
    Module,
    Package,
    /// Phantom second slot occupied by `Long` / `Double` entries.
    Unusable,
}

/// A member reference resolved through the pool into owned strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MemberRefInfo {
    pub class_name: String,
    pub name: String,
    pub descriptor: String,
}

/// Indexed constant pool for a single class file.
pub(crate) struct ConstantPool {
    entries: Vec<Constant>,
}

impl ConstantPool {
    /// Reads `constant_pool_count` and all entries from the cursor.
    pub(crate) fn read(cur: &mut ByteCursor<'_>) -> Result<Self, ParseError> {
        let count = cur.u16()?;
        // Entry 0 is unused by the format; slot it with Unusable so pool
        // indices map directly.
        let mut entries = vec![Constant::Unusable];
        while entries.len() < count as usize {
            let at = cur.position();
            let tag = cur.u8()?;
            let entry = match tag {
                1 => {
                    let len = cur.u16()? as usize;
                    let bytes = cur.bytes(len)?;
                    // Modified UTF-8 differs from UTF-8 only for NUL and
                    // supplementary characters; lossy decoding keeps every
                    // name we care about intact.
                    Constant::Utf8(String::from_utf8_lossy(bytes).into_owned())
                }
                3 => Constant::Integer(cur.u32()? as i32),
                4 => Constant::Float(f32::from_bits(cur.u32()?)),
                5 => {
                    let hi = u64::from(cur.u32()?);
                    let lo = u64::from(cur.u32()?);
                    Constant::Long(((hi << 32) | lo) as i64)
                }
                6 => {
                    let hi = u64::from(cur.u32()?);
                    let lo = u64::from(cur.u32()?);
                    Constant::Double(f64::from_bits((hi << 32) | lo))
                }
                7 => Constant::Class { name_index: cur.u16()? },
                8 => Constant::String { string_index: cur.u16()? },
                9 => Constant::FieldRef {
                    class_index: cur.u16()?,
                    name_and_type_index: cur.u16()?,
                },
                10 => Constant::MethodRef {
                    class_index: cur.u16()?,
                    name_and_type_index: cur.u16()?,
                },
                11 => Constant::InterfaceMethodRef {
                    class_index: cur.u16()?,
                    name_and_type_index: cur.u16()?,
                },
                12 => Constant::NameAndType {
                    name_index: cur.u16()?,
                    descriptor_index: cur.u16()?,
                },
                15 => {
                    cur.skip(3)?;
                    Constant::MethodHandle
                }
                16 => {
                    cur.skip(2)?;
                    Constant::MethodType
                }
                17 => {
                    cur.skip(4)?;
                    Constant::Dynamic
                }
                18 => {
                    cur.skip(2)?;
                    Constant::InvokeDynamic {
                        name_and_type_index: cur.u16()?,
                    }
                }
                19 => {
                    cur.skip(2)?;
                    Constant::Module
                }
                20 => {
                    cur.skip(2)?;
                    Constant::Package
                }
                tag => return Err(ParseError::BadConstantTag { tag, at }),
            };
            let wide = matches!(entry, Constant::Long(_) | Constant::Double(_));
            entries.push(entry);
            if wide {
                entries.push(Constant::Unusable);
            }
        }
        Ok(Self { entries })
    }

    fn get(&self, index: u16) -> Result<&Constant, ParseError> {
        self.entries
            .get(index as usize)
            .filter(|c| !matches!(c, Constant::Unusable))
            .ok_or(ParseError::BadConstantIndex { index })
    }

    /// Resolves a `Utf8` entry.
    pub(crate) fn utf8(&self, index: u16) -> Result<&str, ParseError> {
        match self.get(index)? {
            Constant::Utf8(s) => Ok(s),
            _ => Err(ParseError::BadConstantIndex { index }),
        }
    }

    /// Resolves a `Class` entry to a fully qualified (dotted) class name.
    ///
    /// Array class entries resolve to their element class name; entries for
    /// primitive-only arrays yield `None`.
    pub(crate) fn class_name(&self, index: u16) -> Result<Option<String>, ParseError> {
        match self.get(index)? {
            Constant::Class { name_index } => {
                let internal = self.utf8(*name_index)?;
                Ok(binary_to_class_name(internal))
            }
            _ => Err(ParseError::BadConstantIndex { index }),
        }
    }

    /// Resolves a `Class` entry that must name a real class.
    pub(crate) fn required_class_name(&self, index: u16) -> Result<String, ParseError> {
        self.class_name(index)?
            .ok_or(ParseError::BadConstantIndex { index })
    }

    /// Resolves a field/method/interface-method reference into owned strings.
    pub(crate) fn member_ref(&self, index: u16) -> Result<Option<MemberRefInfo>, ParseError> {
        let (class_index, nat_index) = match self.get(index)? {
            Constant::FieldRef { class_index, name_and_type_index }
            | Constant::MethodRef { class_index, name_and_type_index }
            | Constant::InterfaceMethodRef { class_index, name_and_type_index } => {
                (*class_index, *name_and_type_index)
            }
            _ => return Err(ParseError::BadConstantIndex { index }),
        };
        let Some(class_name) = self.class_name(class_index)? else {
            // Member reference on a primitive array type (e.g. clone());
            // there is no class to depend on.
            return Ok(None);
        };
        let (name, descriptor) = self.name_and_type(nat_index)?;
        Ok(Some(MemberRefInfo {
            class_name,
            name: name.to_owned(),
            descriptor: descriptor.to_owned(),
        }))
    }

    /// Resolves a `NameAndType` entry.
    pub(crate) fn name_and_type(&self, index: u16) -> Result<(&str, &str), ParseError> {
        match self.get(index)? {
            Constant::NameAndType { name_index, descriptor_index } => {
                Ok((self.utf8(*name_index)?, self.utf8(*descriptor_index)?))
            }
            _ => Err(ParseError::BadConstantIndex { index }),
        }
    }

    pub(crate) fn integer(&self, index: u16) -> Result<i32, ParseError> {
        match self.get(index)? {
            Constant::Integer(v) => Ok(*v),
            _ => Err(ParseError::BadConstantIndex { index }),
        }
    }

    pub(crate) fn long(&self, index: u16) -> Result<i64, ParseError> {
        match self.get(index)? {
            Constant::Long(v) => Ok(*v),
            _ => Err(ParseError::BadConstantIndex { index }),
        }
    }

    pub(crate) fn float(&self, index: u16) -> Result<f32, ParseError> {
        match self.get(index)? {
            Constant::Float(v) => Ok(*v),
            _ => Err(ParseError::BadConstantIndex { index }),
        }
    }

    pub(crate) fn double(&self, index: u16) -> Result<f64, ParseError> {
        match self.get(index)? {
            Constant::Double(v) => Ok(*v),
            _ => Err(ParseError::BadConstantIndex { index }),
        }
    }

    #[cfg(test)]
    pub(crate) fn from_entries(entries: Vec<Constant>) -> Self {
        let mut all = vec![Constant::Unusable];
        all.extend(entries);
        Self { entries: all }
    }
}

/// Converts an internal binary name (`com/example/Foo`) or array descriptor
/// (`[Lcom/example/Foo;`) to a dotted class name. Primitive-only array
/// descriptors have no class component.
fn binary_to_class_name(internal: &str) -> Option<String> {
    let element = internal.trim_start_matches('[');
    if element.len() < internal.len() {
        // Array descriptor: element is a descriptor, not a binary name.
        let stripped = element.strip_prefix('L')?.strip_suffix(';')?;
        Some(stripped.replace('/', "."))
    } else {
        Some(element.replace('/', "."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool_bytes(entries: &[&[u8]]) -> Vec<u8> {
        let mut out = Vec::new();
        let count = u16::try_from(entries.len() + 1).unwrap();
        out.extend_from_slice(&count.to_be_bytes());
        for e in entries {
            out.extend_from_slice(e);
        }
        out
    }

    fn utf8_entry(s: &str) -> Vec<u8> {
        let mut e = vec![1u8];
        e.extend_from_slice(&u16::try_from(s.len()).unwrap().to_be_bytes());
        e.extend_from_slice(s.as_bytes());
        e
    }

    #[test]
    fn reads_utf8_and_class_entries() {
        let utf8 = utf8_entry("com/example/Foo");
        let class: &[u8] = &[7, 0, 1];
        let bytes = pool_bytes(&[&utf8, class]);
        let mut cur = ByteCursor::new(&bytes);
        let pool = ConstantPool::read(&mut cur).unwrap();

        assert_eq!(pool.utf8(1).unwrap(), "com/example/Foo");
        assert_eq!(pool.class_name(2).unwrap().as_deref(), Some("com.example.Foo"));
    }

    #[test]
    fn long_occupies_two_slots() {
        let long_entry: &[u8] = &[5, 0, 0, 0, 0, 0, 0, 0, 42];
        let utf8 = utf8_entry("x");
        // count = 4: slot 1 long, slot 2 phantom, slot 3 utf8
        let mut bytes = vec![0u8, 4];
        bytes.extend_from_slice(long_entry);
        bytes.extend_from_slice(&utf8);
        let mut cur = ByteCursor::new(&bytes);
        let pool = ConstantPool::read(&mut cur).unwrap();

        assert_eq!(pool.long(1).unwrap(), 42);
        assert!(pool.utf8(2).is_err());
        assert_eq!(pool.utf8(3).unwrap(), "x");
    }

    #[test]
    fn rejects_unknown_tag() {
        let bytes = vec![0u8, 2, 99];
        let mut cur = ByteCursor::new(&bytes);
        assert!(matches!(
            ConstantPool::read(&mut cur),
            Err(ParseError::BadConstantTag { tag: 99, .. })
        ));
    }

    #[test]
    fn array_class_entry_resolves_to_element() {
        let utf8 = utf8_entry("[[Lcom/example/Foo;");
        let class: &[u8] = &[7, 0, 1];
        let bytes = pool_bytes(&[&utf8, class]);
        let mut cur = ByteCursor::new(&bytes);
        let pool = ConstantPool::read(&mut cur).unwrap();
        assert_eq!(pool.class_name(2).unwrap().as_deref(), Some("com.example.Foo"));
    }

    #[test]
    fn primitive_array_class_entry_has_no_class() {
        let utf8 = utf8_entry("[I");
        let class: &[u8] = &[7, 0, 1];
        let bytes = pool_bytes(&[&utf8, class]);
        let mut cur = ByteCursor::new(&bytes);
        let pool = ConstantPool::read(&mut cur).unwrap();
        assert_eq!(pool.class_name(2).unwrap(), None);
    }

    #[test]
    fn member_ref_resolves_through_name_and_type() {
        let owner = utf8_entry("com/example/Svc");
        let name = utf8_entry("run");
        let desc = utf8_entry("()V");
        let class: &[u8] = &[7, 0, 1];
        let nat: &[u8] = &[12, 0, 2, 0, 3];
        let mref: &[u8] = &[10, 0, 4, 0, 5];
        let bytes = pool_bytes(&[&owner, &name, &desc, class, nat, mref]);
        let mut cur = ByteCursor::new(&bytes);
        let pool = ConstantPool::read(&mut cur).unwrap();

        let info = pool.member_ref(6).unwrap().unwrap();
        assert_eq!(info.class_name, "com.example.Svc");
        assert_eq!(info.name, "run");
        assert_eq!(info.descriptor, "()V");
    }
}
