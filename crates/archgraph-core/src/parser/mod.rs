//! Class-file binary parser.
//!
//! [`parse_class`] decodes one class-file byte buffer into a
//! [`RawClassRecord`]. Parsing is stateless across calls; the constant pool
//! lives only for the duration of a single parse. Nothing here resolves
//! names against other classes, that is the importer's job.

use thiserror::Error;

use crate::raw::{AccessFlags, RawClassRecord, RawField, RawMethod};

mod annotations;
mod attributes;
mod bytecode;
pub mod descriptor;
mod pool;
mod reader;
pub mod signature;

use attributes::{ClassAttributes, FieldAttributes, MethodAttributes};
use pool::ConstantPool;
use reader::ByteCursor;

/// Class-file magic number.
const MAGIC: u32 = 0xCAFE_BABE;
/// Oldest supported major version (JDK 1.1).
const MIN_MAJOR_VERSION: u16 = 45;
/// Newest supported major version.
const MAX_MAJOR_VERSION: u16 = 69;

/// A malformed or unsupported class-file byte stream.
///
/// Offsets refer to the enclosing buffer of the failing read, which for
/// attribute payloads is the payload itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The buffer ended before a required value.
    #[error("truncated class file at offset {at}")]
    Truncated {
        /// Byte offset of the failed read.
        at: usize,
    },
    /// The buffer does not start with the class-file magic number.
    #[error("bad magic number {magic:#010x}")]
    BadMagic {
        /// The value found in place of the magic number.
        magic: u32,
    },
    /// The class-file version is outside the supported range.
    #[error("unsupported class file version {major}.{minor}")]
    UnsupportedVersion {
        /// Major version number.
        major: u16,
        /// Minor version number.
        minor: u16,
    },
    /// An unknown constant-pool tag.
    #[error("unknown constant pool tag {tag} at offset {at}")]
    BadConstantTag {
        /// The unrecognized tag byte.
        tag: u8,
        /// Byte offset of the entry.
        at: usize,
    },
    /// A constant-pool index that is out of range or of the wrong kind.
    #[error("invalid constant pool index {index}")]
    BadConstantIndex {
        /// The offending index.
        index: u16,
    },
    /// A malformed type or method descriptor.
    #[error("malformed descriptor {descriptor:?}")]
    BadDescriptor {
        /// The descriptor text as found.
        descriptor: String,
    },
    /// A malformed generic signature.
    #[error("malformed generic signature {signature:?}")]
    BadSignature {
        /// The signature text as found.
        signature: String,
    },
    /// An unknown annotation element-value tag.
    #[error("unknown annotation element tag {tag} at offset {at}")]
    BadElementValue {
        /// The unrecognized tag byte.
        tag: u8,
        /// Byte offset of the element value.
        at: usize,
    },
    /// An unknown or malformed bytecode instruction.
    #[error("unknown opcode {opcode:#04x} at code offset {at}")]
    BadOpcode {
        /// The unrecognized opcode byte.
        opcode: u8,
        /// Offset within the method's code array.
        at: usize,
    },
}

/// Parses one class file into its raw structural record.
///
/// # Errors
///
/// Returns a [`ParseError`] when the buffer is not a well-formed class file
/// of a supported version. A failed parse never leaves partial state behind.
pub fn parse_class(bytes: &[u8]) -> Result<RawClassRecord, ParseError> {
    let mut cur = ByteCursor::new(bytes);

    let magic = cur.u32()?;
    if magic != MAGIC {
        return Err(ParseError::BadMagic { magic });
    }
    let minor = cur.u16()?;
    let major = cur.u16()?;
    if !(MIN_MAJOR_VERSION..=MAX_MAJOR_VERSION).contains(&major) {
        return Err(ParseError::UnsupportedVersion { major, minor });
    }

    let pool = ConstantPool::read(&mut cur)?;

    let access = AccessFlags(cur.u16()?);
    let this_class = cur.u16()?;
    let name = pool.required_class_name(this_class)?;

    let super_class = cur.u16()?;
    let superclass = if super_class == 0 {
        None
    } else {
        Some(pool.required_class_name(super_class)?)
    };

    let interface_count = cur.u16()?;
    let mut interfaces = Vec::with_capacity(usize::from(interface_count));
    for _ in 0..interface_count {
        interfaces.push(pool.required_class_name(cur.u16()?)?);
    }

    let field_count = cur.u16()?;
    let mut fields = Vec::with_capacity(usize::from(field_count));
    for _ in 0..field_count {
        fields.push(read_field(&mut cur, &pool)?);
    }

    let method_count = cur.u16()?;
    let mut methods = Vec::with_capacity(usize::from(method_count));
    for _ in 0..method_count {
        methods.push(read_method(&mut cur, &pool)?);
    }

    let class_attrs = ClassAttributes::read(&mut cur, &pool)?;

    Ok(RawClassRecord {
        name,
        superclass,
        interfaces,
        access,
        annotations: class_attrs.annotations,
        signature: class_attrs.signature,
        fields,
        methods,
        source_file: class_attrs.source_file,
    })
}

fn read_field(cur: &mut ByteCursor<'_>, pool: &ConstantPool) -> Result<RawField, ParseError> {
    let access = AccessFlags(cur.u16()?);
    let name = pool.utf8(cur.u16()?)?.to_owned();
    let raw_descriptor = pool.utf8(cur.u16()?)?.to_owned();
    descriptor::parse_field_descriptor(&raw_descriptor)?;
    let attrs = FieldAttributes::read(cur, pool)?;
    Ok(RawField {
        name,
        descriptor: raw_descriptor,
        access,
        annotations: attrs.annotations,
        signature: attrs.signature,
    })
}

fn read_method(cur: &mut ByteCursor<'_>, pool: &ConstantPool) -> Result<RawMethod, ParseError> {
    let access = AccessFlags(cur.u16()?);
    let name = pool.utf8(cur.u16()?)?.to_owned();
    let raw_descriptor = pool.utf8(cur.u16()?)?.to_owned();
    descriptor::parse_method_descriptor(&raw_descriptor)?;
    let attrs = MethodAttributes::read(cur, pool)?;
    Ok(RawMethod {
        name,
        descriptor: raw_descriptor,
        access,
        annotations: attrs.annotations,
        signature: attrs.signature,
        throws: attrs.throws,
        annotation_default: attrs.annotation_default,
        accesses: attrs.accesses,
        line: attrs.line,
    })
}
