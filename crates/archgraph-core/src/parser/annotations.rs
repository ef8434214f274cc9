//! Runtime annotation attribute decoding.
//!
//! Decodes `RuntimeVisibleAnnotations`, `RuntimeInvisibleAnnotations` and
//! `AnnotationDefault` payloads into [`RawAnnotation`] values. Element
//! values recurse on the structure declared in the class file itself.

use crate::raw::{AnnotationValue, RawAnnotation};

use super::descriptor::{parse_field_descriptor, JavaType};
use super::pool::ConstantPool;
use super::reader::ByteCursor;
use super::ParseError;

/// Reads one `annotation` structure.
pub(crate) fn read_annotation(
    cur: &mut ByteCursor<'_>,
    pool: &ConstantPool,
) -> Result<RawAnnotation, ParseError> {
    let type_index = cur.u16()?;
    let type_name = annotation_type_name(pool.utf8(type_index)?)?;
    let pair_count = cur.u16()?;
    let mut elements = Vec::with_capacity(usize::from(pair_count));
    for _ in 0..pair_count {
        let name_index = cur.u16()?;
        let name = pool.utf8(name_index)?.to_owned();
        let value = read_element_value(cur, pool)?;
        elements.push((name, value));
    }
    Ok(RawAnnotation { type_name, elements })
}

/// Reads a list of `annotation` structures prefixed by a `u16` count.
pub(crate) fn read_annotation_list(
    cur: &mut ByteCursor<'_>,
    pool: &ConstantPool,
) -> Result<Vec<RawAnnotation>, ParseError> {
    let count = cur.u16()?;
    let mut annotations = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        annotations.push(read_annotation(cur, pool)?);
    }
    Ok(annotations)
}

/// Reads one `element_value` structure.
///
/// Narrow primitive constants are stored widened to `int` in the pool, so
/// the truncating casts here recover the declared width.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn read_element_value(
    cur: &mut ByteCursor<'_>,
    pool: &ConstantPool,
) -> Result<AnnotationValue, ParseError> {
    let at = cur.position();
    let tag = cur.u8()?;
    let value = match tag {
        b'Z' => AnnotationValue::Boolean(pool.integer(cur.u16()?)? != 0),
        b'B' => AnnotationValue::Byte(pool.integer(cur.u16()?)? as i8),
        b'C' => {
            let code = pool.integer(cur.u16()?)? as u32;
            let ch = char::from_u32(code).ok_or(ParseError::BadElementValue { tag, at })?;
            AnnotationValue::Char(ch)
        }
        b'S' => AnnotationValue::Short(pool.integer(cur.u16()?)? as i16),
        b'I' => AnnotationValue::Int(pool.integer(cur.u16()?)?),
        b'J' => AnnotationValue::Long(pool.long(cur.u16()?)?),
        b'F' => AnnotationValue::Float(pool.float(cur.u16()?)?),
        b'D' => AnnotationValue::Double(pool.double(cur.u16()?)?),
        b's' => AnnotationValue::String(pool.utf8(cur.u16()?)?.to_owned()),
        b'e' => {
            let type_name = annotation_type_name(pool.utf8(cur.u16()?)?)?;
            let constant = pool.utf8(cur.u16()?)?.to_owned();
            AnnotationValue::EnumConstant { type_name, constant }
        }
        b'c' => AnnotationValue::ClassRef(class_literal_name(pool.utf8(cur.u16()?)?)?),
        b'@' => AnnotationValue::Nested(read_annotation(cur, pool)?),
        b'[' => {
            let count = cur.u16()?;
            let mut values = Vec::with_capacity(usize::from(count));
            for _ in 0..count {
                values.push(read_element_value(cur, pool)?);
            }
            AnnotationValue::Array(values)
        }
        _ => return Err(ParseError::BadElementValue { tag, at }),
    };
    Ok(value)
}

/// Converts an annotation type descriptor (`Lcom/example/Marker;`) into a
/// fully qualified name.
fn annotation_type_name(descriptor: &str) -> Result<String, ParseError> {
    match parse_field_descriptor(descriptor)? {
        JavaType::Class(name) => Ok(name),
        _ => Err(ParseError::BadDescriptor { descriptor: descriptor.to_owned() }),
    }
}

/// Converts a class literal descriptor into a display name.
///
/// `void.class` literals are encoded as the bare `V` descriptor; primitive
/// literals use their primitive tags.
fn class_literal_name(descriptor: &str) -> Result<String, ParseError> {
    if descriptor == "V" {
        return Ok("void".to_owned());
    }
    match parse_field_descriptor(descriptor)? {
        JavaType::Primitive(p) => Ok(p.name().to_owned()),
        JavaType::Class(name) => Ok(name),
        JavaType::Array { component, dims } => {
            let base = match *component {
                JavaType::Primitive(p) => p.name().to_owned(),
                JavaType::Class(name) => name,
                JavaType::Array { .. } => {
                    return Err(ParseError::BadDescriptor { descriptor: descriptor.to_owned() })
                }
            };
            let mut name = base;
            for _ in 0..dims {
                name.push_str("[]");
            }
            Ok(name)
        }
    }
}
