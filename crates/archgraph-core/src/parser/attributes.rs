//! Attribute section decoding for classes, fields and methods.
//!
//! Each owner reads its attribute list once, dispatching on the attribute
//! name. Unknown attributes are skipped by their declared length, which is
//! what keeps the parser compatible across class-file versions.

use crate::raw::{AnnotationValue, RawAccess, RawAnnotation};

use super::annotations::{read_annotation_list, read_element_value};
use super::bytecode::{scan_code, LineTable};
use super::pool::ConstantPool;
use super::reader::ByteCursor;
use super::signature::{
    parse_class_signature, parse_field_signature, parse_method_signature, ClassSignature,
    MethodSignature, TypeSig,
};
use super::ParseError;

/// Decoded class-level attributes.
#[derive(Default)]
pub(crate) struct ClassAttributes {
    pub annotations: Vec<RawAnnotation>,
    pub signature: Option<ClassSignature>,
    pub source_file: Option<String>,
}

/// Decoded field-level attributes.
#[derive(Default)]
pub(crate) struct FieldAttributes {
    pub annotations: Vec<RawAnnotation>,
    pub signature: Option<TypeSig>,
}

/// Decoded method-level attributes.
#[derive(Default)]
pub(crate) struct MethodAttributes {
    pub annotations: Vec<RawAnnotation>,
    pub signature: Option<MethodSignature>,
    pub throws: Vec<String>,
    pub annotation_default: Option<AnnotationValue>,
    pub accesses: Vec<RawAccess>,
    pub line: Option<u32>,
}

fn for_each_attribute(
    cur: &mut ByteCursor<'_>,
    pool: &ConstantPool,
    mut handle: impl FnMut(&str, &[u8]) -> Result<(), ParseError>,
) -> Result<(), ParseError> {
    let count = cur.u16()?;
    for _ in 0..count {
        let name_index = cur.u16()?;
        let length = cur.u32()? as usize;
        let payload = cur.bytes(length)?;
        let name = pool.utf8(name_index)?;
        handle(name, payload)?;
    }
    Ok(())
}

impl ClassAttributes {
    pub(crate) fn read(
        cur: &mut ByteCursor<'_>,
        pool: &ConstantPool,
    ) -> Result<Self, ParseError> {
        let mut attrs = Self::default();
        for_each_attribute(cur, pool, |name, payload| {
            let mut sub = ByteCursor::new(payload);
            match name {
                "Signature" => {
                    attrs.signature = Some(parse_class_signature(pool.utf8(sub.u16()?)?)?);
                }
                "SourceFile" => {
                    attrs.source_file = Some(pool.utf8(sub.u16()?)?.to_owned());
                }
                "RuntimeVisibleAnnotations" | "RuntimeInvisibleAnnotations" => {
                    attrs.annotations.extend(read_annotation_list(&mut sub, pool)?);
                }
                _ => {}
            }
            Ok(())
        })?;
        Ok(attrs)
    }
}

impl FieldAttributes {
    pub(crate) fn read(
        cur: &mut ByteCursor<'_>,
        pool: &ConstantPool,
    ) -> Result<Self, ParseError> {
        let mut attrs = Self::default();
        for_each_attribute(cur, pool, |name, payload| {
            let mut sub = ByteCursor::new(payload);
            match name {
                "Signature" => {
                    attrs.signature = Some(parse_field_signature(pool.utf8(sub.u16()?)?)?);
                }
                "RuntimeVisibleAnnotations" | "RuntimeInvisibleAnnotations" => {
                    attrs.annotations.extend(read_annotation_list(&mut sub, pool)?);
                }
                _ => {}
            }
            Ok(())
        })?;
        Ok(attrs)
    }
}

impl MethodAttributes {
    pub(crate) fn read(
        cur: &mut ByteCursor<'_>,
        pool: &ConstantPool,
    ) -> Result<Self, ParseError> {
        let mut attrs = Self::default();
        for_each_attribute(cur, pool, |name, payload| {
            let mut sub = ByteCursor::new(payload);
            match name {
                "Code" => {
                    let (accesses, line) = read_code(&mut sub, pool)?;
                    attrs.accesses = accesses;
                    attrs.line = line;
                }
                "Signature" => {
                    attrs.signature = Some(parse_method_signature(pool.utf8(sub.u16()?)?)?);
                }
                "Exceptions" => {
                    let count = sub.u16()?;
                    for _ in 0..count {
                        attrs.throws.push(pool.required_class_name(sub.u16()?)?);
                    }
                }
                "AnnotationDefault" => {
                    attrs.annotation_default = Some(read_element_value(&mut sub, pool)?);
                }
                "RuntimeVisibleAnnotations" | "RuntimeInvisibleAnnotations" => {
                    attrs.annotations.extend(read_annotation_list(&mut sub, pool)?);
                }
                _ => {}
            }
            Ok(())
        })?;
        Ok(attrs)
    }
}

/// Reads a `Code` attribute: the body's access sites and first source line.
fn read_code(
    cur: &mut ByteCursor<'_>,
    pool: &ConstantPool,
) -> Result<(Vec<RawAccess>, Option<u32>), ParseError> {
    cur.skip(4)?; // max_stack, max_locals
    let code_length = cur.u32()? as usize;
    let code = cur.bytes(code_length)?;
    let exception_entries = cur.u16()?;
    cur.skip(usize::from(exception_entries) * 8)?;

    let mut line_entries = Vec::new();
    for_each_attribute(cur, pool, |name, payload| {
        if name == "LineNumberTable" {
            let mut sub = ByteCursor::new(payload);
            let count = sub.u16()?;
            for _ in 0..count {
                let start_pc = sub.u16()?;
                let line = u32::from(sub.u16()?);
                line_entries.push((start_pc, line));
            }
        }
        Ok(())
    })?;

    let lines = LineTable::new(line_entries);
    let accesses = scan_code(code, pool, &lines)?;
    Ok((accesses, lines.first_line()))
}
