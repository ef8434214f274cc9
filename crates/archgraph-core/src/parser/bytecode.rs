//! Linear bytecode scan for access sites.
//!
//! Walks a method's `Code` array once, decoding only opcode shapes. The
//! scan never follows control flow; it extracts constant-pool references
//! from the instructions that encode class or member accesses and skips
//! everything else by operand length.

use crate::raw::{RawAccess, RawAccessKind, RawMemberRef};

use super::pool::ConstantPool;
use super::ParseError;

/// Sorted `LineNumberTable` entries for one method body.
#[derive(Debug, Default)]
pub(crate) struct LineTable {
    entries: Vec<(u16, u32)>,
}

impl LineTable {
    pub(crate) fn new(mut entries: Vec<(u16, u32)>) -> Self {
        entries.sort_by_key(|&(start_pc, _)| start_pc);
        Self { entries }
    }

    /// Source line covering the given bytecode offset.
    pub(crate) fn line_at(&self, pc: usize) -> Option<u32> {
        self.entries
            .iter()
            .take_while(|&&(start_pc, _)| usize::from(start_pc) <= pc)
            .last()
            .map(|&(_, line)| line)
    }

    /// First line of the method body.
    pub(crate) fn first_line(&self) -> Option<u32> {
        self.entries.iter().map(|&(_, line)| line).min()
    }
}

struct CodeCursor<'a> {
    code: &'a [u8],
    pos: usize,
}

impl<'a> CodeCursor<'a> {
    fn truncated(&self) -> ParseError {
        ParseError::Truncated { at: self.pos }
    }

    fn u8(&mut self) -> Result<u8, ParseError> {
        let b = *self.code.get(self.pos).ok_or_else(|| self.truncated())?;
        self.pos += 1;
        Ok(b)
    }

    fn u16(&mut self) -> Result<u16, ParseError> {
        let hi = self.u8()?;
        let lo = self.u8()?;
        Ok(u16::from_be_bytes([hi, lo]))
    }

    fn i32(&mut self) -> Result<i32, ParseError> {
        let b = [self.u8()?, self.u8()?, self.u8()?, self.u8()?];
        Ok(i32::from_be_bytes(b))
    }

    fn skip(&mut self, n: usize) -> Result<(), ParseError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.code.len())
            .ok_or_else(|| self.truncated())?;
        self.pos = end;
        Ok(())
    }
}

/// Scans a method's code array and returns its access sites in order.
pub(crate) fn scan_code(
    code: &[u8],
    pool: &ConstantPool,
    lines: &LineTable,
) -> Result<Vec<RawAccess>, ParseError> {
    let mut cur = CodeCursor { code, pos: 0 };
    let mut accesses = Vec::new();
    while cur.pos < code.len() {
        let pc = cur.pos;
        let opcode = cur.u8()?;
        match opcode {
            // getstatic / putstatic / getfield / putfield
            0xb2..=0xb5 => {
                let index = cur.u16()?;
                let kind = if opcode == 0xb2 || opcode == 0xb4 {
                    RawAccessKind::FieldRead
                } else {
                    RawAccessKind::FieldWrite
                };
                if let Some(member) = pool.member_ref(index)? {
                    accesses.push(member_access(kind, member, lines.line_at(pc)));
                }
            }
            // invokevirtual / invokespecial / invokestatic
            0xb6..=0xb8 => {
                let index = cur.u16()?;
                if let Some(member) = pool.member_ref(index)? {
                    let kind = if opcode == 0xb7 && member.name == "<init>" {
                        RawAccessKind::ConstructorCall
                    } else {
                        RawAccessKind::MethodCall
                    };
                    accesses.push(member_access(kind, member, lines.line_at(pc)));
                }
            }
            // invokeinterface: index, count, zero byte
            0xb9 => {
                let index = cur.u16()?;
                cur.skip(2)?;
                if let Some(member) = pool.member_ref(index)? {
                    accesses.push(member_access(
                        RawAccessKind::MethodCall,
                        member,
                        lines.line_at(pc),
                    ));
                }
            }
            // invokedynamic carries no owner class to attribute the call to
            0xba => cur.skip(4)?,
            // new: the matching constructor call carries the dependency
            0xbb => cur.skip(2)?,
            // anewarray
            0xbd => {
                let index = cur.u16()?;
                push_class_access(
                    &mut accesses,
                    RawAccessKind::ArrayComponent,
                    pool,
                    index,
                    lines.line_at(pc),
                )?;
            }
            // checkcast
            0xc0 => {
                let index = cur.u16()?;
                push_class_access(
                    &mut accesses,
                    RawAccessKind::TypeCast,
                    pool,
                    index,
                    lines.line_at(pc),
                )?;
            }
            // instanceof
            0xc1 => {
                let index = cur.u16()?;
                push_class_access(
                    &mut accesses,
                    RawAccessKind::InstanceOf,
                    pool,
                    index,
                    lines.line_at(pc),
                )?;
            }
            // multianewarray: index, dimension count
            0xc5 => {
                let index = cur.u16()?;
                cur.skip(1)?;
                push_class_access(
                    &mut accesses,
                    RawAccessKind::ArrayComponent,
                    pool,
                    index,
                    lines.line_at(pc),
                )?;
            }
            // tableswitch: pad to 4-byte alignment, default, low, high, jumps
            0xaa => {
                cur.skip((4 - (pc + 1) % 4) % 4)?;
                cur.skip(4)?;
                let low = cur.i32()?;
                let high = cur.i32()?;
                if high < low {
                    return Err(ParseError::BadOpcode { opcode, at: pc });
                }
                let jumps = (i64::from(high) - i64::from(low) + 1) * 4;
                let jumps = usize::try_from(jumps)
                    .map_err(|_| ParseError::BadOpcode { opcode, at: pc })?;
                cur.skip(jumps)?;
            }
            // lookupswitch: pad, default, npairs, pairs
            0xab => {
                cur.skip((4 - (pc + 1) % 4) % 4)?;
                cur.skip(4)?;
                let npairs = cur.i32()?;
                let pairs = usize::try_from(npairs)
                    .map_err(|_| ParseError::BadOpcode { opcode, at: pc })?
                    .checked_mul(8)
                    .ok_or(ParseError::BadOpcode { opcode, at: pc })?;
                cur.skip(pairs)?;
            }
            // wide: modified opcode plus widened operands
            0xc4 => {
                let widened = cur.u8()?;
                let extra = if widened == 0x84 { 4 } else { 2 };
                cur.skip(extra)?;
            }
            _ => {
                let len =
                    operand_len(opcode).ok_or(ParseError::BadOpcode { opcode, at: pc })?;
                cur.skip(len)?;
            }
        }
    }
    Ok(accesses)
}

fn member_access(
    kind: RawAccessKind,
    member: super::pool::MemberRefInfo,
    line: Option<u32>,
) -> RawAccess {
    RawAccess {
        kind,
        target_class: member.class_name,
        member: Some(RawMemberRef { name: member.name, descriptor: member.descriptor }),
        line,
    }
}

fn push_class_access(
    accesses: &mut Vec<RawAccess>,
    kind: RawAccessKind,
    pool: &ConstantPool,
    index: u16,
    line: Option<u32>,
) -> Result<(), ParseError> {
    // Primitive-only array constants carry no class reference.
    if let Some(target_class) = pool.class_name(index)? {
        accesses.push(RawAccess { kind, target_class, member: None, line });
    }
    Ok(())
}

/// Fixed operand byte count for opcodes without pool references the scan
/// cares about. `None` marks opcodes unknown to the format.
fn operand_len(opcode: u8) -> Option<usize> {
    let len = match opcode {
        // no operands: constants, stack ops, arithmetic, conversions,
        // compares, shorthand loads/stores, returns, array length, throw,
        // monitors
        0x00..=0x0f
        | 0x1a..=0x35
        | 0x3b..=0x83
        | 0x85..=0x98
        | 0xac..=0xb1
        | 0xbe
        | 0xbf
        | 0xc2
        | 0xc3 => 0,
        // single-byte operand: bipush, ldc, local loads/stores, ret,
        // newarray
        0x10 | 0x12 | 0x15..=0x19 | 0x36..=0x3a | 0xa9 | 0xbc => 1,
        // two-byte operand: sipush, ldc_w, ldc2_w, iinc, branches, jsr,
        // ifnull/ifnonnull
        0x11 | 0x13 | 0x14 | 0x84 | 0x99..=0xa8 | 0xc6 | 0xc7 => 2,
        // four-byte operand: goto_w, jsr_w
        0xc8 | 0xc9 => 4,
        _ => return None,
    };
    Some(len)
}
