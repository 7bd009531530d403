//! Opcode constants and sizing for walking `Code` attribute bytes.

use super::ParseError;

pub(crate) const GETSTATIC: u8 = 0xb2;
pub(crate) const PUTSTATIC: u8 = 0xb3;
pub(crate) const GETFIELD: u8 = 0xb4;
pub(crate) const PUTFIELD: u8 = 0xb5;
pub(crate) const INVOKEVIRTUAL: u8 = 0xb6;
pub(crate) const INVOKESPECIAL: u8 = 0xb7;
pub(crate) const INVOKESTATIC: u8 = 0xb8;
pub(crate) const INVOKEINTERFACE: u8 = 0xb9;
pub(crate) const INVOKEDYNAMIC: u8 = 0xba;
pub(crate) const NEW: u8 = 0xbb;
pub(crate) const ANEWARRAY: u8 = 0xbd;
pub(crate) const CHECKCAST: u8 = 0xc0;
pub(crate) const INSTANCEOF: u8 = 0xc1;
pub(crate) const MULTIANEWARRAY: u8 = 0xc5;

const BIPUSH: u8 = 0x10;
const SIPUSH: u8 = 0x11;
const LDC: u8 = 0x12;
const LDC_W: u8 = 0x13;
const LDC2_W: u8 = 0x14;
const IINC: u8 = 0x84;
const TABLESWITCH: u8 = 0xaa;
const LOOKUPSWITCH: u8 = 0xab;
const RET: u8 = 0xa9;
const NEWARRAY: u8 = 0xbc;
const WIDE: u8 = 0xc4;
const GOTO_W: u8 = 0xc8;
const JSR_W: u8 = 0xc9;

/// Total byte length of the instruction starting at `offset`, operands included.
pub(crate) fn instruction_length(code: &[u8], offset: usize) -> Result<usize, ParseError> {
    let opcode = code[offset];
    let length = match opcode {
        BIPUSH | LDC | RET | NEWARRAY => 2,
        0x15..=0x19 | 0x36..=0x3a => 2,
        SIPUSH | LDC_W | LDC2_W | IINC => 3,
        0x99..=0xa8 | 0xc6 | 0xc7 => 3,
        GETSTATIC..=INVOKESTATIC | NEW | ANEWARRAY | CHECKCAST | INSTANCEOF => 3,
        MULTIANEWARRAY => 4,
        INVOKEINTERFACE | INVOKEDYNAMIC | GOTO_W | JSR_W => 5,
        WIDE => {
            let widened = *code
                .get(offset + 1)
                .ok_or(ParseError::TruncatedCode(offset))?;
            if widened == IINC { 6 } else { 4 }
        }
        TABLESWITCH => {
            let base = offset + 1 + switch_padding(offset);
            let low = read_i32(code, base + 4)?;
            let high = read_i32(code, base + 8)?;
            let entries = high
                .checked_sub(low)
                .and_then(|span| span.checked_add(1))
                .filter(|entries| *entries >= 0)
                .ok_or(ParseError::TruncatedCode(offset))?;
            base - offset + 12 + entries as usize * 4
        }
        LOOKUPSWITCH => {
            let base = offset + 1 + switch_padding(offset);
            let npairs = read_i32(code, base + 4)?;
            if npairs < 0 {
                return Err(ParseError::TruncatedCode(offset));
            }
            base - offset + 8 + npairs as usize * 8
        }
        0x00..=0x0f | 0x1a..=0x35 | 0x3b..=0x83 | 0x85..=0x98 | 0xac..=0xb1 | 0xbe | 0xbf
        | 0xc2 | 0xc3 => 1,
        opcode => return Err(ParseError::UnknownOpcode { opcode, offset }),
    };
    if offset + length > code.len() {
        return Err(ParseError::TruncatedCode(offset));
    }
    Ok(length)
}

/// Alignment padding after a `tableswitch`/`lookupswitch` opcode.
fn switch_padding(offset: usize) -> usize {
    (4 - (offset + 1) % 4) % 4
}

fn read_i32(code: &[u8], offset: usize) -> Result<i32, ParseError> {
    let bytes: [u8; 4] = code
        .get(offset..offset + 4)
        .and_then(|slice| slice.try_into().ok())
        .ok_or(ParseError::TruncatedCode(offset))?;
    Ok(i32::from_be_bytes(bytes))
}
