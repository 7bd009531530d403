//! Class file parsing into the [`BinaryClass`] model.
//!
//! Parsing only extracts structural facts; no symbolic reference is resolved
//! here. Any class file version with a syntactically valid layout is
//! accepted, semantic legality is the rule set's concern.

mod constant_pool;
mod opcodes;
mod reader;

use byteorder::{BigEndian, ByteOrder};
use thiserror::Error;

use crate::descriptor;
use crate::model::{
    BinaryClass, ClassFlags, Field, FieldAccessKind, FieldFlags, Instruction, InvokeKind, Method,
    MethodFlags, TypeRefKind,
};
use constant_pool::ConstantPool;
use reader::ClassReader;

const MAGIC: u32 = 0xCAFE_BABE;

/// Structural failure while parsing class bytes.
///
/// Localized to the offending class; a verification run reports it as a
/// class-scoped finding and moves on.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("bad magic number 0x{0:08x}")]
    BadMagic(u32),
    #[error("unexpected end of class file at offset {0}")]
    UnexpectedEof(usize),
    #[error("unknown constant pool tag {tag} at index {index}")]
    UnknownPoolTag { tag: u8, index: u16 },
    #[error("constant pool index {0} out of range")]
    BadPoolIndex(u16),
    #[error("constant pool entry {index} is not a {expected}")]
    WrongPoolEntry { index: u16, expected: &'static str },
    #[error("code attribute truncated at offset {0}")]
    TruncatedCode(usize),
    #[error("unknown opcode 0x{opcode:02x} at offset {offset}")]
    UnknownOpcode { opcode: u8, offset: usize },
}

/// Parse one class file into its immutable structural model.
pub fn parse(bytes: &[u8]) -> Result<BinaryClass, ParseError> {
    let mut reader = ClassReader::new(bytes);

    let magic = reader.u32()?;
    if magic != MAGIC {
        return Err(ParseError::BadMagic(magic));
    }
    // Minor and major version: tolerated whatever they are.
    reader.skip(4)?;

    let pool = ConstantPool::parse(&mut reader)?;

    let flags = ClassFlags::from_bits_truncate(reader.u16()?);
    let this_class = reader.u16()?;
    let name = pool.class_name(this_class)?.to_string();
    let super_index = reader.u16()?;
    let super_name = pool.optional_class_name(super_index)?.map(str::to_string);

    let interface_count = reader.u16()?;
    let mut interfaces = Vec::with_capacity(interface_count as usize);
    for _ in 0..interface_count {
        interfaces.push(pool.class_name(reader.u16()?)?.to_string());
    }

    let field_count = reader.u16()?;
    let mut fields = Vec::with_capacity(field_count as usize);
    for _ in 0..field_count {
        let field_flags = FieldFlags::from_bits_truncate(reader.u16()?);
        let field_name = pool.utf8(reader.u16()?)?.to_string();
        let field_descriptor = pool.utf8(reader.u16()?)?.to_string();
        skip_attributes(&mut reader)?;
        fields.push(Field {
            name: field_name,
            descriptor: field_descriptor,
            flags: field_flags,
        });
    }

    let method_count = reader.u16()?;
    let mut methods = Vec::with_capacity(method_count as usize);
    for _ in 0..method_count {
        methods.push(parse_method(&mut reader, &pool)?);
    }

    // Class-level attributes carry nothing this model keeps.
    skip_attributes(&mut reader)?;

    Ok(BinaryClass {
        name,
        super_name,
        interfaces,
        flags,
        fields,
        methods,
    })
}

fn skip_attributes(reader: &mut ClassReader<'_>) -> Result<(), ParseError> {
    let count = reader.u16()?;
    for _ in 0..count {
        // attribute_name_index
        reader.skip(2)?;
        let length = reader.u32()? as usize;
        reader.skip(length)?;
    }
    Ok(())
}

fn parse_method(reader: &mut ClassReader<'_>, pool: &ConstantPool) -> Result<Method, ParseError> {
    let flags = MethodFlags::from_bits_truncate(reader.u16()?);
    let name = pool.utf8(reader.u16()?)?.to_string();
    let descriptor = pool.utf8(reader.u16()?)?.to_string();

    let mut instructions = Vec::new();
    let mut declared_exceptions = Vec::new();
    let mut catch_types = Vec::new();
    let mut local_variable_types = Vec::new();

    let attribute_count = reader.u16()?;
    for _ in 0..attribute_count {
        let attribute_name = pool.utf8(reader.u16()?)?;
        let attribute_length = reader.u32()? as usize;
        match attribute_name {
            "Code" => {
                let data = reader.bytes(attribute_length)?;
                let code = parse_code(data, pool)?;
                instructions = code.instructions;
                catch_types = code.catch_types;
                local_variable_types = code.local_variable_types;
            }
            "Exceptions" => {
                let data = reader.bytes(attribute_length)?;
                let mut inner = ClassReader::new(data);
                let count = inner.u16()?;
                for _ in 0..count {
                    declared_exceptions.push(pool.class_name(inner.u16()?)?.to_string());
                }
            }
            _ => reader.skip(attribute_length)?,
        }
    }

    Ok(Method {
        name,
        descriptor,
        flags,
        instructions,
        declared_exceptions,
        catch_types,
        local_variable_types,
    })
}

struct CodeFacts {
    instructions: Vec<Instruction>,
    catch_types: Vec<String>,
    local_variable_types: Vec<String>,
}

fn parse_code(data: &[u8], pool: &ConstantPool) -> Result<CodeFacts, ParseError> {
    let mut reader = ClassReader::new(data);
    // max_stack, max_locals: no linkage relevance.
    reader.skip(4)?;
    let code_length = reader.u32()? as usize;
    let code = reader.bytes(code_length)?;
    let instructions = extract_instructions(code, pool)?;

    let mut catch_types = Vec::new();
    let handler_count = reader.u16()?;
    for _ in 0..handler_count {
        // start_pc, end_pc, handler_pc.
        reader.skip(6)?;
        let catch_type = reader.u16()?;
        if let Some(class) = pool.optional_class_name(catch_type)? {
            let class = class.to_string();
            if !catch_types.contains(&class) {
                catch_types.push(class);
            }
        }
    }

    let mut local_variable_types = Vec::new();
    let attribute_count = reader.u16()?;
    for _ in 0..attribute_count {
        let attribute_name = pool.utf8(reader.u16()?)?;
        let attribute_length = reader.u32()? as usize;
        match attribute_name {
            "LocalVariableTable" => {
                let data = reader.bytes(attribute_length)?;
                let mut inner = ClassReader::new(data);
                let count = inner.u16()?;
                for _ in 0..count {
                    // start_pc, length, name_index.
                    inner.skip(6)?;
                    let variable_descriptor = pool.utf8(inner.u16()?)?;
                    inner.skip(2)?;
                    if let Some(class) = descriptor::element_class(variable_descriptor) {
                        let class = class.to_string();
                        if !local_variable_types.contains(&class) {
                            local_variable_types.push(class);
                        }
                    }
                }
            }
            _ => reader.skip(attribute_length)?,
        }
    }

    Ok(CodeFacts {
        instructions,
        catch_types,
        local_variable_types,
    })
}

/// Walk the bytecode and keep only instructions carrying symbolic references.
fn extract_instructions(code: &[u8], pool: &ConstantPool) -> Result<Vec<Instruction>, ParseError> {
    let mut instructions = Vec::new();
    let mut offset = 0usize;
    while offset < code.len() {
        let opcode = code[offset];
        let length = opcodes::instruction_length(code, offset)?;

        let invoke_kind = match opcode {
            opcodes::INVOKEVIRTUAL => Some(InvokeKind::Virtual),
            opcodes::INVOKESPECIAL => Some(InvokeKind::Special),
            opcodes::INVOKESTATIC => Some(InvokeKind::Static),
            opcodes::INVOKEINTERFACE => Some(InvokeKind::Interface),
            _ => None,
        };
        let field_kind = match opcode {
            opcodes::GETSTATIC => Some(FieldAccessKind::GetStatic),
            opcodes::PUTSTATIC => Some(FieldAccessKind::PutStatic),
            opcodes::GETFIELD => Some(FieldAccessKind::GetField),
            opcodes::PUTFIELD => Some(FieldAccessKind::PutField),
            _ => None,
        };
        let type_kind = match opcode {
            opcodes::NEW => Some(TypeRefKind::New),
            opcodes::CHECKCAST => Some(TypeRefKind::CheckCast),
            opcodes::INSTANCEOF => Some(TypeRefKind::InstanceOf),
            opcodes::ANEWARRAY => Some(TypeRefKind::ANewArray),
            opcodes::MULTIANEWARRAY => Some(TypeRefKind::MultiANewArray),
            _ => None,
        };

        if let Some(kind) = invoke_kind {
            let (owner, name, descriptor) = pool.member_ref(operand_index(code, offset))?;
            instructions.push(Instruction::InvokeMethod {
                owner: owner.to_string(),
                name: name.to_string(),
                descriptor: descriptor.to_string(),
                kind,
            });
        } else if let Some(kind) = field_kind {
            let (owner, name, descriptor) = pool.member_ref(operand_index(code, offset))?;
            instructions.push(Instruction::FieldAccess {
                owner: owner.to_string(),
                name: name.to_string(),
                descriptor: descriptor.to_string(),
                kind,
            });
        } else if let Some(kind) = type_kind {
            let raw = pool.class_name(operand_index(code, offset))?;
            // Primitive array allocations carry no class reference.
            if let Some(class) = descriptor::class_entry_reference(raw) {
                instructions.push(Instruction::TypeReference {
                    class_name: class.to_string(),
                    kind,
                });
            }
        }

        offset += length;
    }
    Ok(instructions)
}

/// Constant pool index operand of a reference instruction. The instruction
/// length was validated beforehand, so the operand bytes are present.
fn operand_index(code: &[u8], offset: usize) -> u16 {
    BigEndian::read_u16(&code[offset + 1..offset + 3])
}
