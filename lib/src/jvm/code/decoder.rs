use super::{decode_opcode, Instruction, Opcode, OperandFormat, SwitchTable};
use crate::jvm::class_file::{AttributeKind, AttributeReader, ClassConstantIndex};
use crate::jvm::class_graph::TypeSystem;
use crate::jvm::pool::ConstantPool;
use crate::jvm::{to_dotted, Error, MethodDescriptor, ParseDescriptor, ParseOptions, VerifyError};
use crate::util::{Interned, ScratchPool};
use byteorder::{BigEndian, ReadBytesExt};
use std::io::Cursor;

thread_local! {
    /// Instructions are accumulated here before being copied out into a right-sized vector
    static SCRATCH: ScratchPool<Instruction> = ScratchPool::new();
}

/// Largest code array a method may have
const MAX_CODE_LENGTH: u32 = 65535;

/// Decoded `Code` attribute of a method
#[derive(Clone, Debug)]
pub struct Code {
    pub max_stack: u16,
    pub max_locals: u16,

    /// Instructions, or the reason they could not be decoded
    pub body: CodeBody,

    /// Local variable slot holding each argument (starting with the receiver, for instance
    /// methods)
    pub arg_map: Vec<u16>,

    /// Only decoded under [`ParseOptions::LINE_NUMBER_TABLE`]
    pub line_numbers: Option<Vec<LineNumber>>,

    /// Only decoded under [`ParseOptions::LOCAL_VARIABLE_TABLE`]
    pub local_variables: Option<Vec<LocalVariable>>,
}

/// Method body, which may be broken in ways that only matter once something tries to use it
#[derive(Clone, Debug)]
pub enum CodeBody {
    Decoded(DecodedCode),
    Invalid(VerifyError),
}

#[derive(Clone, Debug)]
pub struct DecodedCode {
    /// Decoded instructions, followed by a `nop` whose `pc` is the code length
    pub instructions: Vec<Instruction>,

    pub exception_table: Vec<ExceptionEntry>,
}

/// Exception handler, with instruction indices instead of byte offsets
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ExceptionEntry {
    pub start_index: usize,

    /// Index of the last instruction covered (inclusive)
    pub end_index: usize,

    pub handler_index: usize,

    /// Missing for `finally` handlers
    pub catch_type: Option<ClassConstantIndex>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LineNumber {
    pub start_pc: u16,
    pub line_number: u16,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LocalVariable {
    pub start_pc: u16,
    pub length: u16,
    pub name: Interned,

    /// Field descriptor, with `.` separators
    pub descriptor: String,
    pub index: u16,
}

/// Exception table entry as it appears in the class file
struct RawHandler {
    start_pc: u16,
    end_pc: u16,
    handler_pc: u16,
    catch_type: Option<ClassConstantIndex>,
}

impl Code {
    /// Decode the payload of a `Code` attribute
    ///
    /// Structural problems (bad lengths, branches into the middle of instructions, bad exception
    /// table ranges) are errors. Bytes that do not decode into instructions are not: the body is
    /// kept as [`CodeBody::Invalid`] instead. Class constants referenced from the code get marked
    /// as needing to be linked.
    pub fn decode<T: TypeSystem>(
        info: &[u8],
        pool: &mut ConstantPool<T>,
        method_name: &str,
        descriptor: &str,
        is_static: bool,
        options: ParseOptions,
    ) -> Result<Code, Error> {
        let mut reader = AttributeReader::new(info);
        let max_stack = reader.u16()?;
        let max_locals = reader.u16()?;
        let code_length = reader.u32()?;
        if code_length == 0 || code_length > MAX_CODE_LENGTH {
            return Err(Error::format(format!(
                "Invalid method Code length {}",
                code_length
            )));
        }
        let bytecode = reader.bytes(code_length as usize)?;

        let decoded = SCRATCH.with(|scratch| {
            let mut instructions = scratch.take(bytecode.len() + 1);
            decode_instructions(bytecode, &mut instructions)
                .map(|()| instructions.drain(..).collect::<Vec<Instruction>>())
        });

        let exception_count = reader.u16()?;
        let mut handlers = Vec::with_capacity(exception_count as usize);
        for _ in 0..exception_count {
            let start_pc = reader.u16()?;
            let end_pc = reader.u16()?;
            let handler_pc = reader.u16()?;
            let catch_type = reader.u16()?;
            if start_pc >= end_pc
                || end_pc as u32 > code_length
                || handler_pc as u32 >= code_length
                || (catch_type != 0 && !pool.is_class(catch_type))
            {
                return Err(Error::format(format!(
                    "Illegal exception table in {}{}",
                    method_name, descriptor
                )));
            }
            let catch_type = if catch_type == 0 {
                None
            } else {
                pool.mark_link_required(catch_type);
                Some(ClassConstantIndex::from(catch_type))
            };
            handlers.push(RawHandler {
                start_pc,
                end_pc,
                handler_pc,
                catch_type,
            });
        }

        let mut line_numbers = None;
        let mut local_variables = None;
        let attribute_count = reader.u16()?;
        for _ in 0..attribute_count {
            let attribute = reader.attribute()?;
            let kind = AttributeKind::from_name(pool.utf8(attribute.name_index)?);
            match kind {
                AttributeKind::LineNumberTable
                    if options.contains(ParseOptions::LINE_NUMBER_TABLE) =>
                {
                    line_numbers = Some(read_line_numbers(&attribute.info, code_length)?);
                }
                AttributeKind::LocalVariableTable
                    if options.contains(ParseOptions::LOCAL_VARIABLE_TABLE) =>
                {
                    local_variables = Some(read_local_variables(&attribute.info, pool)?);
                }
                _ => (),
            }
        }
        reader.expect_end("Code")?;

        let arg_map = argument_map(descriptor, is_static, max_locals)?;

        let body = match decoded {
            Ok(mut instructions) => {
                let offset_map = offset_map(&instructions, code_length);
                for instruction in &mut instructions {
                    instruction.map_targets(|target| {
                        match offset_map.get(target as usize) {
                            Some(index) if target >= 0 && (target as u32) < code_length && *index >= 0 => {
                                Ok(*index)
                            }
                            _ => Err(Error::format("Illegal target of jump or branch")),
                        }
                    })?;
                    if instruction.opcode.has_constant_operand() {
                        pool.mark_link_required(instruction.arg1 as u16);
                    }
                }

                match map_exception_table(&handlers, &offset_map) {
                    Ok(exception_table) => CodeBody::Decoded(DecodedCode {
                        instructions,
                        exception_table,
                    }),
                    Err(error) => CodeBody::Invalid(error),
                }
            }
            Err(error) => CodeBody::Invalid(error),
        };
        if let CodeBody::Invalid(error) = &body {
            log::debug!("Invalid code in {}{}: {}", method_name, descriptor, error);
        }

        Ok(Code {
            max_stack,
            max_locals,
            body,
            arg_map,
            line_numbers,
            local_variables,
        })
    }

    /// Placeholder for a method that should have had code, but didn't
    pub fn missing(error: VerifyError) -> Code {
        Code {
            max_stack: 0,
            max_locals: 0,
            body: CodeBody::Invalid(error),
            arg_map: vec![],
            line_numbers: None,
            local_variables: None,
        }
    }

    /// Decoded body, or the verification error that using this body should produce
    pub fn decoded(&self) -> Result<&DecodedCode, &VerifyError> {
        match &self.body {
            CodeBody::Decoded(decoded) => Ok(decoded),
            CodeBody::Invalid(error) => Err(error),
        }
    }

    pub fn decoded_mut(&mut self) -> Option<&mut DecodedCode> {
        match &mut self.body {
            CodeBody::Decoded(decoded) => Some(decoded),
            CodeBody::Invalid(_) => None,
        }
    }

    pub fn verify_error(&self) -> Option<&VerifyError> {
        self.decoded().err()
    }
}

/// Map from byte offset to instruction index (`-1` where no instruction starts)
///
/// Has an entry for the code length itself, which maps to the terminating `nop`.
fn offset_map(instructions: &[Instruction], code_length: u32) -> Vec<i32> {
    let mut map = vec![-1; code_length as usize + 1];
    for (index, instruction) in instructions.iter().enumerate() {
        map[instruction.pc as usize] = index as i32;
    }
    map
}

fn map_exception_table(
    handlers: &[RawHandler],
    offset_map: &[i32],
) -> Result<Vec<ExceptionEntry>, VerifyError> {
    handlers
        .iter()
        .map(|handler| {
            let start = offset_map[handler.start_pc as usize];
            let end = offset_map[handler.end_pc as usize];
            let target = offset_map[handler.handler_pc as usize];
            if start < 0 || end < 0 || target < 0 {
                return Err(VerifyError::new(format!(
                    "Illegal exception table: {}:{}:{}",
                    handler.start_pc, handler.end_pc, handler.handler_pc
                )));
            }
            Ok(ExceptionEntry {
                start_index: start as usize,
                end_index: end as usize - 1,
                handler_index: target as usize,
                catch_type: handler.catch_type,
            })
        })
        .collect()
}

/// Local variable slot of every argument
fn argument_map(descriptor: &str, is_static: bool, max_locals: u16) -> Result<Vec<u16>, Error> {
    let method = MethodDescriptor::<String>::parse(descriptor)
        .map_err(|_| Error::format(format!("Invalid method signature {}", descriptor)))?;

    let mut arg_map = Vec::with_capacity(method.parameters.len() + 1);
    let mut slot: usize = 0;
    if !is_static {
        arg_map.push(0);
        slot += 1;
    }
    for parameter in &method.parameters {
        arg_map.push(slot as u16);
        slot += parameter.width();
    }
    if method.parameter_length(!is_static) > max_locals as usize {
        return Err(Error::format("Arguments can't fit into locals"));
    }
    Ok(arg_map)
}

fn read_line_numbers(info: &[u8], code_length: u32) -> Result<Vec<LineNumber>, Error> {
    let mut reader = AttributeReader::new(info);
    let count = reader.u16()?;
    let mut line_numbers = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let start_pc = reader.u16()?;
        let line_number = reader.u16()?;
        if start_pc as u32 >= code_length {
            return Err(Error::format("LineNumberTable has invalid pc"));
        }
        line_numbers.push(LineNumber {
            start_pc,
            line_number,
        });
    }
    reader.expect_end("LineNumberTable")?;
    Ok(line_numbers)
}

/// Trailing bytes are tolerated here, since some compilers emit them
fn read_local_variables<T: TypeSystem>(
    info: &[u8],
    pool: &ConstantPool<T>,
) -> Result<Vec<LocalVariable>, Error> {
    let mut reader = AttributeReader::new(info);
    let count = reader.u16()?;
    let mut local_variables = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let start_pc = reader.u16()?;
        let length = reader.u16()?;
        let name = pool.utf8(reader.index()?)?.clone();
        let descriptor = to_dotted(pool.utf8(reader.index()?)?);
        let index = reader.u16()?;
        local_variables.push(LocalVariable {
            start_pc,
            length,
            name,
            descriptor,
            index,
        });
    }
    Ok(local_variables)
}

/// Cursor over raw bytecode, where running out of bytes is a verification failure
struct BytecodeReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> BytecodeReader<'a> {
    fn new(bytecode: &'a [u8]) -> BytecodeReader<'a> {
        BytecodeReader {
            cursor: Cursor::new(bytecode),
        }
    }

    fn pc(&self) -> usize {
        self.cursor.position() as usize
    }

    fn is_at_end(&self) -> bool {
        self.pc() >= self.cursor.get_ref().len()
    }

    fn remaining(&self) -> usize {
        self.cursor.get_ref().len().saturating_sub(self.pc())
    }

    fn truncated(&self) -> VerifyError {
        VerifyError::new(format!("Truncated instruction at offset {}", self.pc()))
    }

    fn u8(&mut self) -> Result<u8, VerifyError> {
        self.cursor.read_u8().map_err(|_| self.truncated())
    }

    fn i8(&mut self) -> Result<i8, VerifyError> {
        self.cursor.read_i8().map_err(|_| self.truncated())
    }

    fn u16(&mut self) -> Result<u16, VerifyError> {
        self.cursor.read_u16::<BigEndian>().map_err(|_| self.truncated())
    }

    fn i16(&mut self) -> Result<i16, VerifyError> {
        self.cursor.read_i16::<BigEndian>().map_err(|_| self.truncated())
    }

    fn i32(&mut self) -> Result<i32, VerifyError> {
        self.cursor.read_i32::<BigEndian>().map_err(|_| self.truncated())
    }

    /// Skip the padding that aligns switch operands to a multiple of 4 from the code start
    fn align(&mut self) -> Result<(), VerifyError> {
        while self.pc() % 4 != 0 {
            self.u8()?;
        }
        Ok(())
    }
}

/// Decode raw bytecode, leaving branch targets as absolute byte offsets
fn decode_instructions(
    bytecode: &[u8],
    instructions: &mut Vec<Instruction>,
) -> Result<(), VerifyError> {
    use OperandFormat as F;

    let mut reader = BytecodeReader::new(bytecode);
    while !reader.is_at_end() {
        let pc = reader.pc();
        let byte = reader.u8()?;
        let (opcode, format) = decode_opcode(byte).ok_or_else(|| {
            VerifyError::new(format!("Invalid opcode 0x{:02x} at offset {}", byte, pc))
        })?;

        let mut instruction = Instruction::new(pc as u16, opcode);
        let pc = pc as i32;
        match format {
            F::None => (),
            F::Implicit(arg) => instruction.arg1 = arg,
            F::LocalVar | F::ConstantU8 | F::NewArray => instruction.arg1 = reader.u8()? as i32,
            F::Byte => instruction.arg1 = reader.i8()? as i32,
            F::Short => instruction.arg1 = reader.i16()? as i32,
            F::Constant => instruction.arg1 = reader.u16()? as i32,
            F::Iinc => {
                instruction.arg1 = reader.u8()? as i32;
                instruction.arg2 = reader.i8()? as i32;
            }
            F::InvokeInterface => {
                instruction.arg1 = reader.u16()? as i32;
                instruction.arg2 = reader.u8()? as i32;
                reader.u8()?;
            }
            F::InvokeDynamic => {
                instruction.arg1 = reader.u16()? as i32;
                reader.u16()?;
            }
            F::MultiANewArray => {
                instruction.arg1 = reader.u16()? as i32;
                instruction.arg2 = reader.u8()? as i32;
            }
            F::Branch => instruction.arg1 = pc + reader.i16()? as i32,
            F::BranchWide => instruction.arg1 = pc.saturating_add(reader.i32()?),
            F::TableSwitch => {
                reader.align()?;
                let default = pc.saturating_add(reader.i32()?);
                let low = reader.i32()?;
                let high = reader.i32()?;
                if low > high {
                    return Err(VerifyError::new(format!(
                        "Invalid tableswitch at offset {}: low {} > high {}",
                        pc, low, high
                    )));
                }
                let count = high as i64 - low as i64 + 1;
                let mut entries = Vec::with_capacity((count as usize).min(reader.remaining() / 4));
                for offset in 0..count {
                    entries.push(((low as i64 + offset) as i32, pc.saturating_add(reader.i32()?)));
                }
                instruction.switch = Some(Box::new(SwitchTable { default, entries }));
            }
            F::LookupSwitch => {
                reader.align()?;
                let default = pc.saturating_add(reader.i32()?);
                let npairs = reader.i32()?;
                if npairs < 0 {
                    return Err(VerifyError::new(format!(
                        "Invalid lookupswitch at offset {}: {} pairs",
                        pc, npairs
                    )));
                }
                let mut entries = Vec::with_capacity((npairs as usize).min(reader.remaining() / 8));
                for _ in 0..npairs {
                    let key = reader.i32()?;
                    entries.push((key, pc.saturating_add(reader.i32()?)));
                }
                instruction.switch = Some(Box::new(SwitchTable { default, entries }));
            }
            F::Wide => {
                let modified = reader.u8()?;
                match decode_opcode(modified) {
                    Some((opcode, F::LocalVar)) => {
                        instruction.opcode = opcode;
                        instruction.arg1 = reader.u16()? as i32;
                    }
                    Some((opcode, F::Iinc)) => {
                        instruction.opcode = opcode;
                        instruction.arg1 = reader.u16()? as i32;
                        instruction.arg2 = reader.i16()? as i32;
                    }
                    _ => {
                        return Err(VerifyError::new(format!(
                            "Invalid wide prefix on opcode 0x{:02x} at offset {}",
                            modified, pc
                        )))
                    }
                }
            }
        }
        instructions.push(instruction);
    }

    instructions.push(Instruction::new(bytecode.len() as u16, Opcode::Nop));
    Ok(())
}
