use super::{DecodedCode, Instruction, Opcode};
use crate::jvm::class_graph::TypeSystem;
use crate::jvm::pool::{ConstantPool, MemberRef};
use crate::jvm::well_known;

/// Number of instructions in the assertion initialization sequence
const SEQUENCE_LENGTH: usize = 7;

/// Skip over the `$assertionsDisabled` initialization at the start of a static initializer
///
/// `javac` starts the static initializer of a class using `assert` with:
///
/// ```text
/// 0: ldc            <this class>
/// 1: invokevirtual  java/lang/Class.desiredAssertionStatus:()Z
/// 2: ifne           5
/// 3: iconst_1
/// 4: goto           6
/// 5: iconst_0
/// 6: putstatic      <this class>.$assertionsDisabled:Z
/// ```
///
/// If the code starts with exactly that sequence, nothing else jumps into it, no exception
/// handler covers it, and nothing else stores to the field, the first instruction is replaced
/// with a jump past the sequence. The caller is then expected to give the field the constant
/// value `true`.
///
/// `is_static_final` tells whether the class declares a static final field of the given name
/// (with descriptor `Z`). Returns the field that was being initialized.
pub fn remove_assertion_init<'p, T: TypeSystem>(
    code: &mut DecodedCode,
    pool: &'p ConstantPool<T>,
    this_class: &str,
    is_static_final: impl Fn(&str) -> bool,
) -> Option<&'p MemberRef> {
    let field = match_sequence(&code.instructions, pool, this_class)?;
    if !is_static_final(&field.name) {
        return None;
    }

    for instruction in &code.instructions[SEQUENCE_LENGTH..] {
        let jumps_in = instruction
            .targets()
            .into_iter()
            .any(|target| target > 0 && (target as usize) < SEQUENCE_LENGTH);
        let stores_field = instruction.opcode == Opcode::PutStatic
            && pool.fieldref(instruction.arg1 as u16).map_or(false, |other| {
                other.member.class_name == field.class_name
                    && other.member.name == field.name
                    && other.member.descriptor == field.descriptor
            });
        if jumps_in || stores_field {
            return None;
        }
    }
    for handler in &code.exception_table {
        if handler.start_index < SEQUENCE_LENGTH
            || (handler.handler_index > 0 && handler.handler_index < SEQUENCE_LENGTH)
        {
            return None;
        }
    }

    log::trace!("Removing assertion initialization of {}.{}", this_class, field.name);
    let first = &mut code.instructions[0];
    *first = Instruction {
        arg1: SEQUENCE_LENGTH as i32,
        ..Instruction::new(first.pc, Opcode::Goto)
    };
    Some(field)
}

fn match_sequence<'p, T: TypeSystem>(
    instructions: &[Instruction],
    pool: &'p ConstantPool<T>,
    this_class: &str,
) -> Option<&'p MemberRef> {
    // The sequence plus at least the terminating `nop`
    if instructions.len() <= SEQUENCE_LENGTH {
        return None;
    }
    let is = |index: usize, opcode: Opcode, arg1: i32| {
        instructions[index].opcode == opcode && instructions[index].arg1 == arg1
    };

    let ldc = &instructions[0];
    if ldc.opcode != Opcode::Ldc || !pool.is_class(ldc.arg1 as u16) {
        return None;
    }

    let invoke = &instructions[1];
    if invoke.opcode != Opcode::InvokeVirtual {
        return None;
    }
    let method = &pool.methodref(invoke.arg1 as u16)?.member;
    if method.class_name != well_known::CLASS
        || method.name != "desiredAssertionStatus"
        || method.descriptor != "()Z"
    {
        return None;
    }

    if !(is(2, Opcode::IfNe, 5) && is(3, Opcode::IConst, 1) && is(4, Opcode::Goto, 6) && is(5, Opcode::IConst, 0)) {
        return None;
    }

    let store = &instructions[6];
    if store.opcode != Opcode::PutStatic {
        return None;
    }
    let field = &pool.fieldref(store.arg1 as u16)?.member;
    if field.class_name != this_class || field.descriptor != "Z" {
        return None;
    }
    Some(field)
}
