use super::Opcode;

/// Decoded instruction
///
/// The meaning of the operands depends on the opcode:
///
///   - branches: `arg1` is the index of the target instruction
///   - constants and member accesses: `arg1` is the constant pool index
///   - locals: `arg1` is the slot (and for `iinc`, `arg2` is the increment)
///   - `iconst`: `arg1` is the value
///   - `invokeinterface`: `arg2` is the argument count
///   - `multianewarray`: `arg2` is the number of dimensions
///   - `newarray`: `arg1` is the array type code
///
/// Switches keep their targets in [`Instruction::switch`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    /// Byte offset of the instruction in the original code
    pub pc: u16,

    pub opcode: Opcode,
    pub arg1: i32,
    pub arg2: i32,
    pub switch: Option<Box<SwitchTable>>,
}

/// Targets of a `tableswitch` or `lookupswitch`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SwitchTable {
    pub default: i32,

    /// Match value and target (a `tableswitch` has consecutive match values)
    pub entries: Vec<(i32, i32)>,
}

impl Instruction {
    pub fn new(pc: u16, opcode: Opcode) -> Instruction {
        Instruction {
            pc,
            opcode,
            arg1: 0,
            arg2: 0,
            switch: None,
        }
    }

    /// Instruction indices this instruction may jump to (not counting fall-through)
    pub fn targets(&self) -> Vec<i32> {
        if self.opcode.is_branch() {
            vec![self.arg1]
        } else if let Some(switch) = &self.switch {
            let mut targets = vec![switch.default];
            targets.extend(switch.entries.iter().map(|(_, target)| *target));
            targets
        } else {
            vec![]
        }
    }

    /// Apply a function to every jump target (not counting fall-through)
    pub(super) fn map_targets<E>(&mut self, mut f: impl FnMut(i32) -> Result<i32, E>) -> Result<(), E> {
        if self.opcode.is_branch() {
            self.arg1 = f(self.arg1)?;
        } else if let Some(switch) = &mut self.switch {
            switch.default = f(switch.default)?;
            for (_, target) in &mut switch.entries {
                *target = f(*target)?;
            }
        }
        Ok(())
    }
}
