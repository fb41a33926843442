//! Normalized opcodes and the raw opcode table
//!
//! Several raw opcodes collapse into one normalized opcode, with the difference moved into the
//! operands of the [`super::Instruction`]:
//!
//!   - `iconst_<n>`, `bipush`, and `sipush` all become [`Opcode::IConst`]
//!   - `<x>load_<n>` and `<x>store_<n>` become `<x>load`/`<x>store` with the slot as operand
//!   - `ldc`, `ldc_w`, and `ldc2_w` all become [`Opcode::Ldc`]
//!   - `goto_w` and `jsr_w` become [`Opcode::Goto`] and [`Opcode::Jsr`]
//!   - `wide` doesn't show up at all, but instead gets merged into the instruction it modifies

/// JVM opcode, after normalization
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Opcode {
    Nop,
    AConstNull,
    IConst, // covers `iconst_<n>`, `bipush`, and `sipush`
    LConst0,
    LConst1,
    FConst0,
    FConst1,
    FConst2,
    DConst0,
    DConst1,
    Ldc, // covers `ldc`, `ldc_w`, and `ldc2_w`
    ILoad,
    LLoad,
    FLoad,
    DLoad,
    ALoad,
    IALoad,
    LALoad,
    FALoad,
    DALoad,
    AALoad,
    BALoad,
    CALoad,
    SALoad,
    IStore,
    LStore,
    FStore,
    DStore,
    AStore,
    IAStore,
    LAStore,
    FAStore,
    DAStore,
    AAStore,
    BAStore,
    CAStore,
    SAStore,
    Pop,
    Pop2,
    Dup,
    DupX1,
    DupX2,
    Dup2,
    Dup2X1,
    Dup2X2,
    Swap,
    IAdd,
    LAdd,
    FAdd,
    DAdd,
    ISub,
    LSub,
    FSub,
    DSub,
    IMul,
    LMul,
    FMul,
    DMul,
    IDiv,
    LDiv,
    FDiv,
    DDiv,
    IRem,
    LRem,
    FRem,
    DRem,
    INeg,
    LNeg,
    FNeg,
    DNeg,
    IShl,
    LShl,
    IShr,
    LShr,
    IUShr,
    LUShr,
    IAnd,
    LAnd,
    IOr,
    LOr,
    IXor,
    LXor,
    IInc,
    I2L,
    I2F,
    I2D,
    L2I,
    L2F,
    L2D,
    F2I,
    F2L,
    F2D,
    D2I,
    D2L,
    D2F,
    I2B,
    I2C,
    I2S,
    LCmp,
    FCmpL,
    FCmpG,
    DCmpL,
    DCmpG,
    IfEq,
    IfNe,
    IfLt,
    IfGe,
    IfGt,
    IfLe,
    IfICmpEq,
    IfICmpNe,
    IfICmpLt,
    IfICmpGe,
    IfICmpGt,
    IfICmpLe,
    IfACmpEq,
    IfACmpNe,
    Goto, // covers `goto` and `goto_w`
    Jsr,  // covers `jsr` and `jsr_w`
    Ret,
    TableSwitch,
    LookupSwitch,
    IReturn,
    LReturn,
    FReturn,
    DReturn,
    AReturn,
    Return,
    GetStatic,
    PutStatic,
    GetField,
    PutField,
    InvokeVirtual,
    InvokeSpecial,
    InvokeStatic,
    InvokeInterface,
    InvokeDynamic,
    New,
    NewArray,
    ANewArray,
    ArrayLength,
    AThrow,
    CheckCast,
    InstanceOf,
    MonitorEnter,
    MonitorExit,
    MultiANewArray,
    IfNull,
    IfNonNull,
}

impl Opcode {
    /// Does `arg1` hold a branch target?
    pub fn is_branch(self) -> bool {
        matches!(
            self,
            Opcode::IfEq
                | Opcode::IfNe
                | Opcode::IfLt
                | Opcode::IfGe
                | Opcode::IfGt
                | Opcode::IfLe
                | Opcode::IfICmpEq
                | Opcode::IfICmpNe
                | Opcode::IfICmpLt
                | Opcode::IfICmpGe
                | Opcode::IfICmpGt
                | Opcode::IfICmpLe
                | Opcode::IfACmpEq
                | Opcode::IfACmpNe
                | Opcode::Goto
                | Opcode::Jsr
                | Opcode::IfNull
                | Opcode::IfNonNull
        )
    }

    pub fn is_switch(self) -> bool {
        matches!(self, Opcode::TableSwitch | Opcode::LookupSwitch)
    }

    /// Does `arg1` hold a constant pool index?
    pub fn has_constant_operand(self) -> bool {
        matches!(
            self,
            Opcode::Ldc
                | Opcode::GetStatic
                | Opcode::PutStatic
                | Opcode::GetField
                | Opcode::PutField
                | Opcode::InvokeVirtual
                | Opcode::InvokeSpecial
                | Opcode::InvokeStatic
                | Opcode::InvokeInterface
                | Opcode::InvokeDynamic
                | Opcode::New
                | Opcode::ANewArray
                | Opcode::CheckCast
                | Opcode::InstanceOf
                | Opcode::MultiANewArray
        )
    }
}

/// Shape of the operands following a raw opcode
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OperandFormat {
    None,

    /// No operand bytes, but an `arg1` implied by the raw opcode (eg. `iconst_3`, `aload_0`)
    Implicit(i32),

    /// Local variable slot, one byte (two under `wide`)
    LocalVar,

    /// Signed byte
    Byte,

    /// Signed short
    Short,

    /// One byte constant pool index (`ldc`)
    ConstantU8,

    /// Two byte constant pool index
    Constant,

    /// Local variable slot and signed increment (one byte each, two each under `wide`)
    Iinc,

    /// Constant pool index, argument count, then a zero byte
    InvokeInterface,

    /// Constant pool index, then two zero bytes
    InvokeDynamic,

    /// Constant pool index, then a dimension count
    MultiANewArray,

    /// Array type code
    NewArray,

    /// Signed 16-bit branch offset
    Branch,

    /// Signed 32-bit branch offset
    BranchWide,

    TableSwitch,
    LookupSwitch,

    /// The `wide` prefix
    Wide,
}

/// Look up a raw opcode
///
/// Returns `None` for bytes that are not opcodes (including the reserved `breakpoint`,
/// `impdep1`, and `impdep2`).
pub fn decode_opcode(byte: u8) -> Option<(Opcode, OperandFormat)> {
    use OperandFormat as F;

    let decoded = match byte {
        0x00 => (Opcode::Nop, F::None),
        0x01 => (Opcode::AConstNull, F::None),
        0x02..=0x08 => (Opcode::IConst, F::Implicit(byte as i32 - 0x03)),
        0x09 => (Opcode::LConst0, F::None),
        0x0a => (Opcode::LConst1, F::None),
        0x0b => (Opcode::FConst0, F::None),
        0x0c => (Opcode::FConst1, F::None),
        0x0d => (Opcode::FConst2, F::None),
        0x0e => (Opcode::DConst0, F::None),
        0x0f => (Opcode::DConst1, F::None),
        0x10 => (Opcode::IConst, F::Byte),
        0x11 => (Opcode::IConst, F::Short),
        0x12 => (Opcode::Ldc, F::ConstantU8),
        0x13 | 0x14 => (Opcode::Ldc, F::Constant),
        0x15 => (Opcode::ILoad, F::LocalVar),
        0x16 => (Opcode::LLoad, F::LocalVar),
        0x17 => (Opcode::FLoad, F::LocalVar),
        0x18 => (Opcode::DLoad, F::LocalVar),
        0x19 => (Opcode::ALoad, F::LocalVar),
        0x1a..=0x1d => (Opcode::ILoad, F::Implicit(byte as i32 - 0x1a)),
        0x1e..=0x21 => (Opcode::LLoad, F::Implicit(byte as i32 - 0x1e)),
        0x22..=0x25 => (Opcode::FLoad, F::Implicit(byte as i32 - 0x22)),
        0x26..=0x29 => (Opcode::DLoad, F::Implicit(byte as i32 - 0x26)),
        0x2a..=0x2d => (Opcode::ALoad, F::Implicit(byte as i32 - 0x2a)),
        0x2e => (Opcode::IALoad, F::None),
        0x2f => (Opcode::LALoad, F::None),
        0x30 => (Opcode::FALoad, F::None),
        0x31 => (Opcode::DALoad, F::None),
        0x32 => (Opcode::AALoad, F::None),
        0x33 => (Opcode::BALoad, F::None),
        0x34 => (Opcode::CALoad, F::None),
        0x35 => (Opcode::SALoad, F::None),
        0x36 => (Opcode::IStore, F::LocalVar),
        0x37 => (Opcode::LStore, F::LocalVar),
        0x38 => (Opcode::FStore, F::LocalVar),
        0x39 => (Opcode::DStore, F::LocalVar),
        0x3a => (Opcode::AStore, F::LocalVar),
        0x3b..=0x3e => (Opcode::IStore, F::Implicit(byte as i32 - 0x3b)),
        0x3f..=0x42 => (Opcode::LStore, F::Implicit(byte as i32 - 0x3f)),
        0x43..=0x46 => (Opcode::FStore, F::Implicit(byte as i32 - 0x43)),
        0x47..=0x4a => (Opcode::DStore, F::Implicit(byte as i32 - 0x47)),
        0x4b..=0x4e => (Opcode::AStore, F::Implicit(byte as i32 - 0x4b)),
        0x4f => (Opcode::IAStore, F::None),
        0x50 => (Opcode::LAStore, F::None),
        0x51 => (Opcode::FAStore, F::None),
        0x52 => (Opcode::DAStore, F::None),
        0x53 => (Opcode::AAStore, F::None),
        0x54 => (Opcode::BAStore, F::None),
        0x55 => (Opcode::CAStore, F::None),
        0x56 => (Opcode::SAStore, F::None),
        0x57 => (Opcode::Pop, F::None),
        0x58 => (Opcode::Pop2, F::None),
        0x59 => (Opcode::Dup, F::None),
        0x5a => (Opcode::DupX1, F::None),
        0x5b => (Opcode::DupX2, F::None),
        0x5c => (Opcode::Dup2, F::None),
        0x5d => (Opcode::Dup2X1, F::None),
        0x5e => (Opcode::Dup2X2, F::None),
        0x5f => (Opcode::Swap, F::None),
        0x60 => (Opcode::IAdd, F::None),
        0x61 => (Opcode::LAdd, F::None),
        0x62 => (Opcode::FAdd, F::None),
        0x63 => (Opcode::DAdd, F::None),
        0x64 => (Opcode::ISub, F::None),
        0x65 => (Opcode::LSub, F::None),
        0x66 => (Opcode::FSub, F::None),
        0x67 => (Opcode::DSub, F::None),
        0x68 => (Opcode::IMul, F::None),
        0x69 => (Opcode::LMul, F::None),
        0x6a => (Opcode::FMul, F::None),
        0x6b => (Opcode::DMul, F::None),
        0x6c => (Opcode::IDiv, F::None),
        0x6d => (Opcode::LDiv, F::None),
        0x6e => (Opcode::FDiv, F::None),
        0x6f => (Opcode::DDiv, F::None),
        0x70 => (Opcode::IRem, F::None),
        0x71 => (Opcode::LRem, F::None),
        0x72 => (Opcode::FRem, F::None),
        0x73 => (Opcode::DRem, F::None),
        0x74 => (Opcode::INeg, F::None),
        0x75 => (Opcode::LNeg, F::None),
        0x76 => (Opcode::FNeg, F::None),
        0x77 => (Opcode::DNeg, F::None),
        0x78 => (Opcode::IShl, F::None),
        0x79 => (Opcode::LShl, F::None),
        0x7a => (Opcode::IShr, F::None),
        0x7b => (Opcode::LShr, F::None),
        0x7c => (Opcode::IUShr, F::None),
        0x7d => (Opcode::LUShr, F::None),
        0x7e => (Opcode::IAnd, F::None),
        0x7f => (Opcode::LAnd, F::None),
        0x80 => (Opcode::IOr, F::None),
        0x81 => (Opcode::LOr, F::None),
        0x82 => (Opcode::IXor, F::None),
        0x83 => (Opcode::LXor, F::None),
        0x84 => (Opcode::IInc, F::Iinc),
        0x85 => (Opcode::I2L, F::None),
        0x86 => (Opcode::I2F, F::None),
        0x87 => (Opcode::I2D, F::None),
        0x88 => (Opcode::L2I, F::None),
        0x89 => (Opcode::L2F, F::None),
        0x8a => (Opcode::L2D, F::None),
        0x8b => (Opcode::F2I, F::None),
        0x8c => (Opcode::F2L, F::None),
        0x8d => (Opcode::F2D, F::None),
        0x8e => (Opcode::D2I, F::None),
        0x8f => (Opcode::D2L, F::None),
        0x90 => (Opcode::D2F, F::None),
        0x91 => (Opcode::I2B, F::None),
        0x92 => (Opcode::I2C, F::None),
        0x93 => (Opcode::I2S, F::None),
        0x94 => (Opcode::LCmp, F::None),
        0x95 => (Opcode::FCmpL, F::None),
        0x96 => (Opcode::FCmpG, F::None),
        0x97 => (Opcode::DCmpL, F::None),
        0x98 => (Opcode::DCmpG, F::None),
        0x99 => (Opcode::IfEq, F::Branch),
        0x9a => (Opcode::IfNe, F::Branch),
        0x9b => (Opcode::IfLt, F::Branch),
        0x9c => (Opcode::IfGe, F::Branch),
        0x9d => (Opcode::IfGt, F::Branch),
        0x9e => (Opcode::IfLe, F::Branch),
        0x9f => (Opcode::IfICmpEq, F::Branch),
        0xa0 => (Opcode::IfICmpNe, F::Branch),
        0xa1 => (Opcode::IfICmpLt, F::Branch),
        0xa2 => (Opcode::IfICmpGe, F::Branch),
        0xa3 => (Opcode::IfICmpGt, F::Branch),
        0xa4 => (Opcode::IfICmpLe, F::Branch),
        0xa5 => (Opcode::IfACmpEq, F::Branch),
        0xa6 => (Opcode::IfACmpNe, F::Branch),
        0xa7 => (Opcode::Goto, F::Branch),
        0xa8 => (Opcode::Jsr, F::Branch),
        0xa9 => (Opcode::Ret, F::LocalVar),
        0xaa => (Opcode::TableSwitch, F::TableSwitch),
        0xab => (Opcode::LookupSwitch, F::LookupSwitch),
        0xac => (Opcode::IReturn, F::None),
        0xad => (Opcode::LReturn, F::None),
        0xae => (Opcode::FReturn, F::None),
        0xaf => (Opcode::DReturn, F::None),
        0xb0 => (Opcode::AReturn, F::None),
        0xb1 => (Opcode::Return, F::None),
        0xb2 => (Opcode::GetStatic, F::Constant),
        0xb3 => (Opcode::PutStatic, F::Constant),
        0xb4 => (Opcode::GetField, F::Constant),
        0xb5 => (Opcode::PutField, F::Constant),
        0xb6 => (Opcode::InvokeVirtual, F::Constant),
        0xb7 => (Opcode::InvokeSpecial, F::Constant),
        0xb8 => (Opcode::InvokeStatic, F::Constant),
        0xb9 => (Opcode::InvokeInterface, F::InvokeInterface),
        0xba => (Opcode::InvokeDynamic, F::InvokeDynamic),
        0xbb => (Opcode::New, F::Constant),
        0xbc => (Opcode::NewArray, F::NewArray),
        0xbd => (Opcode::ANewArray, F::Constant),
        0xbe => (Opcode::ArrayLength, F::None),
        0xbf => (Opcode::AThrow, F::None),
        0xc0 => (Opcode::CheckCast, F::Constant),
        0xc1 => (Opcode::InstanceOf, F::Constant),
        0xc2 => (Opcode::MonitorEnter, F::None),
        0xc3 => (Opcode::MonitorExit, F::None),
        0xc4 => (Opcode::Nop, F::Wide),
        0xc5 => (Opcode::MultiANewArray, F::MultiANewArray),
        0xc6 => (Opcode::IfNull, F::Branch),
        0xc7 => (Opcode::IfNonNull, F::Branch),
        0xc8 => (Opcode::Goto, F::BranchWide),
        0xc9 => (Opcode::Jsr, F::BranchWide),
        _ => return None,
    };
    Some(decoded)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn constants_are_normalized() {
        assert_eq!(decode_opcode(0x02), Some((Opcode::IConst, OperandFormat::Implicit(-1))));
        assert_eq!(decode_opcode(0x08), Some((Opcode::IConst, OperandFormat::Implicit(5))));
        assert_eq!(decode_opcode(0x10), Some((Opcode::IConst, OperandFormat::Byte)));
        assert_eq!(decode_opcode(0x14), Some((Opcode::Ldc, OperandFormat::Constant)));
    }

    #[test]
    fn locals_are_normalized() {
        assert_eq!(decode_opcode(0x1b), Some((Opcode::ILoad, OperandFormat::Implicit(1))));
        assert_eq!(decode_opcode(0x2d), Some((Opcode::ALoad, OperandFormat::Implicit(3))));
        assert_eq!(decode_opcode(0x4b), Some((Opcode::AStore, OperandFormat::Implicit(0))));
    }

    #[test]
    fn reserved_bytes() {
        assert_eq!(decode_opcode(0xca), None);
        assert_eq!(decode_opcode(0xfe), None);
        assert_eq!(decode_opcode(0xff), None);
    }

    #[test]
    fn wide_branches() {
        assert_eq!(decode_opcode(0xc8), Some((Opcode::Goto, OperandFormat::BranchWide)));
        assert!(Opcode::Goto.is_branch());
        assert!(!Opcode::TableSwitch.is_branch());
        assert!(Opcode::TableSwitch.is_switch());
    }
}
