use crate::error::{DmgError, IllegalOpcodeSnafu, UnknownConditionBitsSnafu, UnknownRegisterBitsSnafu};
use crate::memory::mmu::Mmu;
use bitflags::bitflags;

type FDecode = fn(&Mmu, u16, Opcode) -> Result<Instruction, DmgError>;

pub const PREFIX: u8 = 0xcb;

/// Opcodes with no defined behavior. Executing one locks up real hardware.
pub const ILLEGAL_OPCODES: [u8; 11] = [0xd3, 0xdb, 0xdd, 0xe3, 0xe4, 0xeb, 0xec, 0xed, 0xf4, 0xfc, 0xfd];

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Register {
    A,
    B,
    C,
    D,
    E,
    H,
    L,
    F,
    AF,
    BC,
    DE,
    HL,
    SP,
    PC,
}

bitflags! {
    #[derive(PartialEq, Eq, Debug, Clone, Copy)]
    pub struct AddressingMode: u8 {
        const Direct    = 0b0001;
        const Indirect  = 0b0010;
        const Increment = 0b0100;
        const Decrement = 0b1000;
    }
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Condition {
    None,
    NZ,
    Z,
    NC,
    C,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Reg8(Register, AddressingMode),
    Reg16(Register, AddressingMode),
    Imm8(u8, AddressingMode),
    Imm16(u16, AddressingMode),
    Conditional(Condition),
    DisplacedReg16(Register, i8, AddressingMode),
    Offset(i8),
    Bit(u8),
}

#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub enum Opcode {
    Nop,
    Ld,
    Inc,
    Dec,
    Rlc,
    Rrc,
    Swap,
    Rr,
    Srl,
    Bit,
    Res,
    Set,
    Jp,
    Jr,
    Call,
    Ret,
    Rst,
    Push,
    Pop,
    Add,
    Adc,
    Sub,
    Sbc,
    And,
    Xor,
    Or,
    Cp,
    Reti,
    Halt,
    Stop,
    Di,
    Ei,
    Ldh,
    Rl,
    Sla,
    Sra,
    Ccf,
    Scf,
    Cpl,
    Daa,
    Rra,
    Rla,
    Rrca,
    Rlca,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: Opcode,
    pub lhs: Option<Operand>,
    pub rhs: Option<Operand>,
    pub length: usize,
    /// Cycles when the branch is taken (or always), and when it is not.
    pub cycles: (usize, Option<usize>),
}

impl Instruction {
    fn new(opcode: Opcode, lhs: Option<Operand>, rhs: Option<Operand>, length: usize, cycles: usize) -> Instruction {
        Instruction {
            opcode,
            lhs,
            rhs,
            length,
            cycles: (cycles, None),
        }
    }

    fn implied(opcode: Opcode, cycles: usize) -> Instruction {
        Instruction::new(opcode, None, None, 1, cycles)
    }

    fn branch(opcode: Opcode, condition: Condition, target: Option<Operand>, length: usize, cycles: (usize, usize)) -> Instruction {
        let cycles = if condition != Condition::None {
            (cycles.0, Some(cycles.1))
        } else {
            (cycles.0, None)
        };

        Instruction {
            opcode,
            lhs: Some(Operand::Conditional(condition)),
            rhs: target,
            length,
            cycles,
        }
    }
}

const A: Operand = Operand::Reg8(Register::A, AddressingMode::Direct);
const HL: Operand = Operand::Reg16(Register::HL, AddressingMode::Direct);
const SP: Operand = Operand::Reg16(Register::SP, AddressingMode::Direct);

macro_rules! define_decoder {
    ( $pattern:expr, $opcode:expr, $function:expr ) => {{
        (String::from($pattern), $opcode, $function)
    }};
}

/// SM83 instruction decoder. The bit-pattern tables are expanded into one
/// 256-entry dispatch table per prefix at construction.
#[derive(Clone)]
pub struct Sm83 {
    table: Vec<Option<(Opcode, FDecode)>>,
    table_prefixed: Vec<Option<(Opcode, FDecode)>>,
}

fn matches_pattern(pattern: &str, byte: u8) -> bool {
    pattern
        .chars()
        .rev()
        .enumerate()
        .all(|(bit, c)| c == 'x' || (c == '1') == (byte & (1 << bit) != 0))
}

fn expand(lut: &[(String, Opcode, FDecode)], skip: &[u8]) -> Vec<Option<(Opcode, FDecode)>> {
    (0..=0xffu8)
        .map(|byte| {
            if skip.contains(&byte) {
                return None;
            }
            lut.iter()
                .find(|(pattern, _, _)| matches_pattern(pattern, byte))
                .map(|(_, opcode, decode)| (*opcode, *decode))
        })
        .collect()
}

impl Sm83 {
    pub fn new() -> Sm83 {
        let mut decoder_lut = Vec::new();
        let mut decoder_lut_prefixed = Vec::new();

        Sm83::propagate_decoders(&mut decoder_lut);
        Sm83::propagate_decoders_prefixed(&mut decoder_lut_prefixed);

        let mut skip = ILLEGAL_OPCODES.to_vec();
        skip.push(PREFIX);

        Sm83 {
            table: expand(&decoder_lut, &skip),
            table_prefixed: expand(&decoder_lut_prefixed, &[]),
        }
    }

    pub fn decode(&self, mmu: &Mmu, pc: u16) -> Result<Instruction, DmgError> {
        let opcode_byte = mmu.read(pc);

        let entry = if opcode_byte == PREFIX {
            self.table_prefixed[mmu.read(pc.wrapping_add(1)) as usize]
        } else {
            self.table[opcode_byte as usize]
        };

        match entry {
            Some((opcode, decode)) => decode(mmu, pc, opcode),
            None => IllegalOpcodeSnafu {
                opcode: opcode_byte,
                address: pc,
            }
            .fail(),
        }
    }

    fn lookup_register(data: u8) -> Result<Register, DmgError> {
        match data {
            0b000 => Ok(Register::B),
            0b001 => Ok(Register::C),
            0b010 => Ok(Register::D),
            0b011 => Ok(Register::E),
            0b100 => Ok(Register::H),
            0b101 => Ok(Register::L),
            0b110 => Ok(Register::HL),
            0b111 => Ok(Register::A),
            _ => UnknownRegisterBitsSnafu { data }.fail(),
        }
    }

    fn lookup_register_16(data: u8) -> Result<Register, DmgError> {
        match data {
            0b00 => Ok(Register::BC),
            0b01 => Ok(Register::DE),
            0b10 => Ok(Register::HL),
            0b11 => Ok(Register::SP),
            _ => UnknownRegisterBitsSnafu { data }.fail(),
        }
    }

    /// Same as `lookup_register_16`, but the SP slot means AF (push/pop).
    fn lookup_register_stack(data: u8) -> Result<Register, DmgError> {
        match Sm83::lookup_register_16(data)? {
            Register::SP => Ok(Register::AF),
            register => Ok(register),
        }
    }

    fn lookup_condition_3bits(data: u8) -> Result<Condition, DmgError> {
        match data {
            0b011 => Ok(Condition::None),
            0b100 => Ok(Condition::NZ),
            0b101 => Ok(Condition::Z),
            0b110 => Ok(Condition::NC),
            0b111 => Ok(Condition::C),
            _ => UnknownConditionBitsSnafu { data }.fail(),
        }
    }

    fn lookup_condition_2bits(data: u8) -> Result<Condition, DmgError> {
        match data {
            0b00 => Ok(Condition::NZ),
            0b01 => Ok(Condition::Z),
            0b10 => Ok(Condition::NC),
            0b11 => Ok(Condition::C),
            _ => UnknownConditionBitsSnafu { data }.fail(),
        }
    }

    /// Bit 0 set means unconditional for the jp/call/ret families.
    fn lookup_branch_condition(opcode_byte: u8) -> Result<Condition, DmgError> {
        if opcode_byte & 0b0000_0001 != 0 {
            Ok(Condition::None)
        } else {
            Sm83::lookup_condition_2bits((opcode_byte & 0b0001_1000) >> 3)
        }
    }

    fn decode_8bit_operand(value: u8, base_cycles: usize, hl_cycles: usize) -> Result<(Operand, usize), DmgError> {
        if value == 0b110 {
            Ok((Operand::Reg16(Register::HL, AddressingMode::Indirect), hl_cycles))
        } else {
            Ok((Operand::Reg8(Sm83::lookup_register(value)?, AddressingMode::Direct), base_cycles))
        }
    }

    fn imm8(mmu: &Mmu, pc: u16, mode: AddressingMode) -> Operand {
        Operand::Imm8(mmu.read(pc.wrapping_add(1)), mode)
    }

    fn imm16(mmu: &Mmu, pc: u16, mode: AddressingMode) -> Operand {
        Operand::Imm16(mmu.read16(pc.wrapping_add(1)), mode)
    }

    fn offset(mmu: &Mmu, pc: u16) -> i8 {
        mmu.read(pc.wrapping_add(1)) as i8
    }

    fn propagate_decoders(lut: &mut Vec<(String, Opcode, FDecode)>) {
        // Exact encodings come first; the first matching pattern wins.
        for (pattern, opcode) in [
            ("00000000", Opcode::Nop),
            ("00101111", Opcode::Cpl),
            ("00111111", Opcode::Ccf),
            ("00100111", Opcode::Daa),
            ("00110111", Opcode::Scf),
            ("00000111", Opcode::Rlca),
            ("00010111", Opcode::Rla),
            ("00001111", Opcode::Rrca),
            ("00011111", Opcode::Rra),
            ("01110110", Opcode::Halt),
            ("11110011", Opcode::Di),
            ("11111011", Opcode::Ei),
        ] {
            lut.push(define_decoder!(pattern, opcode, |_, _, opcode| Ok(Instruction::implied(opcode, 4))));
        }

        // reti
        lut.push(define_decoder!("11011001", Opcode::Reti, |_, _, opcode| {
            Ok(Instruction::implied(opcode, 16))
        }));

        // stop imm8
        lut.push(define_decoder!("00010000", Opcode::Stop, |mmu, pc, opcode| {
            Ok(Instruction::new(
                opcode,
                Some(Sm83::imm8(mmu, pc, AddressingMode::Direct)),
                None,
                2,
                4,
            ))
        }));

        // ld (imm16), SP
        lut.push(define_decoder!("00001000", Opcode::Ld, |mmu, pc, opcode| {
            Ok(Instruction::new(
                opcode,
                Some(Sm83::imm16(mmu, pc, AddressingMode::Indirect)),
                Some(SP),
                3,
                20,
            ))
        }));

        // add sp, imm8
        lut.push(define_decoder!("11101000", Opcode::Add, |mmu, pc, opcode| {
            Ok(Instruction::new(opcode, Some(SP), Some(Operand::Offset(Sm83::offset(mmu, pc))), 2, 16))
        }));

        // ld hl, sp+/-imm8
        lut.push(define_decoder!("11111000", Opcode::Ld, |mmu, pc, opcode| {
            let offset = Sm83::offset(mmu, pc);
            Ok(Instruction::new(
                opcode,
                Some(HL),
                Some(Operand::DisplacedReg16(Register::SP, offset, AddressingMode::Direct)),
                2,
                12,
            ))
        }));

        // ld sp, hl
        lut.push(define_decoder!("11111001", Opcode::Ld, |_, _, opcode| {
            Ok(Instruction::new(opcode, Some(SP), Some(HL), 1, 8))
        }));

        // alu A, imm8
        for (pattern, opcode) in [
            ("11000110", Opcode::Add),
            ("11001110", Opcode::Adc),
            ("11010110", Opcode::Sub),
            ("11011110", Opcode::Sbc),
            ("11100110", Opcode::And),
            ("11101110", Opcode::Xor),
            ("11110110", Opcode::Or),
            ("11111110", Opcode::Cp),
        ] {
            lut.push(define_decoder!(pattern, opcode, |mmu, pc, opcode| {
                Ok(Instruction::new(
                    opcode,
                    Some(A),
                    Some(Sm83::imm8(mmu, pc, AddressingMode::Direct)),
                    2,
                    8,
                ))
            }));
        }

        // ld (imm16), A
        lut.push(define_decoder!("11101010", Opcode::Ld, |mmu, pc, opcode| {
            Ok(Instruction::new(
                opcode,
                Some(Sm83::imm16(mmu, pc, AddressingMode::Indirect)),
                Some(A),
                3,
                16,
            ))
        }));

        // ld A, (imm16)
        lut.push(define_decoder!("11111010", Opcode::Ld, |mmu, pc, opcode| {
            Ok(Instruction::new(
                opcode,
                Some(A),
                Some(Sm83::imm16(mmu, pc, AddressingMode::Indirect)),
                3,
                16,
            ))
        }));

        // ldh (imm8), A
        lut.push(define_decoder!("11100000", Opcode::Ldh, |mmu, pc, opcode| {
            Ok(Instruction::new(
                opcode,
                Some(Sm83::imm8(mmu, pc, AddressingMode::Indirect)),
                Some(A),
                2,
                12,
            ))
        }));

        // ldh A, (imm8)
        lut.push(define_decoder!("11110000", Opcode::Ldh, |mmu, pc, opcode| {
            Ok(Instruction::new(
                opcode,
                Some(A),
                Some(Sm83::imm8(mmu, pc, AddressingMode::Indirect)),
                2,
                12,
            ))
        }));

        // ld (C), A
        lut.push(define_decoder!("11100010", Opcode::Ld, |_, _, opcode| {
            Ok(Instruction::new(
                opcode,
                Some(Operand::Reg8(Register::C, AddressingMode::Indirect)),
                Some(A),
                1,
                8,
            ))
        }));

        // ld A, (C)
        lut.push(define_decoder!("11110010", Opcode::Ld, |_, _, opcode| {
            Ok(Instruction::new(
                opcode,
                Some(A),
                Some(Operand::Reg8(Register::C, AddressingMode::Indirect)),
                1,
                8,
            ))
        }));

        // jp hl
        lut.push(define_decoder!("11101001", Opcode::Jp, |_, _, opcode| {
            Ok(Instruction::branch(opcode, Condition::None, Some(HL), 1, (4, 4)))
        }));

        // jr cond, imm8 / jr imm8
        lut.push(define_decoder!("00xxx000", Opcode::Jr, |mmu, pc, opcode| {
            let condition = Sm83::lookup_condition_3bits((mmu.read(pc) & 0b0011_1000) >> 3)?;
            let offset = Operand::Offset(Sm83::offset(mmu, pc));
            Ok(Instruction::branch(opcode, condition, Some(offset), 2, (12, 8)))
        }));

        // ld r16, imm16
        lut.push(define_decoder!("00xx0001", Opcode::Ld, |mmu, pc, opcode| {
            let destination = Sm83::lookup_register_16((mmu.read(pc) & 0b0011_0000) >> 4)?;
            Ok(Instruction::new(
                opcode,
                Some(Operand::Reg16(destination, AddressingMode::Direct)),
                Some(Sm83::imm16(mmu, pc, AddressingMode::Direct)),
                3,
                12,
            ))
        }));

        // ld (r16), A / ld (HL+), A / ld (HL-), A
        lut.push(define_decoder!("00xx0010", Opcode::Ld, |mmu, pc, opcode| {
            let lhs = Sm83::indirect_r16(mmu.read(pc))?;
            Ok(Instruction::new(opcode, Some(lhs), Some(A), 1, 8))
        }));

        // ld A, (r16) / ld A, (HL+) / ld A, (HL-)
        lut.push(define_decoder!("00xx1010", Opcode::Ld, |mmu, pc, opcode| {
            let rhs = Sm83::indirect_r16(mmu.read(pc))?;
            Ok(Instruction::new(opcode, Some(A), Some(rhs), 1, 8))
        }));

        // add HL, r16
        lut.push(define_decoder!("00xx1001", Opcode::Add, |mmu, pc, opcode| {
            let source = Sm83::lookup_register_16((mmu.read(pc) & 0b0011_0000) >> 4)?;
            Ok(Instruction::new(
                opcode,
                Some(HL),
                Some(Operand::Reg16(source, AddressingMode::Direct)),
                1,
                8,
            ))
        }));

        // inc r16 / dec r16
        for (pattern, opcode) in [("00xx0011", Opcode::Inc), ("00xx1011", Opcode::Dec)] {
            lut.push(define_decoder!(pattern, opcode, |mmu, pc, opcode| {
                let destination = Sm83::lookup_register_16((mmu.read(pc) & 0b0011_0000) >> 4)?;
                Ok(Instruction::new(
                    opcode,
                    Some(Operand::Reg16(destination, AddressingMode::Direct)),
                    None,
                    1,
                    8,
                ))
            }));
        }

        // ld r8, imm8 / ld (HL), imm8
        lut.push(define_decoder!("00xxx110", Opcode::Ld, |mmu, pc, opcode| {
            let (lhs, cycles) = Sm83::decode_8bit_operand((mmu.read(pc) & 0b0011_1000) >> 3, 8, 12)?;
            Ok(Instruction::new(
                opcode,
                Some(lhs),
                Some(Sm83::imm8(mmu, pc, AddressingMode::Direct)),
                2,
                cycles,
            ))
        }));

        // inc r8 / dec r8 / inc (HL) / dec (HL)
        for (pattern, opcode) in [("00xxx100", Opcode::Inc), ("00xxx101", Opcode::Dec)] {
            lut.push(define_decoder!(pattern, opcode, |mmu, pc, opcode| {
                let (lhs, cycles) = Sm83::decode_8bit_operand((mmu.read(pc) & 0b0011_1000) >> 3, 4, 12)?;
                Ok(Instruction::new(opcode, Some(lhs), None, 1, cycles))
            }));
        }

        // ld r8, r8 / ld r8, (HL) / ld (HL), r8
        lut.push(define_decoder!("01xxxxxx", Opcode::Ld, |mmu, pc, opcode| {
            let opcode_byte = mmu.read(pc);
            let (lhs, lhs_cycles) = Sm83::decode_8bit_operand((opcode_byte & 0b0011_1000) >> 3, 4, 8)?;
            let (rhs, rhs_cycles) = Sm83::decode_8bit_operand(opcode_byte & 0b0000_0111, 4, 8)?;
            Ok(Instruction::new(opcode, Some(lhs), Some(rhs), 1, lhs_cycles.max(rhs_cycles)))
        }));

        // alu A, r8 / alu A, (HL)
        for (pattern, opcode) in [
            ("10000xxx", Opcode::Add),
            ("10001xxx", Opcode::Adc),
            ("10010xxx", Opcode::Sub),
            ("10011xxx", Opcode::Sbc),
            ("10100xxx", Opcode::And),
            ("10101xxx", Opcode::Xor),
            ("10110xxx", Opcode::Or),
            ("10111xxx", Opcode::Cp),
        ] {
            lut.push(define_decoder!(pattern, opcode, |mmu, pc, opcode| {
                let (rhs, cycles) = Sm83::decode_8bit_operand(mmu.read(pc) & 0b0000_0111, 4, 8)?;
                Ok(Instruction::new(opcode, Some(A), Some(rhs), 1, cycles))
            }));
        }

        // pop r16
        lut.push(define_decoder!("11xx0001", Opcode::Pop, |mmu, pc, opcode| {
            Sm83::stack_op(mmu, pc, opcode, 12)
        }));

        // push r16
        lut.push(define_decoder!("11xx0101", Opcode::Push, |mmu, pc, opcode| {
            Sm83::stack_op(mmu, pc, opcode, 16)
        }));

        // ret cond / ret
        lut.push(define_decoder!("110xx00x", Opcode::Ret, |mmu, pc, opcode| {
            let condition = Sm83::lookup_branch_condition(mmu.read(pc))?;
            let cycles = if condition == Condition::None { (16, 16) } else { (20, 8) };
            Ok(Instruction::branch(opcode, condition, None, 1, cycles))
        }));

        // jp cond, imm16 / jp imm16
        lut.push(define_decoder!("110xx01x", Opcode::Jp, |mmu, pc, opcode| {
            let condition = Sm83::lookup_branch_condition(mmu.read(pc))?;
            let target = Sm83::imm16(mmu, pc, AddressingMode::Direct);
            Ok(Instruction::branch(opcode, condition, Some(target), 3, (16, 12)))
        }));

        // call cond, imm16 / call imm16
        lut.push(define_decoder!("110xx10x", Opcode::Call, |mmu, pc, opcode| {
            let condition = Sm83::lookup_branch_condition(mmu.read(pc))?;
            let target = Sm83::imm16(mmu, pc, AddressingMode::Direct);
            Ok(Instruction::branch(opcode, condition, Some(target), 3, (24, 12)))
        }));

        // rst n
        lut.push(define_decoder!("11xxx111", Opcode::Rst, |mmu, pc, opcode| {
            let vector = mmu.read(pc) & 0b0011_1000;
            Ok(Instruction::new(
                opcode,
                Some(Operand::Imm8(vector, AddressingMode::Direct)),
                None,
                1,
                16,
            ))
        }));
    }

    fn indirect_r16(opcode_byte: u8) -> Result<Operand, DmgError> {
        let mode = match (opcode_byte & 0b0011_0000) >> 4 {
            0b10 => AddressingMode::Indirect | AddressingMode::Increment,
            0b11 => AddressingMode::Indirect | AddressingMode::Decrement,
            _ => AddressingMode::Indirect,
        };
        let register = match (opcode_byte & 0b0011_0000) >> 4 {
            0b00 => Register::BC,
            0b01 => Register::DE,
            _ => Register::HL,
        };
        Ok(Operand::Reg16(register, mode))
    }

    fn stack_op(mmu: &Mmu, pc: u16, opcode: Opcode, cycles: usize) -> Result<Instruction, DmgError> {
        let register = Sm83::lookup_register_stack((mmu.read(pc) & 0b0011_0000) >> 4)?;
        Ok(Instruction::new(
            opcode,
            Some(Operand::Reg16(register, AddressingMode::Direct)),
            None,
            1,
            cycles,
        ))
    }

    fn propagate_decoders_prefixed(lut: &mut Vec<(String, Opcode, FDecode)>) {
        // rotate/shift r8 / rotate/shift (HL)
        for (pattern, opcode) in [
            ("00000xxx", Opcode::Rlc),
            ("00001xxx", Opcode::Rrc),
            ("00010xxx", Opcode::Rl),
            ("00011xxx", Opcode::Rr),
            ("00100xxx", Opcode::Sla),
            ("00101xxx", Opcode::Sra),
            ("00110xxx", Opcode::Swap),
            ("00111xxx", Opcode::Srl),
        ] {
            lut.push(define_decoder!(pattern, opcode, |mmu, pc, opcode| {
                let opcode_byte = mmu.read(pc.wrapping_add(1));
                let (lhs, cycles) = Sm83::decode_8bit_operand(opcode_byte & 0b0000_0111, 8, 16)?;
                Ok(Instruction::new(opcode, Some(lhs), None, 2, cycles))
            }));
        }

        // bit n, r8 / bit n, (HL)
        lut.push(define_decoder!("01xxxxxx", Opcode::Bit, |mmu, pc, opcode| {
            Sm83::bit_op(mmu, pc, opcode, 12)
        }));

        // res n, r8 / res n, (HL)
        lut.push(define_decoder!("10xxxxxx", Opcode::Res, |mmu, pc, opcode| {
            Sm83::bit_op(mmu, pc, opcode, 16)
        }));

        // set n, r8 / set n, (HL)
        lut.push(define_decoder!("11xxxxxx", Opcode::Set, |mmu, pc, opcode| {
            Sm83::bit_op(mmu, pc, opcode, 16)
        }));
    }

    fn bit_op(mmu: &Mmu, pc: u16, opcode: Opcode, hl_cycles: usize) -> Result<Instruction, DmgError> {
        let opcode_byte = mmu.read(pc.wrapping_add(1));
        let bit = (opcode_byte & 0b0011_1000) >> 3;
        let (rhs, cycles) = Sm83::decode_8bit_operand(opcode_byte & 0b0000_0111, 8, hl_cycles)?;
        Ok(Instruction::new(opcode, Some(Operand::Bit(bit)), Some(rhs), 2, cycles))
    }
}

impl Default for Sm83 {
    fn default() -> Sm83 {
        Sm83::new()
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut output = format!("{:?}", self.opcode).to_lowercase();

        let mut ignore_destination = false;
        if let Some(destination) = &self.lhs {
            match destination {
                Operand::Conditional(Condition::None) => ignore_destination = true,
                _ => output.push_str(&format!(" {}", destination)),
            };
        }

        if let Some(source) = &self.rhs {
            if !ignore_destination {
                output.push_str(&format!(", {}", source));
            } else {
                output.push_str(&format!(" {}", source));
            }
        }

        write!(f, "{}", output)
    }
}

impl std::fmt::Display for Register {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let output = match self {
            Register::A => "a",
            Register::B => "b",
            Register::C => "c",
            Register::D => "d",
            Register::E => "e",
            Register::H => "h",
            Register::L => "l",
            Register::F => "f",
            Register::AF => "af",
            Register::BC => "bc",
            Register::DE => "de",
            Register::HL => "hl",
            Register::SP => "sp",
            Register::PC => "pc",
        };

        write!(f, "{}", output)
    }
}

impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Operand::Reg8(reg, mode) if mode.contains(AddressingMode::Indirect) => write!(f, "({})", reg),
            Operand::Reg8(reg, _) => write!(f, "{}", reg),
            Operand::Reg16(reg, mode) if mode.contains(AddressingMode::Increment) => write!(f, "({}+)", reg),
            Operand::Reg16(reg, mode) if mode.contains(AddressingMode::Decrement) => write!(f, "({}-)", reg),
            Operand::Reg16(reg, mode) if mode.contains(AddressingMode::Indirect) => write!(f, "({})", reg),
            Operand::Reg16(reg, _) => write!(f, "{}", reg),
            Operand::Imm8(value, mode) if mode.contains(AddressingMode::Indirect) => write!(f, "(${:02x})", value),
            Operand::Imm8(value, _) => write!(f, "${:02x}", value),
            Operand::Imm16(value, mode) if mode.contains(AddressingMode::Indirect) => write!(f, "(${:04x})", value),
            Operand::Imm16(value, _) => write!(f, "${:04x}", value),
            Operand::Conditional(cond) => write!(f, "{}", cond),
            Operand::Offset(value) => write!(f, "{:+}", value),
            Operand::Bit(value) => write!(f, "{}", value),
            Operand::DisplacedReg16(reg, value, _) => write!(f, "{}{:+}", reg, value),
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let output = match self {
            Condition::None => "",
            Condition::NZ => "nz",
            Condition::Z => "z",
            Condition::NC => "nc",
            Condition::C => "c",
        };

        write!(f, "{}", output)
    }
}
