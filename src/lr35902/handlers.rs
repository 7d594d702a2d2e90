use crate::error::{DmgError, InvalidHandlerSnafu, UnresolvedTargetSnafu};
use crate::lr35902::cpu::Cpu;
use crate::lr35902::registers::Flags;
use crate::lr35902::sm83::{AddressingMode, Condition, Instruction, Opcode, Operand, Register};
use crate::memory::mmu::Mmu;
use log::debug;
use snafu::OptionExt;

const HIGH_PAGE: u16 = 0xff00;

pub struct Handlers {}

impl Handlers {
    pub fn nop(_cpu: &mut Cpu, _mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DmgError> {
        Ok(instruction.cycles.0)
    }

    pub fn load(cpu: &mut Cpu, mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DmgError> {
        let dst = Handlers::lhs(instruction)?;
        let src = Handlers::rhs(instruction)?;

        match (dst, src) {
            // ld r16, imm16
            (Operand::Reg16(reg, dst_mode), Operand::Imm16(value, src_mode))
                if dst_mode == AddressingMode::Direct && src_mode == AddressingMode::Direct =>
            {
                cpu.write_register16(reg, value).context(UnresolvedTargetSnafu { target: dst })?;
            }
            // ld sp, hl
            (Operand::Reg16(reg, dst_mode), Operand::Reg16(source, src_mode))
                if dst_mode == AddressingMode::Direct && src_mode == AddressingMode::Direct =>
            {
                let value = cpu.read_register16(source).context(UnresolvedTargetSnafu { target: src })?;
                cpu.write_register16(reg, value).context(UnresolvedTargetSnafu { target: dst })?;
            }
            // ld hl, sp+e
            (Operand::Reg16(reg, _), Operand::DisplacedReg16(base, offset, _)) => {
                let base = cpu.read_register16(base).context(UnresolvedTargetSnafu { target: src })?;
                let result = Handlers::add_signed_offset(cpu, base, offset);
                cpu.write_register16(reg, result).context(UnresolvedTargetSnafu { target: dst })?;
            }
            // ld (imm16), sp
            (Operand::Imm16(addr, dst_mode), Operand::Reg16(source, src_mode))
                if dst_mode.contains(AddressingMode::Indirect) && src_mode == AddressingMode::Direct =>
            {
                let value = cpu.read_register16(source).context(UnresolvedTargetSnafu { target: src })?;
                mmu.write16(addr, value);
            }
            _ => {
                let value = Handlers::read8(cpu, mmu, &src)?;
                Handlers::write8(cpu, mmu, &dst, value)?;
            }
        }

        Ok(instruction.cycles.0)
    }

    pub fn add(cpu: &mut Cpu, mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DmgError> {
        let dst = Handlers::lhs(instruction)?;
        let src = Handlers::rhs(instruction)?;

        match (dst, src) {
            // add sp, e
            (Operand::Reg16(Register::SP, _), Operand::Offset(offset)) => {
                let sp = cpu.registers().sp;
                let result = Handlers::add_signed_offset(cpu, sp, offset);
                cpu.registers_mut().sp = result;
            }
            // add hl, r16
            (Operand::Reg16(Register::HL, mode), Operand::Reg16(source, _)) if mode == AddressingMode::Direct => {
                let x = cpu.read_register16(Register::HL).context(UnresolvedTargetSnafu { target: dst })?;
                let y = cpu.read_register16(source).context(UnresolvedTargetSnafu { target: src })?;
                let (result, carry) = x.overflowing_add(y);
                cpu.write_register16(Register::HL, result).context(UnresolvedTargetSnafu { target: dst })?;

                cpu.update_flag(Flags::SUBTRACT, false);
                cpu.update_flag(Flags::HALF_CARRY, (x & 0x0fff) + (y & 0x0fff) > 0x0fff);
                cpu.update_flag(Flags::CARRY, carry);
            }
            _ => {
                let y = Handlers::read8(cpu, mmu, &src)?;
                Handlers::add8(cpu, y, false);
            }
        }

        Ok(instruction.cycles.0)
    }

    pub fn adc(cpu: &mut Cpu, mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DmgError> {
        let y = Handlers::read8(cpu, mmu, &Handlers::rhs(instruction)?)?;
        let carry = cpu.read_flag(Flags::CARRY);
        Handlers::add8(cpu, y, carry);
        Ok(instruction.cycles.0)
    }

    pub fn sub(cpu: &mut Cpu, mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DmgError> {
        let y = Handlers::read8(cpu, mmu, &Handlers::rhs(instruction)?)?;
        let result = Handlers::sub8(cpu, y, false);
        cpu.registers_mut().a = result;
        Ok(instruction.cycles.0)
    }

    pub fn sbc(cpu: &mut Cpu, mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DmgError> {
        let y = Handlers::read8(cpu, mmu, &Handlers::rhs(instruction)?)?;
        let carry = cpu.read_flag(Flags::CARRY);
        let result = Handlers::sub8(cpu, y, carry);
        cpu.registers_mut().a = result;
        Ok(instruction.cycles.0)
    }

    pub fn compare(cpu: &mut Cpu, mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DmgError> {
        let y = Handlers::read8(cpu, mmu, &Handlers::rhs(instruction)?)?;
        Handlers::sub8(cpu, y, false);
        Ok(instruction.cycles.0)
    }

    pub fn and(cpu: &mut Cpu, mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DmgError> {
        let y = Handlers::read8(cpu, mmu, &Handlers::rhs(instruction)?)?;
        let result = cpu.registers().a & y;
        Handlers::logical_result(cpu, result, true);
        Ok(instruction.cycles.0)
    }

    pub fn xor(cpu: &mut Cpu, mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DmgError> {
        let y = Handlers::read8(cpu, mmu, &Handlers::rhs(instruction)?)?;
        let result = cpu.registers().a ^ y;
        Handlers::logical_result(cpu, result, false);
        Ok(instruction.cycles.0)
    }

    pub fn or(cpu: &mut Cpu, mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DmgError> {
        let y = Handlers::read8(cpu, mmu, &Handlers::rhs(instruction)?)?;
        let result = cpu.registers().a | y;
        Handlers::logical_result(cpu, result, false);
        Ok(instruction.cycles.0)
    }

    pub fn increment(cpu: &mut Cpu, mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DmgError> {
        let operand = Handlers::lhs(instruction)?;
        match operand {
            Operand::Reg16(reg, mode) if mode == AddressingMode::Direct => {
                let value = cpu.read_register16(reg).context(UnresolvedTargetSnafu { target: operand })?;
                cpu.write_register16(reg, value.wrapping_add(1))
                    .context(UnresolvedTargetSnafu { target: operand })?;
            }
            _ => {
                let value = Handlers::read8(cpu, mmu, &operand)?;
                let result = value.wrapping_add(1);
                Handlers::write8(cpu, mmu, &operand, result)?;

                cpu.update_flag(Flags::ZERO, result == 0);
                cpu.update_flag(Flags::SUBTRACT, false);
                cpu.update_flag(Flags::HALF_CARRY, (value & 0x0f) == 0x0f);
            }
        }

        Ok(instruction.cycles.0)
    }

    pub fn decrement(cpu: &mut Cpu, mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DmgError> {
        let operand = Handlers::lhs(instruction)?;
        match operand {
            Operand::Reg16(reg, mode) if mode == AddressingMode::Direct => {
                let value = cpu.read_register16(reg).context(UnresolvedTargetSnafu { target: operand })?;
                cpu.write_register16(reg, value.wrapping_sub(1))
                    .context(UnresolvedTargetSnafu { target: operand })?;
            }
            _ => {
                let value = Handlers::read8(cpu, mmu, &operand)?;
                let result = value.wrapping_sub(1);
                Handlers::write8(cpu, mmu, &operand, result)?;

                cpu.update_flag(Flags::ZERO, result == 0);
                cpu.update_flag(Flags::SUBTRACT, true);
                cpu.update_flag(Flags::HALF_CARRY, (value & 0x0f) == 0);
            }
        }

        Ok(instruction.cycles.0)
    }

    /// rlca, rla, rrca, rra: like their prefixed forms, but Z is always cleared.
    pub fn rotate_accumulator(cpu: &mut Cpu, _mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DmgError> {
        let opcode = match instruction.opcode {
            Opcode::Rlca => Opcode::Rlc,
            Opcode::Rla => Opcode::Rl,
            Opcode::Rrca => Opcode::Rrc,
            Opcode::Rra => Opcode::Rr,
            _ => return InvalidHandlerSnafu { instruction: *instruction }.fail(),
        };

        let value = cpu.registers().a;
        let (result, carry) = Handlers::shift_value(opcode, value, cpu.read_flag(Flags::CARRY));
        cpu.registers_mut().a = result;

        cpu.update_flag(Flags::ZERO, false);
        cpu.update_flag(Flags::SUBTRACT, false);
        cpu.update_flag(Flags::HALF_CARRY, false);
        cpu.update_flag(Flags::CARRY, carry);

        Ok(instruction.cycles.0)
    }

    /// Prefixed rotates, shifts and swap.
    pub fn shift(cpu: &mut Cpu, mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DmgError> {
        let operand = Handlers::lhs(instruction)?;
        let value = Handlers::read8(cpu, mmu, &operand)?;
        let (result, carry) = Handlers::shift_value(instruction.opcode, value, cpu.read_flag(Flags::CARRY));
        Handlers::write8(cpu, mmu, &operand, result)?;

        cpu.update_flag(Flags::ZERO, result == 0);
        cpu.update_flag(Flags::SUBTRACT, false);
        cpu.update_flag(Flags::HALF_CARRY, false);
        cpu.update_flag(Flags::CARRY, carry);

        Ok(instruction.cycles.0)
    }

    pub fn test_bit(cpu: &mut Cpu, mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DmgError> {
        let bit = Handlers::bit(instruction)?;
        let value = Handlers::read8(cpu, mmu, &Handlers::rhs(instruction)?)?;

        cpu.update_flag(Flags::ZERO, value & (1 << bit) == 0);
        cpu.update_flag(Flags::SUBTRACT, false);
        cpu.update_flag(Flags::HALF_CARRY, true);

        Ok(instruction.cycles.0)
    }

    pub fn reset_bit(cpu: &mut Cpu, mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DmgError> {
        let bit = Handlers::bit(instruction)?;
        let operand = Handlers::rhs(instruction)?;
        let value = Handlers::read8(cpu, mmu, &operand)?;
        Handlers::write8(cpu, mmu, &operand, value & !(1 << bit))?;
        Ok(instruction.cycles.0)
    }

    pub fn set_bit(cpu: &mut Cpu, mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DmgError> {
        let bit = Handlers::bit(instruction)?;
        let operand = Handlers::rhs(instruction)?;
        let value = Handlers::read8(cpu, mmu, &operand)?;
        Handlers::write8(cpu, mmu, &operand, value | (1 << bit))?;
        Ok(instruction.cycles.0)
    }

    /// jp, jr and call. PC already points past the instruction.
    pub fn jump(cpu: &mut Cpu, mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DmgError> {
        let condition = Handlers::condition(instruction)?;
        if !Handlers::check_condition(cpu, condition) {
            return Ok(Handlers::not_taken(instruction));
        }

        let target = Handlers::rhs(instruction)?;
        let pc = cpu.registers().pc;
        let destination = match target {
            Operand::Imm16(addr, mode) if mode == AddressingMode::Direct => addr,
            Operand::Reg16(reg, mode) if mode == AddressingMode::Direct => {
                cpu.read_register16(reg).context(UnresolvedTargetSnafu { target })?
            }
            Operand::Offset(offset) => pc.wrapping_add_signed(offset as i16),
            _ => return UnresolvedTargetSnafu { target }.fail(),
        };

        if instruction.opcode == Opcode::Call {
            cpu.push_stack(mmu, pc);
        }
        cpu.registers_mut().pc = destination;

        Ok(instruction.cycles.0)
    }

    pub fn ret(cpu: &mut Cpu, mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DmgError> {
        let condition = Handlers::condition(instruction)?;
        if !Handlers::check_condition(cpu, condition) {
            return Ok(Handlers::not_taken(instruction));
        }

        let addr = cpu.pop_stack(mmu);
        cpu.registers_mut().pc = addr;
        Ok(instruction.cycles.0)
    }

    pub fn reti(cpu: &mut Cpu, mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DmgError> {
        let addr = cpu.pop_stack(mmu);
        cpu.registers_mut().pc = addr;
        cpu.enable_interrupts();
        Ok(instruction.cycles.0)
    }

    pub fn restart(cpu: &mut Cpu, mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DmgError> {
        let target = Handlers::lhs(instruction)?;
        let vector = match target {
            Operand::Imm8(vector, _) => vector as u16,
            _ => return UnresolvedTargetSnafu { target }.fail(),
        };

        let pc = cpu.registers().pc;
        cpu.push_stack(mmu, pc);
        cpu.registers_mut().pc = vector;
        Ok(instruction.cycles.0)
    }

    pub fn push(cpu: &mut Cpu, mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DmgError> {
        let operand = Handlers::lhs(instruction)?;
        match operand {
            Operand::Reg16(reg, _) => {
                let value = cpu.read_register16(reg).context(UnresolvedTargetSnafu { target: operand })?;
                cpu.push_stack(mmu, value);
            }
            _ => return UnresolvedTargetSnafu { target: operand }.fail(),
        }

        Ok(instruction.cycles.0)
    }

    pub fn pop(cpu: &mut Cpu, mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DmgError> {
        let operand = Handlers::lhs(instruction)?;
        match operand {
            Operand::Reg16(reg, _) => {
                let value = cpu.pop_stack(mmu);
                cpu.write_register16(reg, value).context(UnresolvedTargetSnafu { target: operand })?;
            }
            _ => return UnresolvedTargetSnafu { target: operand }.fail(),
        }

        Ok(instruction.cycles.0)
    }

    pub fn disable_interrupts(cpu: &mut Cpu, _mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DmgError> {
        cpu.disable_interrupts();
        Ok(instruction.cycles.0)
    }

    pub fn enable_interrupts(cpu: &mut Cpu, _mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DmgError> {
        cpu.schedule_interrupts();
        Ok(instruction.cycles.0)
    }

    pub fn halt(cpu: &mut Cpu, _mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DmgError> {
        cpu.enter_standby();
        Ok(instruction.cycles.0)
    }

    pub fn stop(cpu: &mut Cpu, mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DmgError> {
        debug!("CPU: stop at ${:04x}", cpu.registers().pc.wrapping_sub(instruction.length as u16));
        mmu.timer.reset_divider();
        cpu.enter_standby();
        Ok(instruction.cycles.0)
    }

    pub fn decimal_adjust(cpu: &mut Cpu, _mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DmgError> {
        let mut a = cpu.registers().a;
        let mut carry = cpu.read_flag(Flags::CARRY);
        let half_carry = cpu.read_flag(Flags::HALF_CARRY);

        if !cpu.read_flag(Flags::SUBTRACT) {
            if carry || a > 0x99 {
                a = a.wrapping_add(0x60);
                carry = true;
            }
            if half_carry || (a & 0x0f) > 0x09 {
                a = a.wrapping_add(0x06);
            }
        } else {
            if carry {
                a = a.wrapping_sub(0x60);
            }
            if half_carry {
                a = a.wrapping_sub(0x06);
            }
        }

        cpu.registers_mut().a = a;
        cpu.update_flag(Flags::ZERO, a == 0);
        cpu.update_flag(Flags::HALF_CARRY, false);
        cpu.update_flag(Flags::CARRY, carry);

        Ok(instruction.cycles.0)
    }

    pub fn complement(cpu: &mut Cpu, _mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DmgError> {
        cpu.registers_mut().a ^= 0xff;
        cpu.update_flag(Flags::SUBTRACT, true);
        cpu.update_flag(Flags::HALF_CARRY, true);
        Ok(instruction.cycles.0)
    }

    pub fn set_carry(cpu: &mut Cpu, _mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DmgError> {
        cpu.update_flag(Flags::SUBTRACT, false);
        cpu.update_flag(Flags::HALF_CARRY, false);
        cpu.update_flag(Flags::CARRY, true);
        Ok(instruction.cycles.0)
    }

    pub fn complement_carry(cpu: &mut Cpu, _mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DmgError> {
        let carry = cpu.read_flag(Flags::CARRY);
        cpu.update_flag(Flags::SUBTRACT, false);
        cpu.update_flag(Flags::HALF_CARRY, false);
        cpu.update_flag(Flags::CARRY, !carry);
        Ok(instruction.cycles.0)
    }

    fn lhs(instruction: &Instruction) -> Result<Operand, DmgError> {
        instruction.lhs.context(InvalidHandlerSnafu { instruction: *instruction })
    }

    fn rhs(instruction: &Instruction) -> Result<Operand, DmgError> {
        instruction.rhs.context(InvalidHandlerSnafu { instruction: *instruction })
    }

    fn condition(instruction: &Instruction) -> Result<Condition, DmgError> {
        match instruction.lhs {
            Some(Operand::Conditional(condition)) => Ok(condition),
            _ => InvalidHandlerSnafu { instruction: *instruction }.fail(),
        }
    }

    fn bit(instruction: &Instruction) -> Result<u8, DmgError> {
        match instruction.lhs {
            Some(Operand::Bit(bit)) => Ok(bit),
            _ => InvalidHandlerSnafu { instruction: *instruction }.fail(),
        }
    }

    fn not_taken(instruction: &Instruction) -> usize {
        instruction.cycles.1.unwrap_or(instruction.cycles.0)
    }

    /// Reads an 8-bit operand. `(hl+)`/`(hl-)` step the pointer afterwards.
    fn read8(cpu: &mut Cpu, mmu: &mut Mmu, operand: &Operand) -> Result<u8, DmgError> {
        let target = *operand;
        match target {
            Operand::Reg8(reg, mode) if mode.contains(AddressingMode::Indirect) => {
                // ld a, (c)
                let offset = cpu.read_register(reg).context(UnresolvedTargetSnafu { target })?;
                Ok(mmu.read(HIGH_PAGE + offset as u16))
            }
            Operand::Reg8(reg, _) => cpu.read_register(reg).context(UnresolvedTargetSnafu { target }),
            Operand::Reg16(reg, mode) if mode.contains(AddressingMode::Indirect) => {
                let addr = Handlers::indirect_address(cpu, reg, mode).context(UnresolvedTargetSnafu { target })?;
                Ok(mmu.read(addr))
            }
            Operand::Imm8(value, mode) if mode.contains(AddressingMode::Indirect) => {
                // ldh a, (imm8)
                Ok(mmu.read(HIGH_PAGE + value as u16))
            }
            Operand::Imm8(value, _) => Ok(value),
            Operand::Imm16(addr, mode) if mode.contains(AddressingMode::Indirect) => Ok(mmu.read(addr)),
            _ => UnresolvedTargetSnafu { target }.fail(),
        }
    }

    fn write8(cpu: &mut Cpu, mmu: &mut Mmu, operand: &Operand, value: u8) -> Result<(), DmgError> {
        let target = *operand;
        match target {
            Operand::Reg8(reg, mode) if mode.contains(AddressingMode::Indirect) => {
                // ld (c), a
                let offset = cpu.read_register(reg).context(UnresolvedTargetSnafu { target })?;
                mmu.write(HIGH_PAGE + offset as u16, value);
            }
            Operand::Reg8(reg, _) => cpu.write_register(reg, value).context(UnresolvedTargetSnafu { target })?,
            Operand::Reg16(reg, mode) if mode.contains(AddressingMode::Indirect) => {
                let addr = Handlers::indirect_address(cpu, reg, mode).context(UnresolvedTargetSnafu { target })?;
                mmu.write(addr, value);
            }
            Operand::Imm8(offset, mode) if mode.contains(AddressingMode::Indirect) => {
                // ldh (imm8), a
                mmu.write(HIGH_PAGE + offset as u16, value);
            }
            Operand::Imm16(addr, mode) if mode.contains(AddressingMode::Indirect) => mmu.write(addr, value),
            _ => return UnresolvedTargetSnafu { target }.fail(),
        }

        Ok(())
    }

    /// Address held in `reg`, applying any post-increment/decrement to the register.
    fn indirect_address(cpu: &mut Cpu, reg: Register, mode: AddressingMode) -> Option<u16> {
        let addr = cpu.read_register16(reg)?;
        if mode.contains(AddressingMode::Increment) {
            cpu.write_register16(reg, addr.wrapping_add(1))?;
        } else if mode.contains(AddressingMode::Decrement) {
            cpu.write_register16(reg, addr.wrapping_sub(1))?;
        }
        Some(addr)
    }

    fn add8(cpu: &mut Cpu, y: u8, carry_in: bool) {
        let x = cpu.registers().a;
        let carry = carry_in as u8;
        let result = x.wrapping_add(y).wrapping_add(carry);
        cpu.registers_mut().a = result;

        cpu.update_flag(Flags::ZERO, result == 0);
        cpu.update_flag(Flags::SUBTRACT, false);
        cpu.update_flag(Flags::HALF_CARRY, (x & 0x0f) + (y & 0x0f) + carry > 0x0f);
        cpu.update_flag(Flags::CARRY, x as u16 + y as u16 + carry as u16 > 0xff);
    }

    /// Computes `a - y - carry` and its flags; the caller decides whether to store it.
    fn sub8(cpu: &mut Cpu, y: u8, carry_in: bool) -> u8 {
        let x = cpu.registers().a;
        let carry = carry_in as u8;
        let result = x.wrapping_sub(y).wrapping_sub(carry);

        cpu.update_flag(Flags::ZERO, result == 0);
        cpu.update_flag(Flags::SUBTRACT, true);
        cpu.update_flag(Flags::HALF_CARRY, (x & 0x0f) < (y & 0x0f) + carry);
        cpu.update_flag(Flags::CARRY, (x as u16) < y as u16 + carry as u16);

        result
    }

    fn logical_result(cpu: &mut Cpu, result: u8, half_carry: bool) {
        cpu.registers_mut().a = result;
        cpu.update_flag(Flags::ZERO, result == 0);
        cpu.update_flag(Flags::SUBTRACT, false);
        cpu.update_flag(Flags::HALF_CARRY, half_carry);
        cpu.update_flag(Flags::CARRY, false);
    }

    /// `base + offset` for add sp,e and ld hl,sp+e. Carries come from the low byte.
    fn add_signed_offset(cpu: &mut Cpu, base: u16, offset: i8) -> u16 {
        let unsigned = offset as u8 as u16;

        cpu.update_flag(Flags::ZERO, false);
        cpu.update_flag(Flags::SUBTRACT, false);
        cpu.update_flag(Flags::HALF_CARRY, (base & 0x000f) + (unsigned & 0x000f) > 0x000f);
        cpu.update_flag(Flags::CARRY, (base & 0x00ff) + unsigned > 0x00ff);

        base.wrapping_add_signed(offset as i16)
    }

    fn shift_value(opcode: Opcode, value: u8, carry: bool) -> (u8, bool) {
        match opcode {
            Opcode::Rlc => (value.rotate_left(1), value & 0x80 != 0),
            Opcode::Rrc => (value.rotate_right(1), value & 0x01 != 0),
            Opcode::Rl => ((value << 1) | carry as u8, value & 0x80 != 0),
            Opcode::Rr => ((value >> 1) | ((carry as u8) << 7), value & 0x01 != 0),
            Opcode::Sla => (value << 1, value & 0x80 != 0),
            Opcode::Sra => ((value >> 1) | (value & 0x80), value & 0x01 != 0),
            Opcode::Srl => (value >> 1, value & 0x01 != 0),
            Opcode::Swap => (value.rotate_left(4), false),
            _ => (value, carry),
        }
    }

    fn check_condition(cpu: &Cpu, condition: Condition) -> bool {
        match condition {
            Condition::Z => cpu.read_flag(Flags::ZERO),
            Condition::NZ => !cpu.read_flag(Flags::ZERO),
            Condition::C => cpu.read_flag(Flags::CARRY),
            Condition::NC => !cpu.read_flag(Flags::CARRY),
            Condition::None => true,
        }
    }
}
