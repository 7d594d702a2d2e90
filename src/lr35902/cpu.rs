use crate::error::{CpuNotAliveSnafu, DmgError};
use crate::lr35902::handlers::Handlers;
use crate::lr35902::irq::{Ime, Vector};
use crate::lr35902::registers::{Flags, Registers};
use crate::lr35902::sm83::{Instruction, Opcode, Register, Sm83};
use crate::memory::mmu::Mmu;
use log::{error, trace};
use snafu::ensure;

pub const INTERRUPT_CYCLES: usize = 20;
pub const STANDBY_CYCLES: usize = 4;

#[derive(Clone)]
pub struct Cpu {
    sm83: Sm83,
    registers: Registers,
    ime: Ime,
    standby: bool,
    alive: bool,
    cycles: usize,
}

impl Cpu {
    /// Power-on state, for running a boot ROM from $0000.
    pub fn new() -> Cpu {
        Cpu::with_registers(Registers::default())
    }

    /// State the boot ROM hands over to the cartridge.
    pub fn post_boot() -> Cpu {
        Cpu::with_registers(Registers::post_boot())
    }

    pub fn with_registers(registers: Registers) -> Cpu {
        Cpu {
            sm83: Sm83::new(),
            registers,
            ime: Ime::default(),
            standby: false,
            alive: true,
            cycles: 0,
        }
    }

    /// Executes one instruction, services one interrupt or idles in standby.
    pub fn step(&mut self, mmu: &mut Mmu) -> Result<usize, DmgError> {
        ensure!(self.alive, CpuNotAliveSnafu);

        if self.standby {
            if !mmu.irq.has_pending() {
                self.cycles += STANDBY_CYCLES;
                return Ok(STANDBY_CYCLES);
            }
            self.standby = false;
        }

        if self.ime.enabled {
            if let Some(vector) = mmu.irq.next_vector() {
                self.service_interrupt(mmu, vector);
                self.cycles += INTERRUPT_CYCLES;
                return Ok(INTERRUPT_CYCLES);
            }
        }

        let enable_after = self.ime.enable_pending;
        let pc = self.registers.pc;

        let cycles = match self.sm83.decode(mmu, pc) {
            Ok(instruction) => {
                trace!("[{:#06x}] {}", pc, instruction);
                self.registers.pc = pc.wrapping_add(instruction.length as u16);
                self.execute(mmu, &instruction)
            }
            Err(e) => Err(e),
        };

        let cycles = match cycles {
            Ok(cycles) => cycles,
            Err(e) => {
                error!("CPU: {} (at ${:04x})\n{}", e, pc, self);
                self.break_execution();
                return Err(e);
            }
        };

        // EI takes effect once the following instruction has run; DI in between cancels it.
        if enable_after && self.ime.enable_pending {
            self.ime.enabled = true;
            self.ime.enable_pending = false;
        }

        self.cycles += cycles;
        Ok(cycles)
    }

    /// Steps until at least `budget` cycles are consumed, calling `on_step` with each
    /// step's cost. Returns how far the last instruction ran past the budget.
    pub fn exec_cycles<F>(&mut self, mmu: &mut Mmu, budget: usize, mut on_step: F) -> Result<usize, DmgError>
    where
        F: FnMut(&mut Mmu, usize),
    {
        let mut consumed = 0;
        while consumed < budget {
            let cycles = self.step(mmu)?;
            on_step(mmu, cycles);
            consumed += cycles;
        }

        Ok(consumed - budget)
    }

    fn execute(&mut self, mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DmgError> {
        match instruction.opcode {
            Opcode::Nop => Handlers::nop(self, mmu, instruction),
            Opcode::Ld | Opcode::Ldh => Handlers::load(self, mmu, instruction),
            Opcode::Inc => Handlers::increment(self, mmu, instruction),
            Opcode::Dec => Handlers::decrement(self, mmu, instruction),
            Opcode::Add => Handlers::add(self, mmu, instruction),
            Opcode::Adc => Handlers::adc(self, mmu, instruction),
            Opcode::Sub => Handlers::sub(self, mmu, instruction),
            Opcode::Sbc => Handlers::sbc(self, mmu, instruction),
            Opcode::And => Handlers::and(self, mmu, instruction),
            Opcode::Xor => Handlers::xor(self, mmu, instruction),
            Opcode::Or => Handlers::or(self, mmu, instruction),
            Opcode::Cp => Handlers::compare(self, mmu, instruction),
            Opcode::Rlca | Opcode::Rla | Opcode::Rrca | Opcode::Rra => {
                Handlers::rotate_accumulator(self, mmu, instruction)
            }
            Opcode::Rlc
            | Opcode::Rrc
            | Opcode::Rl
            | Opcode::Rr
            | Opcode::Sla
            | Opcode::Sra
            | Opcode::Swap
            | Opcode::Srl => Handlers::shift(self, mmu, instruction),
            Opcode::Bit => Handlers::test_bit(self, mmu, instruction),
            Opcode::Res => Handlers::reset_bit(self, mmu, instruction),
            Opcode::Set => Handlers::set_bit(self, mmu, instruction),
            Opcode::Jp | Opcode::Jr | Opcode::Call => Handlers::jump(self, mmu, instruction),
            Opcode::Ret => Handlers::ret(self, mmu, instruction),
            Opcode::Reti => Handlers::reti(self, mmu, instruction),
            Opcode::Rst => Handlers::restart(self, mmu, instruction),
            Opcode::Push => Handlers::push(self, mmu, instruction),
            Opcode::Pop => Handlers::pop(self, mmu, instruction),
            Opcode::Di => Handlers::disable_interrupts(self, mmu, instruction),
            Opcode::Ei => Handlers::enable_interrupts(self, mmu, instruction),
            Opcode::Halt => Handlers::halt(self, mmu, instruction),
            Opcode::Stop => Handlers::stop(self, mmu, instruction),
            Opcode::Daa => Handlers::decimal_adjust(self, mmu, instruction),
            Opcode::Cpl => Handlers::complement(self, mmu, instruction),
            Opcode::Scf => Handlers::set_carry(self, mmu, instruction),
            Opcode::Ccf => Handlers::complement_carry(self, mmu, instruction),
        }
    }

    fn service_interrupt(&mut self, mmu: &mut Mmu, vector: Vector) {
        trace!("CPU: servicing {} interrupt", vector);
        self.ime.enabled = false;
        self.ime.enable_pending = false;
        mmu.irq.acknowledge(vector);

        let pc = self.registers.pc;
        self.push_stack(mmu, pc);
        self.registers.pc = vector.to_address();
    }

    pub fn break_execution(&mut self) {
        self.alive = false;
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn is_standby(&self) -> bool {
        self.standby
    }

    pub fn interrupts_enabled(&self) -> bool {
        self.ime.enabled
    }

    /// Total cycles consumed since construction.
    pub fn cycles(&self) -> usize {
        self.cycles
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.registers
    }

    pub(crate) fn enable_interrupts(&mut self) {
        self.ime.enabled = true;
        self.ime.enable_pending = false;
    }

    pub(crate) fn schedule_interrupts(&mut self) {
        if !self.ime.enabled {
            self.ime.enable_pending = true;
        }
    }

    pub(crate) fn disable_interrupts(&mut self) {
        self.ime.enabled = false;
        self.ime.enable_pending = false;
    }

    pub(crate) fn enter_standby(&mut self) {
        self.standby = true;
    }

    pub fn push_stack(&mut self, mmu: &mut Mmu, value: u16) {
        self.registers.sp = self.registers.sp.wrapping_sub(2);
        mmu.write16(self.registers.sp, value);
    }

    pub fn pop_stack(&mut self, mmu: &mut Mmu) -> u16 {
        let value = mmu.read16(self.registers.sp);
        self.registers.sp = self.registers.sp.wrapping_add(2);
        value
    }

    pub fn read_flag(&self, flag: Flags) -> bool {
        self.registers.f.contains(flag)
    }

    pub fn update_flag(&mut self, flag: Flags, value: bool) {
        self.registers.f.set(flag, value);
    }

    pub fn read_register(&self, register: Register) -> Option<u8> {
        match register {
            Register::A => Some(self.registers.a),
            Register::B => Some(self.registers.b),
            Register::C => Some(self.registers.c),
            Register::D => Some(self.registers.d),
            Register::E => Some(self.registers.e),
            Register::H => Some(self.registers.h),
            Register::L => Some(self.registers.l),
            Register::F => Some(self.registers.f.bits()),
            _ => None,
        }
    }

    pub fn read_register16(&self, register: Register) -> Option<u16> {
        let registers = &self.registers;
        match register {
            Register::AF => Some(u16::from_be_bytes([registers.a, registers.f.bits()])),
            Register::BC => Some(u16::from_be_bytes([registers.b, registers.c])),
            Register::DE => Some(u16::from_be_bytes([registers.d, registers.e])),
            Register::HL => Some(u16::from_be_bytes([registers.h, registers.l])),
            Register::SP => Some(registers.sp),
            Register::PC => Some(registers.pc),
            _ => None,
        }
    }

    pub fn write_register(&mut self, register: Register, data: u8) -> Option<()> {
        match register {
            Register::A => self.registers.a = data,
            Register::B => self.registers.b = data,
            Register::C => self.registers.c = data,
            Register::D => self.registers.d = data,
            Register::E => self.registers.e = data,
            Register::H => self.registers.h = data,
            Register::L => self.registers.l = data,
            Register::F => self.registers.f = Flags::from_bits_truncate(data),
            _ => return None,
        }
        Some(())
    }

    pub fn write_register16(&mut self, register: Register, value: u16) -> Option<()> {
        let [high, low] = value.to_be_bytes();
        match register {
            Register::AF => {
                self.registers.a = high;
                // The low nibble of F does not exist.
                self.registers.f = Flags::from_bits_truncate(low);
            }
            Register::BC => {
                self.registers.b = high;
                self.registers.c = low;
            }
            Register::DE => {
                self.registers.d = high;
                self.registers.e = low;
            }
            Register::HL => {
                self.registers.h = high;
                self.registers.l = low;
            }
            Register::SP => self.registers.sp = value,
            Register::PC => self.registers.pc = value,
            _ => return None,
        }
        Some(())
    }
}

impl Default for Cpu {
    fn default() -> Cpu {
        Cpu::new()
    }
}

impl std::fmt::Display for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "A: ${:02x}  F: ${:02x}  B: ${:02x}  C: ${:02x}  D: ${:02x}  E: ${:02x}  H: ${:02x}  L: ${:02x}  SP: ${:04x}  PC: ${:04x}",
            self.registers.a,
            self.registers.f.bits(),
            self.registers.b,
            self.registers.c,
            self.registers.d,
            self.registers.e,
            self.registers.h,
            self.registers.l,
            self.registers.sp,
            self.registers.pc
        )
    }
}
