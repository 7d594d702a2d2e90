#[cfg(test)]
mod tests {
    use crate::error::DmgError;
    use crate::joypad::{InputHandle, Joypad};
    use crate::lr35902::cpu::Cpu;
    use crate::lr35902::registers::Flags;
    use crate::lr35902::sm83::{Sm83, ILLEGAL_OPCODES, PREFIX};
    use crate::memory::cartridge::{test_image, Cartridge};
    use crate::memory::mmu::Mmu;
    use crate::memory::registers::InterruptFlags;
    use crate::video::frame::FrameHandoff;
    use crate::video::ppu::Ppu;
    use serde_json::Value;

    const PROGRAM: u16 = 0xc000;

    // SingleStepTests layout: decimal values, RAM as [address, value] pairs,
    // one `cycles` entry per machine cycle. Registers missing from `final` are not compared.
    const SINGLE_STEP_CASES: &str = r#"[
        {"name": "80 0000",
         "initial": {"pc": 49152, "sp": 57328, "a": 58, "b": 198, "f": 0, "ram": [[49152, 128]]},
         "final": {"pc": 49153, "a": 0, "b": 198, "f": 176, "ram": []},
         "cycles": [[49152, 128, "r-m"]]},
        {"name": "27 0000",
         "initial": {"pc": 49152, "sp": 57328, "a": 125, "f": 0, "ram": [[49152, 39]]},
         "final": {"pc": 49153, "a": 131, "f": 0, "ram": []},
         "cycles": [[49152, 39, "r-m"]]},
        {"name": "cb 11 0000",
         "initial": {"pc": 49152, "sp": 57328, "c": 128, "f": 0, "ram": [[49152, 203], [49153, 17]]},
         "final": {"pc": 49154, "c": 0, "f": 144, "ram": []},
         "cycles": [[49152, 203, "r-m"], [49153, 17, "r-m"]]},
        {"name": "e8 0000",
         "initial": {"pc": 49152, "sp": 57328, "f": 0, "ram": [[49152, 232], [49153, 255]]},
         "final": {"pc": 49154, "sp": 57327, "f": 16, "ram": []},
         "cycles": [[49152, 232, "r-m"], [49153, 255, "r-m"], [null, null, "---"], [null, null, "---"]]},
        {"name": "f1 0000",
         "initial": {"pc": 49152, "sp": 57328, "a": 0, "f": 0, "ram": [[49152, 241], [57328, 255], [57329, 18]]},
         "final": {"pc": 49153, "sp": 57330, "a": 18, "f": 240, "ram": []},
         "cycles": [[49152, 241, "r-m"], [57328, 255, "r-m"], [57329, 18, "r-m"]]},
        {"name": "22 0000",
         "initial": {"pc": 49152, "sp": 57328, "a": 90, "h": 193, "l": 255, "ram": [[49152, 34]]},
         "final": {"pc": 49153, "h": 194, "l": 0, "ram": [[49663, 90]]},
         "cycles": [[49152, 34, "r-m"], [49663, 90, "-wm"]]},
        {"name": "c4 0000",
         "initial": {"pc": 49152, "sp": 57328, "f": 128, "ram": [[49152, 196], [49153, 52], [49154, 18]]},
         "final": {"pc": 49155, "sp": 57328, "f": 128, "ram": []},
         "cycles": [[49152, 196, "r-m"], [49153, 52, "r-m"], [49154, 18, "r-m"]]},
        {"name": "c4 0001",
         "initial": {"pc": 49152, "sp": 57328, "f": 0, "ram": [[49152, 196], [49153, 52], [49154, 18]]},
         "final": {"pc": 4660, "sp": 57326, "ram": [[57326, 3], [57327, 192]]},
         "cycles": [[49152, 196, "r-m"], [49153, 52, "r-m"], [49154, 18, "r-m"], [null, null, "---"],
                    [57327, 192, "-wm"], [57326, 3, "-wm"]]},
        {"name": "9f 0000",
         "initial": {"pc": 49152, "sp": 57328, "a": 16, "f": 16, "ram": [[49152, 159]]},
         "final": {"pc": 49153, "a": 255, "f": 112, "ram": []},
         "cycles": [[49152, 159, "r-m"]]},
        {"name": "cb 7e 0000",
         "initial": {"pc": 49152, "sp": 57328, "h": 193, "l": 0, "f": 16,
                     "ram": [[49152, 203], [49153, 126], [49408, 127]]},
         "final": {"pc": 49154, "f": 176, "ram": [[49408, 127]]},
         "cycles": [[49152, 203, "r-m"], [49153, 126, "r-m"], [49408, 127, "r-m"]]},
        {"name": "08 0000",
         "initial": {"pc": 49152, "sp": 57328, "ram": [[49152, 8], [49153, 0], [49154, 194]]},
         "final": {"pc": 49155, "sp": 57328, "ram": [[49664, 240], [49665, 223]]},
         "cycles": [[49152, 8, "r-m"], [49153, 0, "r-m"], [49154, 194, "r-m"], [49664, 240, "-wm"],
                    [49665, 223, "-wm"]]},
        {"name": "f8 0000",
         "initial": {"pc": 49152, "sp": 57343, "f": 128, "ram": [[49152, 248], [49153, 2]]},
         "final": {"pc": 49154, "sp": 57343, "h": 224, "l": 1, "f": 48, "ram": []},
         "cycles": [[49152, 248, "r-m"], [49153, 2, "r-m"], [null, null, "---"]]},
        {"name": "cb 36 0000",
         "initial": {"pc": 49152, "sp": 57328, "h": 193, "l": 0, "f": 16,
                     "ram": [[49152, 203], [49153, 54], [49408, 241]]},
         "final": {"pc": 49154, "f": 0, "ram": [[49408, 31]]},
         "cycles": [[49152, 203, "r-m"], [49153, 54, "r-m"], [49408, 241, "r-m"], [49408, 31, "-wm"]]},
        {"name": "3f 0000",
         "initial": {"pc": 49152, "sp": 57328, "f": 112, "ram": [[49152, 63]]},
         "final": {"pc": 49153, "f": 0, "ram": []},
         "cycles": [[49152, 63, "r-m"]]},
        {"name": "18 0000",
         "initial": {"pc": 49152, "sp": 57328, "ram": [[49152, 24], [49153, 254]]},
         "final": {"pc": 49152, "ram": []},
         "cycles": [[49152, 24, "r-m"], [49153, 254, "r-m"], [null, null, "---"]]},
        {"name": "ff 0000",
         "initial": {"pc": 49152, "sp": 57328, "ram": [[49152, 255]]},
         "final": {"pc": 56, "sp": 57326, "ram": [[57326, 1], [57327, 192]]},
         "cycles": [[49152, 255, "r-m"], [null, null, "---"], [57327, 192, "-wm"], [57326, 1, "-wm"]]},
        {"name": "d9 0000",
         "initial": {"pc": 49152, "sp": 57328, "ime": 0, "ram": [[49152, 217], [57328, 0], [57329, 193]]},
         "final": {"pc": 49408, "sp": 57330, "ime": 1, "ram": []},
         "cycles": [[49152, 217, "r-m"], [57328, 0, "r-m"], [57329, 193, "r-m"], [null, null, "---"]]},
        {"name": "f2 0000",
         "initial": {"pc": 49152, "sp": 57328, "c": 128, "ram": [[49152, 242], [65408, 66]]},
         "final": {"pc": 49153, "a": 66, "ram": []},
         "cycles": [[49152, 242, "r-m"], [65408, 66, "r-m"]]}
    ]"#;

    fn system(program: &[u8]) -> (Cpu, Mmu) {
        let cartridge = Cartridge::from_image(test_image(0x00, 0x00, 0x00)).unwrap();
        let mut mmu = Mmu::new(
            cartridge,
            Vec::new(),
            Ppu::new(FrameHandoff::new(), true),
            Joypad::new(InputHandle::new()),
        );
        for (offset, byte) in program.iter().enumerate() {
            mmu.write(PROGRAM + offset as u16, *byte);
        }

        let mut cpu = Cpu::new();
        cpu.registers_mut().pc = PROGRAM;
        cpu.registers_mut().sp = 0xdff0;
        (cpu, mmu)
    }

    fn field(state: &Value, name: &str) -> u64 {
        state[name].as_u64().unwrap_or(0)
    }

    fn run_case(case: &Value) {
        let name = case["name"].as_str().unwrap();
        let initial = &case["initial"];
        let final_state = &case["final"];
        let (mut cpu, mut mmu) = system(&[]);

        {
            let registers = cpu.registers_mut();
            registers.a = field(initial, "a") as u8;
            registers.f = Flags::from_bits_truncate(field(initial, "f") as u8);
            registers.b = field(initial, "b") as u8;
            registers.c = field(initial, "c") as u8;
            registers.d = field(initial, "d") as u8;
            registers.e = field(initial, "e") as u8;
            registers.h = field(initial, "h") as u8;
            registers.l = field(initial, "l") as u8;
            registers.sp = field(initial, "sp") as u16;
            registers.pc = field(initial, "pc") as u16;
        }
        for entry in initial["ram"].as_array().unwrap() {
            mmu.write(entry[0].as_u64().unwrap() as u16, entry[1].as_u64().unwrap() as u8);
        }

        let cycles = cpu.step(&mut mmu).unwrap();
        assert_eq!(
            cycles,
            case["cycles"].as_array().unwrap().len() * 4,
            "Cycle count failed for {}",
            name
        );

        let registers = cpu.registers();
        let actual = [
            ("a", registers.a as u64),
            ("f", registers.f.bits() as u64),
            ("b", registers.b as u64),
            ("c", registers.c as u64),
            ("d", registers.d as u64),
            ("e", registers.e as u64),
            ("h", registers.h as u64),
            ("l", registers.l as u64),
            ("sp", registers.sp as u64),
            ("pc", registers.pc as u64),
            ("ime", cpu.interrupts_enabled() as u64),
        ];
        for (register, value) in actual {
            if let Some(expected) = final_state[register].as_u64() {
                assert_eq!(value, expected, "Comparison with register {} failed for {}", register, name);
            }
        }

        for entry in final_state["ram"].as_array().unwrap() {
            let addr = entry[0].as_u64().unwrap() as u16;
            let expected = entry[1].as_u64().unwrap() as u8;
            assert_eq!(mmu.read(addr), expected, "Comparison with ${:04x} failed for {}", addr, name);
        }
    }

    #[test]
    fn single_step_cases() {
        let cases: Value = serde_json::from_str(SINGLE_STEP_CASES).unwrap();
        for case in cases.as_array().unwrap() {
            run_case(case);
        }
    }

    #[test]
    fn every_defined_opcode_decodes() {
        let sm83 = Sm83::new();
        let (_, mut mmu) = system(&[]);

        for opcode in 0..=0xffu8 {
            mmu.write(PROGRAM, opcode);
            let result = sm83.decode(&mmu, PROGRAM);
            if ILLEGAL_OPCODES.contains(&opcode) {
                assert!(
                    matches!(result, Err(DmgError::IllegalOpcode { opcode: o, address: PROGRAM }) if o == opcode),
                    "${:02x} should be illegal",
                    opcode
                );
            } else {
                assert!(result.is_ok(), "${:02x} failed to decode", opcode);
            }
        }

        mmu.write(PROGRAM, PREFIX);
        for opcode in 0..=0xffu8 {
            mmu.write(PROGRAM + 1, opcode);
            let instruction = sm83.decode(&mmu, PROGRAM).unwrap();
            assert_eq!(instruction.length, 2, "$cb {:02x}", opcode);
        }
    }

    #[test]
    fn instructions_render_as_assembly() {
        let sm83 = Sm83::new();
        let cases: [(&[u8], &str); 6] = [
            (&[0x22], "ld (hl+), a"),
            (&[0xc2, 0x34, 0x12], "jp nz, $1234"),
            (&[0xc3, 0x34, 0x12], "jp $1234"),
            (&[0xcb, 0x7e], "bit 7, (hl)"),
            (&[0xe0, 0x40], "ldh ($40), a"),
            (&[0x18, 0xfe], "jr -2"),
        ];

        for (bytes, text) in cases {
            let (_, mmu) = system(bytes);
            assert_eq!(sm83.decode(&mmu, PROGRAM).unwrap().to_string(), text);
        }
    }

    /// Base opcode costs in T-cycles, branches taken. Zero marks the prefix
    /// and the illegal opcodes.
    #[rustfmt::skip]
    const BASE_CYCLES: [usize; 256] = [
        4, 12,  8,  8,  4,  4,  8,  4, 20,  8,  8,  8,  4,  4,  8,  4,
        4, 12,  8,  8,  4,  4,  8,  4, 12,  8,  8,  8,  4,  4,  8,  4,
       12, 12,  8,  8,  4,  4,  8,  4, 12,  8,  8,  8,  4,  4,  8,  4,
       12, 12,  8,  8, 12, 12, 12,  4, 12,  8,  8,  8,  4,  4,  8,  4,
        4,  4,  4,  4,  4,  4,  8,  4,  4,  4,  4,  4,  4,  4,  8,  4,
        4,  4,  4,  4,  4,  4,  8,  4,  4,  4,  4,  4,  4,  4,  8,  4,
        4,  4,  4,  4,  4,  4,  8,  4,  4,  4,  4,  4,  4,  4,  8,  4,
        8,  8,  8,  8,  8,  8,  4,  8,  4,  4,  4,  4,  4,  4,  8,  4,
        4,  4,  4,  4,  4,  4,  8,  4,  4,  4,  4,  4,  4,  4,  8,  4,
        4,  4,  4,  4,  4,  4,  8,  4,  4,  4,  4,  4,  4,  4,  8,  4,
        4,  4,  4,  4,  4,  4,  8,  4,  4,  4,  4,  4,  4,  4,  8,  4,
        4,  4,  4,  4,  4,  4,  8,  4,  4,  4,  4,  4,  4,  4,  8,  4,
       20, 12, 16, 16, 24, 16,  8, 16, 20, 16, 16,  0, 24, 24,  8, 16,
       20, 12, 16,  0, 24, 16,  8, 16, 20, 16, 16,  0, 24,  0,  8, 16,
       12, 12,  8,  0,  0, 16,  8, 16, 16,  4, 16,  0,  0,  0,  8, 16,
       12, 12,  8,  4,  0, 16,  8, 16, 12,  8, 16,  4,  0,  0,  8, 16,
    ];

    /// Flags that take and skip a conditional branch, with the skipped cost.
    fn branch_conditions(opcode: u8) -> Option<(Flags, Flags, usize)> {
        let skipped_cost = match opcode {
            0x20 | 0x28 | 0x30 | 0x38 | 0xc0 | 0xc8 | 0xd0 | 0xd8 => 8,
            0xc2 | 0xca | 0xd2 | 0xda | 0xc4 | 0xcc | 0xd4 | 0xdc => 12,
            _ => return None,
        };
        let flag = if (opcode >> 4) & 1 == 0 { Flags::ZERO } else { Flags::CARRY };
        if (opcode >> 3) & 1 == 1 {
            Some((flag, Flags::empty(), skipped_cost))
        } else {
            Some((Flags::empty(), flag, skipped_cost))
        }
    }

    fn cb_cycles(opcode: u8) -> usize {
        match (opcode >> 6, opcode & 0b111) {
            (1, 6) => 12,
            (_, 6) => 16,
            _ => 8,
        }
    }

    /// Runs `program` from a fresh copy of `template` three times and checks
    /// every run costs `expected`. Pointer registers aim at work RAM away
    /// from the program.
    fn assert_cost(template: &Cpu, mmu: &mut Mmu, program: &[u8], flags: Flags, expected: usize) {
        for (offset, byte) in program.iter().enumerate() {
            mmu.write(PROGRAM + offset as u16, *byte);
        }
        for _ in 0..3 {
            let mut cpu = template.clone();
            let registers = cpu.registers_mut();
            registers.pc = PROGRAM;
            registers.sp = 0xdff0;
            registers.f = flags;
            registers.b = 0xc1;
            registers.c = 0x00;
            registers.d = 0xc1;
            registers.e = 0x00;
            registers.h = 0xc1;
            registers.l = 0x00;
            assert_eq!(
                cpu.step(mmu).unwrap(),
                expected,
                "{:02x?} with {:?}",
                program,
                flags
            );
        }
    }

    #[test]
    fn base_opcode_costs_repeat_exactly() {
        let (template, mut mmu) = system(&[]);
        let mut covered = 0;

        for opcode in 0..=0xffu8 {
            if opcode == PREFIX || ILLEGAL_OPCODES.contains(&opcode) {
                assert_eq!(BASE_CYCLES[opcode as usize], 0);
                continue;
            }
            // Immediates point at $C100 and jump there.
            let program = [opcode, 0x00, 0xc1];
            let expected = BASE_CYCLES[opcode as usize];
            match branch_conditions(opcode) {
                Some((taken, skipped, skipped_cost)) => {
                    assert_cost(&template, &mut mmu, &program, taken, expected);
                    assert_cost(&template, &mut mmu, &program, skipped, skipped_cost);
                }
                None => assert_cost(&template, &mut mmu, &program, Flags::empty(), expected),
            }
            covered += 1;
        }

        assert_eq!(covered, 244);
    }

    #[test]
    fn prefixed_opcode_costs_repeat_exactly() {
        let (template, mut mmu) = system(&[]);
        for opcode in 0..=0xffu8 {
            assert_cost(&template, &mut mmu, &[PREFIX, opcode], Flags::empty(), cb_cycles(opcode));
        }
    }

    #[test]
    fn vblank_wins_over_joypad() {
        // ei; nop
        let (mut cpu, mut mmu) = system(&[0xfb, 0x00, 0x00]);
        mmu.irq.write_enable((InterruptFlags::VBLANK | InterruptFlags::JOYPAD).bits());
        mmu.irq.request(InterruptFlags::JOYPAD);
        mmu.irq.request(InterruptFlags::VBLANK);

        assert_eq!(cpu.step(&mut mmu).unwrap(), 4);
        // The instruction after EI still runs before any dispatch.
        assert_eq!(cpu.step(&mut mmu).unwrap(), 4);
        assert_eq!(cpu.registers().pc, PROGRAM + 2);

        assert_eq!(cpu.step(&mut mmu).unwrap(), 20);
        assert_eq!(cpu.registers().pc, 0x0040);
        assert!(!cpu.interrupts_enabled());
        assert_eq!(mmu.irq.read_flags(), 0xe0 | InterruptFlags::JOYPAD.bits());
        assert_eq!(mmu.read16(cpu.registers().sp), PROGRAM + 2);
    }

    #[test]
    fn di_cancels_pending_enable() {
        // ei; di; nop
        let (mut cpu, mut mmu) = system(&[0xfb, 0xf3, 0x00]);
        mmu.irq.write_enable(InterruptFlags::TIMER.bits());
        mmu.irq.request(InterruptFlags::TIMER);

        for _ in 0..3 {
            assert_eq!(cpu.step(&mut mmu).unwrap(), 4);
        }
        assert_eq!(cpu.registers().pc, PROGRAM + 3);
        assert!(!cpu.interrupts_enabled());
    }

    #[test]
    fn halt_wakes_without_ime() {
        // halt; inc a
        let (mut cpu, mut mmu) = system(&[0x76, 0x3c]);
        assert_eq!(cpu.step(&mut mmu).unwrap(), 4);
        assert!(cpu.is_standby());
        assert_eq!(cpu.step(&mut mmu).unwrap(), 4);
        assert_eq!(cpu.registers().pc, PROGRAM + 1);

        mmu.irq.write_enable(InterruptFlags::SERIAL.bits());
        mmu.irq.request(InterruptFlags::SERIAL);
        cpu.step(&mut mmu).unwrap();
        assert!(!cpu.is_standby());
        assert_eq!(cpu.registers().a, 1);
    }

    #[test]
    fn stop_is_two_bytes_and_enters_standby() {
        let (mut cpu, mut mmu) = system(&[0x10, 0x00]);
        assert_eq!(cpu.step(&mut mmu).unwrap(), 4);
        assert_eq!(cpu.registers().pc, PROGRAM + 2);
        assert!(cpu.is_standby());
    }

    #[test]
    fn illegal_opcode_breaks_cpu() {
        let (mut cpu, mut mmu) = system(&[0xd3]);
        assert!(matches!(
            cpu.step(&mut mmu),
            Err(DmgError::IllegalOpcode {
                opcode: 0xd3,
                address: PROGRAM
            })
        ));
        assert!(!cpu.is_alive());
        assert!(matches!(cpu.step(&mut mmu), Err(DmgError::CpuNotAlive)));
    }

    #[test]
    fn exec_cycles_overshoot_is_bounded() {
        // ld hl, $c100; inc (hl); push bc; pop bc; call $c00c; jp $c000; (at $c00c) ret
        let program = [
            0x21, 0x00, 0xc1, 0x34, 0xc5, 0xc1, 0xcd, 0x0c, 0xc0, 0xc3, 0x00, 0xc0, 0xc9,
        ];

        for budget in 1..300 {
            let (mut cpu, mut mmu) = system(&program);
            let mut observed = 0;
            let overshoot = cpu
                .exec_cycles(&mut mmu, budget, |_, cycles| observed += cycles)
                .unwrap();

            assert!(overshoot < 24, "budget {} overshot by {}", budget, overshoot);
            assert_eq!(observed, budget + overshoot);
            assert_eq!(cpu.cycles(), observed);
        }
    }

    #[test]
    fn post_boot_register_file() {
        let cpu = Cpu::post_boot();
        let registers = cpu.registers();
        assert_eq!(registers.pc, 0x0100);
        assert_eq!(registers.sp, 0xfffe);
        assert_eq!(u16::from_be_bytes([registers.a, registers.f.bits()]), 0x01b0);
        assert_eq!(u16::from_be_bytes([registers.b, registers.c]), 0x0013);
        assert_eq!(u16::from_be_bytes([registers.d, registers.e]), 0x00d8);
        assert_eq!(u16::from_be_bytes([registers.h, registers.l]), 0x014d);
    }
}
