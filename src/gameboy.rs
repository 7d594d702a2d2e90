use crate::clock::{Clock, RunControl};
use crate::error::{DmgError, NotResetSnafu};
use crate::joypad::{ButtonState, InputHandle, Joypad};
use crate::lr35902::cpu::Cpu;
use crate::memory::cartridge::Cartridge;
use crate::memory::mmu::Mmu;
use crate::settings::Settings;
use crate::storage::Storage;
use crate::video::frame::{Frame, FrameHandoff};
use crate::video::ppu::Ppu;
use log::info;
use snafu::OptionExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

struct Core {
    cpu: Cpu,
    mmu: Mmu,
    clock: Clock,
}

/// One emulated system. Owns every piece of machine state; nothing is global.
pub struct GameBoy {
    storage: Box<dyn Storage>,
    settings: Settings,
    core: Option<Core>,
    control: Arc<RunControl>,
    input: InputHandle,
    handoff: FrameHandoff,
    overclock: Arc<AtomicBool>,
}

impl GameBoy {
    pub fn new<S: Storage + 'static>(storage: S, settings: Settings) -> GameBoy {
        GameBoy {
            storage: Box::new(storage),
            overclock: Arc::new(AtomicBool::new(settings.overclock)),
            settings,
            core: None,
            control: Arc::new(RunControl::new()),
            input: InputHandle::new(),
            handoff: FrameHandoff::new(),
        }
    }

    /// Handle for the presentation side. Valid across resets.
    pub fn handle(&self) -> SystemHandle {
        SystemHandle {
            control: self.control.clone(),
            input: self.input.clone(),
            handoff: self.handoff.clone(),
            overclock: self.overclock.clone(),
        }
    }

    /// Loads the cartridge, BIOS and battery through storage and builds fresh
    /// machine state. Must run before the clock can advance.
    pub fn reset(&mut self) -> Result<(), DmgError> {
        let rom = self.storage.load_rom()?;
        let bios = self.storage.load_bios()?;

        let mut cartridge = Cartridge::from_image(rom)?;
        if cartridge.has_battery() {
            let battery = self.storage.load_battery()?;
            if !battery.is_empty() {
                cartridge.load_ram(&battery)?;
                info!("Loaded {} bytes of battery RAM", battery.len());
            }
        }

        let with_bios = !bios.is_empty();
        let ppu = Ppu::new(self.handoff.clone(), self.settings.access_contention);
        let joypad = Joypad::new(self.input.clone());
        let mut mmu = Mmu::new(cartridge, bios, ppu, joypad);

        let cpu = if with_bios {
            Cpu::new()
        } else {
            mmu.apply_post_boot();
            Cpu::post_boot()
        };

        self.core = Some(Core {
            cpu,
            mmu,
            clock: Clock::new(self.settings.quantum_cycles, self.overclock.clone()),
        });
        self.control.rearm();

        info!(
            "System reset ({})",
            if with_bios { "running boot ROM" } else { "post-boot state" }
        );
        Ok(())
    }

    /// Runs one untimed quantum. Returns the cycles consumed.
    pub fn run_quantum(&mut self) -> Result<usize, DmgError> {
        let core = self.core.as_mut().context(NotResetSnafu)?;
        core.clock.perform_sleep_cycle_ticks(&mut core.cpu, &mut core.mmu)
    }

    /// Runs one quantum, paced to real time unless uncapped.
    pub fn run_sleep_cycle(&mut self) -> Result<usize, DmgError> {
        let core = self.core.as_mut().context(NotResetSnafu)?;
        if self.settings.uncapped {
            core.clock.perform_sleep_cycle_ticks(&mut core.cpu, &mut core.mmu)
        } else {
            core.clock
                .perform_sleep_cycle(&mut core.cpu, &mut core.mmu, &self.control)
        }
    }

    /// Loops sleep cycles until stopped or the CPU breaks. Blocks while paused.
    pub fn run_event_loop(&mut self) -> Result<(), DmgError> {
        if self.core.is_none() {
            return NotResetSnafu.fail();
        }

        info!("Entering event loop");
        loop {
            let state = self.control.wait_while_paused();
            if state.save_requested {
                self.save_persisted_state()?;
            }
            if state.stopped {
                info!("Event loop stopped");
                break;
            }
            if !state.running {
                continue;
            }
            if !self.is_alive() {
                info!("CPU halted execution, leaving event loop");
                break;
            }
            self.run_sleep_cycle()?;
        }

        Ok(())
    }

    pub fn pause(&self) {
        self.control.pause();
    }

    pub fn resume(&self) {
        self.control.resume();
    }

    pub fn stop(&self) {
        self.control.stop();
    }

    /// Writes battery RAM through storage. `Ok(false)` if the cartridge has no battery.
    pub fn save_persisted_state(&mut self) -> Result<bool, DmgError> {
        let core = self.core.as_ref().context(NotResetSnafu)?;
        let cartridge = core.mmu.cartridge();
        if !cartridge.has_battery() {
            return Ok(false);
        }

        let data = cartridge.dump_ram();
        self.storage.save_battery(&data)?;
        info!("Saved {} bytes of battery RAM", data.len());
        Ok(true)
    }

    pub fn is_alive(&self) -> bool {
        self.core.as_ref().map(|core| core.cpu.is_alive()).unwrap_or(false)
    }

    pub fn cpu(&self) -> Option<&Cpu> {
        self.core.as_ref().map(|core| &core.cpu)
    }

    pub fn mmu(&self) -> Option<&Mmu> {
        self.core.as_ref().map(|core| &core.mmu)
    }

    pub fn mmu_mut(&mut self) -> Option<&mut Mmu> {
        self.core.as_mut().map(|core| &mut core.mmu)
    }

    /// Bytes the program sent over the serial port.
    pub fn serial_output(&self) -> &[u8] {
        self.core.as_ref().map(|core| core.mmu.serial.output()).unwrap_or(&[])
    }
}

/// Thread-safe control surface for a running `GameBoy`.
#[derive(Clone)]
pub struct SystemHandle {
    control: Arc<RunControl>,
    input: InputHandle,
    handoff: FrameHandoff,
    overclock: Arc<AtomicBool>,
}

impl SystemHandle {
    pub fn pause(&self) {
        self.control.pause();
    }

    pub fn resume(&self) {
        self.control.resume();
    }

    pub fn stop(&self) {
        self.control.stop();
    }

    pub fn is_paused(&self) -> bool {
        !self.control.state().running
    }

    pub fn is_stopped(&self) -> bool {
        self.control.state().stopped
    }

    /// Asks the event loop to write battery RAM at its next quantum boundary,
    /// paused or not.
    pub fn request_save(&self) {
        self.control.request_save();
    }

    pub fn set_buttons(&self, state: ButtonState) {
        self.input.set(state);
    }

    /// Copy of the last completed frame.
    pub fn request_next_frame(&self) -> Frame {
        self.handoff.latest()
    }

    pub fn frame_count(&self) -> u64 {
        self.handoff.frame_count()
    }

    /// Called on the emulation thread after every completed frame.
    pub fn on_frame<F: Fn() + Send + Sync + 'static>(&self, callback: F) {
        self.handoff.set_callback(Arc::new(callback));
    }

    pub fn set_overclock(&self, enabled: bool) {
        self.overclock.store(enabled, Ordering::Relaxed);
    }
}
