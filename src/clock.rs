use crate::error::DmgError;
use crate::lr35902::cpu::Cpu;
use crate::lr35902::T_CYCLES_PER_SECOND;
use crate::memory::mmu::Mmu;
use crate::video::FRAME_CYCLES;
use log::warn;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunState {
    pub running: bool,
    pub stopped: bool,
    /// Battery RAM should be written at the next quantum boundary.
    pub save_requested: bool,
}

/// Run flags shared between the emulation thread and its handles.
#[derive(Debug)]
pub struct RunControl {
    state: Mutex<RunState>,
    signal: Condvar,
}

impl RunControl {
    pub fn new() -> RunControl {
        RunControl {
            state: Mutex::new(RunState {
                running: true,
                stopped: false,
                save_requested: false,
            }),
            signal: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update<F: FnOnce(&mut RunState)>(&self, f: F) {
        f(&mut self.lock());
        self.signal.notify_all();
    }

    pub fn state(&self) -> RunState {
        *self.lock()
    }

    pub fn pause(&self) {
        self.update(|state| state.running = false);
    }

    pub fn resume(&self) {
        self.update(|state| state.running = true);
    }

    pub fn stop(&self) {
        self.update(|state| state.stopped = true);
    }

    /// Wakes a paused loop too, so the save does not wait for resume.
    pub fn request_save(&self) {
        self.update(|state| state.save_requested = true);
    }

    /// Clears a previous stop, for a fresh run after reset.
    pub fn rearm(&self) {
        self.update(|state| {
            state.running = true;
            state.stopped = false;
            state.save_requested = false;
        });
    }

    /// Blocks while paused with nothing to do. Returns the state it woke on and
    /// takes any pending save request with it.
    pub fn wait_while_paused(&self) -> RunState {
        let mut guard = self
            .signal
            .wait_while(self.lock(), |state| {
                !state.running && !state.stopped && !state.save_requested
            })
            .unwrap_or_else(PoisonError::into_inner);
        let state = *guard;
        guard.save_requested = false;
        state
    }

    /// Sleeps for `duration` unless paused or stopped in the meantime.
    pub fn sleep(&self, duration: Duration) {
        let _ = self
            .signal
            .wait_timeout_while(self.lock(), duration, |state| state.running && !state.stopped)
            .unwrap_or_else(PoisonError::into_inner);
    }
}

impl Default for RunControl {
    fn default() -> RunControl {
        RunControl::new()
    }
}

/// Advances CPU, display and I/O in lockstep, one quantum per call.
pub struct Clock {
    quantum: usize,
    carry: usize,
    deficit: Duration,
    overclock: Arc<AtomicBool>,
}

impl Clock {
    pub fn new(quantum: usize, overclock: Arc<AtomicBool>) -> Clock {
        Clock {
            quantum,
            carry: 0,
            deficit: Duration::ZERO,
            overclock,
        }
    }

    pub fn quantum(&self) -> usize {
        self.quantum
    }

    pub fn frequency(&self) -> usize {
        if self.overclock.load(Ordering::Relaxed) {
            T_CYCLES_PER_SECOND * 2
        } else {
            T_CYCLES_PER_SECOND
        }
    }

    /// Untimed: runs one quantum less the previous overshoot. Returns the cycles consumed.
    pub fn perform_sleep_cycle_ticks(&mut self, cpu: &mut Cpu, mmu: &mut Mmu) -> Result<usize, DmgError> {
        let budget = self.quantum.saturating_sub(self.carry);

        let overshoot = cpu.exec_cycles(mmu, budget, |mmu, cycles| {
            mmu.step_display(cycles);
            mmu.step_io(cycles);
        })?;

        self.carry = overshoot;
        Ok(budget + overshoot)
    }

    /// Timed: runs one quantum, then sleeps off whatever real time it has left.
    pub fn perform_sleep_cycle(&mut self, cpu: &mut Cpu, mmu: &mut Mmu, control: &RunControl) -> Result<usize, DmgError> {
        let start = Instant::now();
        let cycles = self.perform_sleep_cycle_ticks(cpu, mmu)?;

        let remaining = self.pace(cycles, start.elapsed());
        if !remaining.is_zero() {
            control.sleep(remaining);
        }

        Ok(cycles)
    }

    /// Settles `elapsed` real time against the time `cycles` should take.
    /// Returns how long to sleep. An overrun is kept as a deficit that
    /// shortens the next sleep, capped at one frame.
    fn pace(&mut self, cycles: usize, elapsed: Duration) -> Duration {
        let frequency = self.frequency() as f64;
        let target = Duration::from_secs_f64(cycles as f64 / frequency);
        let spent = elapsed + self.deficit;

        if spent < target {
            self.deficit = Duration::ZERO;
            return target - spent;
        }

        let limit = Duration::from_secs_f64(FRAME_CYCLES as f64 / frequency);
        let overrun = spent - target;
        if overrun > limit {
            warn!("Clock: running {:?} behind real time, dropping the excess", overrun);
            self.deficit = limit;
        } else {
            self.deficit = overrun;
        }
        Duration::ZERO
    }

    /// Real time owed from earlier overruns.
    pub fn deficit(&self) -> Duration {
        self.deficit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joypad::{InputHandle, Joypad};
    use crate::memory::cartridge::{test_image, Cartridge};
    use crate::video::frame::FrameHandoff;
    use crate::video::ppu::Ppu;
    use std::thread;

    fn system() -> (Cpu, Mmu) {
        // A zeroed image is a field of NOPs past the header.
        let cartridge = Cartridge::from_image(test_image(0x00, 0x00, 0x00)).unwrap();
        let mut mmu = Mmu::new(
            cartridge,
            Vec::new(),
            Ppu::new(FrameHandoff::new(), true),
            Joypad::new(InputHandle::new()),
        );
        mmu.apply_post_boot();
        (Cpu::post_boot(), mmu)
    }

    #[test]
    fn overshoot_is_carried_into_the_next_quantum() {
        let (mut cpu, mut mmu) = system();
        let mut clock = Clock::new(10, Arc::new(AtomicBool::new(false)));

        assert_eq!(clock.perform_sleep_cycle_ticks(&mut cpu, &mut mmu).unwrap(), 12);
        assert_eq!(clock.perform_sleep_cycle_ticks(&mut cpu, &mut mmu).unwrap(), 8);
        assert_eq!(cpu.cycles(), 20);
    }

    #[test]
    fn display_advances_with_the_cpu() {
        let (mut cpu, mut mmu) = system();
        let mut clock = Clock::new(FRAME_CYCLES, Arc::new(AtomicBool::new(false)));
        let handoff = FrameHandoff::new();
        mmu.ppu = Ppu::new(handoff.clone(), true);
        mmu.ppu.apply_post_boot();

        clock.perform_sleep_cycle_ticks(&mut cpu, &mut mmu).unwrap();
        assert_eq!(handoff.frame_count(), 1);
        assert_eq!(mmu.ppu.ly(), 0);
    }

    #[test]
    fn overclock_doubles_frequency() {
        let overclock = Arc::new(AtomicBool::new(false));
        let clock = Clock::new(3648, overclock.clone());
        assert_eq!(clock.frequency(), T_CYCLES_PER_SECOND);
        overclock.store(true, Ordering::Relaxed);
        assert_eq!(clock.frequency(), T_CYCLES_PER_SECOND * 2);
    }

    #[test]
    fn pause_interrupts_sleep() {
        let control = Arc::new(RunControl::new());
        let sleeper = control.clone();
        let start = Instant::now();
        let handle = thread::spawn(move || sleeper.sleep(Duration::from_secs(10)));

        thread::sleep(Duration::from_millis(20));
        control.pause();
        handle.join().unwrap();
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn stop_releases_a_paused_waiter() {
        let control = Arc::new(RunControl::new());
        control.pause();
        let waiter = control.clone();
        let handle = thread::spawn(move || waiter.wait_while_paused());

        thread::sleep(Duration::from_millis(20));
        control.stop();
        assert!(handle.join().unwrap().stopped);
    }

    #[test]
    fn save_request_wakes_a_paused_waiter_once() {
        let control = Arc::new(RunControl::new());
        control.pause();
        let waiter = control.clone();
        let handle = thread::spawn(move || waiter.wait_while_paused());

        thread::sleep(Duration::from_millis(20));
        control.request_save();
        let woke = handle.join().unwrap();
        assert!(woke.save_requested);
        assert!(!woke.running);
        assert!(!control.state().save_requested);
    }

    // 65536 cycles at 4 MiHz is exactly 15.625ms.
    const SIXTY_FOURTH: usize = T_CYCLES_PER_SECOND / 64;

    #[test]
    fn pacing_sleeps_off_the_remainder() {
        let mut clock = Clock::new(SIXTY_FOURTH, Arc::new(AtomicBool::new(false)));
        assert_eq!(
            clock.pace(SIXTY_FOURTH, Duration::from_millis(5)),
            Duration::from_micros(10_625)
        );
        assert_eq!(clock.deficit(), Duration::ZERO);
    }

    #[test]
    fn overrun_shortens_the_next_sleep() {
        let mut clock = Clock::new(SIXTY_FOURTH, Arc::new(AtomicBool::new(false)));

        assert_eq!(clock.pace(SIXTY_FOURTH, Duration::from_millis(20)), Duration::ZERO);
        assert_eq!(clock.deficit(), Duration::from_micros(4_375));

        // 5ms of work plus 4.375ms owed leaves 6.25ms instead of 10.625ms.
        assert_eq!(
            clock.pace(SIXTY_FOURTH, Duration::from_millis(5)),
            Duration::from_micros(6_250)
        );
        assert_eq!(clock.deficit(), Duration::ZERO);
    }

    #[test]
    fn deficit_is_capped_at_one_frame() {
        let mut clock = Clock::new(SIXTY_FOURTH, Arc::new(AtomicBool::new(false)));
        let frame = Duration::from_secs_f64(FRAME_CYCLES as f64 / T_CYCLES_PER_SECOND as f64);

        assert_eq!(clock.pace(SIXTY_FOURTH, Duration::from_secs(1)), Duration::ZERO);
        assert_eq!(clock.deficit(), frame);

        // Owing a full frame, a quantum that takes no time still does not sleep.
        assert_eq!(clock.pace(SIXTY_FOURTH, Duration::ZERO), Duration::ZERO);
        assert!(clock.deficit() < frame);
    }

    #[test]
    fn overclocked_pacing_halves_the_target() {
        let mut clock = Clock::new(SIXTY_FOURTH, Arc::new(AtomicBool::new(true)));
        assert_eq!(
            clock.pace(SIXTY_FOURTH, Duration::from_millis(5)),
            Duration::from_micros(2_812) + Duration::from_nanos(500)
        );
    }
}
