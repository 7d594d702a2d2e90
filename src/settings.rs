/// 8 scanlines worth of cycles per scheduler quantum.
pub const DEFAULT_QUANTUM_CYCLES: usize = 3648;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Cycles advanced per scheduler call.
    pub quantum_cycles: usize,
    /// Run as fast as possible instead of pacing to wall-clock time.
    pub uncapped: bool,
    /// Pace at twice the DMG clock.
    pub overclock: bool,
    /// Block VRAM/OAM while the display controller is using them.
    pub access_contention: bool,
}

impl Default for Settings {
    fn default() -> Settings {
        Settings {
            quantum_cycles: DEFAULT_QUANTUM_CYCLES,
            uncapped: false,
            overclock: false,
            access_contention: true,
        }
    }
}
