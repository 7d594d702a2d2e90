pub mod clock;
pub mod error;
pub mod gameboy;
pub mod joypad;
pub mod lr35902;
pub mod memory;
pub mod serial;
pub mod settings;
pub mod storage;
pub mod video;

mod tests;

pub use error::DmgError;
pub use gameboy::{GameBoy, SystemHandle};
pub use joypad::ButtonState;
pub use settings::Settings;
pub use storage::{FileStorage, MemoryStorage, Storage};
