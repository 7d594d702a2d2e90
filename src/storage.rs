use crate::error::{ArchiveSnafu, DmgError, NoRomInArchiveSnafu, ReadFileSnafu, WriteFileSnafu};
use log::{debug, info};
use snafu::ResultExt;
use std::fs;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

const ROM_EXTENSIONS: [&str; 3] = [".gb", ".gbc", ".bin"];

/// Load/save hooks the system calls during reset and on a save trigger.
/// Empty BIOS or battery buffers mean "not present".
pub trait Storage: Send {
    fn load_rom(&self) -> Result<Vec<u8>, DmgError>;
    fn load_bios(&self) -> Result<Vec<u8>, DmgError>;
    fn load_battery(&self) -> Result<Vec<u8>, DmgError>;
    fn save_battery(&mut self, data: &[u8]) -> Result<(), DmgError>;
}

/// Files on disk. The battery lives next to the ROM with a `.sav` extension
/// unless a path is given explicitly.
#[derive(Debug, Clone)]
pub struct FileStorage {
    rom: PathBuf,
    bios: Option<PathBuf>,
    battery: PathBuf,
}

impl FileStorage {
    pub fn new<P: AsRef<Path>>(rom: P) -> FileStorage {
        let rom = rom.as_ref().to_path_buf();
        FileStorage {
            battery: rom.with_extension("sav"),
            rom,
            bios: None,
        }
    }

    pub fn with_bios<P: AsRef<Path>>(mut self, bios: P) -> FileStorage {
        self.bios = Some(bios.as_ref().to_path_buf());
        self
    }

    pub fn with_battery<P: AsRef<Path>>(mut self, battery: P) -> FileStorage {
        self.battery = battery.as_ref().to_path_buf();
        self
    }

    pub fn battery_path(&self) -> &Path {
        &self.battery
    }

    fn is_archive(path: &Path) -> bool {
        path.extension()
            .map(|extension| extension.eq_ignore_ascii_case("zip"))
            .unwrap_or(false)
    }

    /// First entry with a ROM extension.
    fn load_from_archive(path: &Path) -> Result<Vec<u8>, DmgError> {
        let file = fs::File::open(path).context(ReadFileSnafu { path })?;
        let mut archive = zip::ZipArchive::new(file).context(ArchiveSnafu { path })?;

        for index in 0..archive.len() {
            let mut entry = archive.by_index(index).context(ArchiveSnafu { path })?;
            let name = entry.name().to_lowercase();
            if ROM_EXTENSIONS.iter().any(|extension| name.ends_with(extension)) {
                let mut data = Vec::new();
                entry.read_to_end(&mut data).context(ReadFileSnafu { path })?;
                info!("Extracted {} ({} bytes) from {}", entry.name(), data.len(), path.display());
                return Ok(data);
            }
        }

        NoRomInArchiveSnafu { path }.fail()
    }
}

impl Storage for FileStorage {
    fn load_rom(&self) -> Result<Vec<u8>, DmgError> {
        if FileStorage::is_archive(&self.rom) {
            FileStorage::load_from_archive(&self.rom)
        } else {
            fs::read(&self.rom).context(ReadFileSnafu { path: &self.rom })
        }
    }

    fn load_bios(&self) -> Result<Vec<u8>, DmgError> {
        match &self.bios {
            Some(path) => fs::read(path).context(ReadFileSnafu { path }),
            None => Ok(Vec::new()),
        }
    }

    fn load_battery(&self) -> Result<Vec<u8>, DmgError> {
        match fs::read(&self.battery) {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No battery file at {}", self.battery.display());
                Ok(Vec::new())
            }
            Err(e) => Err(e).context(ReadFileSnafu { path: &self.battery }),
        }
    }

    /// Written to a sibling temporary file first, then renamed over the target.
    fn save_battery(&mut self, data: &[u8]) -> Result<(), DmgError> {
        let temporary = self.battery.with_extension("sav.tmp");
        fs::write(&temporary, data).context(WriteFileSnafu { path: &temporary })?;
        fs::rename(&temporary, &self.battery).context(WriteFileSnafu { path: &self.battery })?;
        Ok(())
    }
}

/// In-memory buffers. Clones share the battery, so a caller can keep one to
/// inspect what the system saved.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    rom: Vec<u8>,
    bios: Vec<u8>,
    battery: Arc<Mutex<Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new(rom: Vec<u8>) -> MemoryStorage {
        MemoryStorage {
            rom,
            ..MemoryStorage::default()
        }
    }

    pub fn with_bios(mut self, bios: Vec<u8>) -> MemoryStorage {
        self.bios = bios;
        self
    }

    pub fn with_battery(self, battery: Vec<u8>) -> MemoryStorage {
        *self.battery.lock().unwrap_or_else(PoisonError::into_inner) = battery;
        self
    }

    pub fn battery(&self) -> Vec<u8> {
        self.battery.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Storage for MemoryStorage {
    fn load_rom(&self) -> Result<Vec<u8>, DmgError> {
        Ok(self.rom.clone())
    }

    fn load_bios(&self) -> Result<Vec<u8>, DmgError> {
        Ok(self.bios.clone())
    }

    fn load_battery(&self) -> Result<Vec<u8>, DmgError> {
        Ok(self.battery())
    }

    fn save_battery(&mut self, data: &[u8]) -> Result<(), DmgError> {
        *self.battery.lock().unwrap_or_else(PoisonError::into_inner) = data.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn battery_defaults_next_to_rom() {
        let storage = FileStorage::new("/games/tetris.gb");
        assert_eq!(storage.battery_path(), Path::new("/games/tetris.sav"));
    }

    #[test]
    fn missing_battery_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("game.gb"));
        assert!(storage.load_battery().unwrap().is_empty());
        assert!(storage.load_bios().unwrap().is_empty());
    }

    #[test]
    fn missing_rom_reports_path() {
        let storage = FileStorage::new("/nonexistent/rom.gb");
        assert!(matches!(storage.load_rom(), Err(DmgError::ReadFile { .. })));
    }

    #[test]
    fn battery_save_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path().join("game.gb"));
        storage.save_battery(&[1, 2, 3]).unwrap();
        storage.save_battery(&[4, 5]).unwrap();

        assert_eq!(storage.load_battery().unwrap(), vec![4, 5]);
        assert!(!dir.path().join("game.sav.tmp").exists());
    }

    #[test]
    fn memory_clones_share_battery() {
        let storage = MemoryStorage::new(vec![0; 4]);
        let mut writer = storage.clone();
        writer.save_battery(&[9, 9]).unwrap();
        assert_eq!(storage.battery(), vec![9, 9]);
    }
}
