use clap::Parser;
use dotmatrix::{DmgError, FileStorage, GameBoy, Settings};
use log::{error, info, warn, LevelFilter};
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(version, about = "Headless DMG emulator")]
struct Args {
    /// Path to ROM file (.gb or .zip)
    rom: PathBuf,

    /// Path to boot ROM file
    #[arg(long)]
    bios: Option<PathBuf>,

    /// Battery save file (defaults to the ROM path with .sav)
    #[arg(long)]
    save: Option<PathBuf>,

    /// Stop after this many frames
    #[arg(long)]
    frames: Option<u64>,

    /// Stop after this many seconds
    #[arg(long)]
    seconds: Option<u64>,

    /// Run as fast as possible
    #[arg(long)]
    uncapped: bool,

    /// Run at double speed
    #[arg(long)]
    overclock: bool,

    /// Disable VRAM/OAM access blocking
    #[arg(long)]
    no_contention: bool,

    /// Print serial output on exit
    #[arg(long)]
    serial: bool,

    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

fn setup_logging(level: LevelFilter) -> Result<(), fern::InitError> {
    fern::Dispatch::new()
        .format(|out, message, record| out.finish(format_args!("[{}][{}] {}", record.level(), record.target(), message)))
        .level(level)
        .chain(std::io::stdout())
        .apply()?;
    Ok(())
}

fn run(args: Args) -> Result<(), DmgError> {
    let mut storage = FileStorage::new(&args.rom);
    if let Some(bios) = &args.bios {
        storage = storage.with_bios(bios);
    }
    if let Some(save) = &args.save {
        storage = storage.with_battery(save);
    }

    let settings = Settings {
        uncapped: args.uncapped,
        overclock: args.overclock,
        access_contention: !args.no_contention,
        ..Settings::default()
    };

    let mut gb = GameBoy::new(storage, settings);
    gb.reset()?;

    let handle = gb.handle();
    let interrupt = handle.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Termination requested, stopping");
        interrupt.stop();
    }) {
        warn!("Failed to install termination handler: {}", e);
    }

    let (sender, receiver) = mpsc::channel();
    handle.on_frame(move || {
        let _ = sender.send(());
    });

    let emulation = thread::spawn(move || {
        let result = gb.run_event_loop();
        (gb, result)
    });

    let start = Instant::now();
    let second_limit = args.seconds.map(Duration::from_secs);
    let mut frames = 0u64;
    loop {
        if handle.is_stopped() {
            break;
        }
        if args.frames.is_some_and(|max| frames >= max) {
            break;
        }
        if second_limit.is_some_and(|limit| start.elapsed() >= limit) {
            break;
        }

        match receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(()) => frames += 1,
            Err(RecvTimeoutError::Timeout) if emulation.is_finished() => break,
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    handle.stop();
    let (mut gb, result) = match emulation.join() {
        Ok(joined) => joined,
        Err(_) => {
            error!("Emulation thread panicked");
            std::process::exit(1);
        }
    };
    info!("Ran {} frames in {:.2?}", frames, start.elapsed());

    if gb.save_persisted_state()? {
        info!("Battery RAM written");
    }

    if args.serial {
        println!("{}", String::from_utf8_lossy(gb.serial_output()));
    }

    result
}

fn main() {
    let args = Args::parse();

    if let Err(e) = setup_logging(args.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    if let Err(e) = run(args) {
        error!("{}", e);
        std::process::exit(1);
    }
}
