mod audio;
mod config;
mod save_file;
mod screenshot;

use std::error::Error;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use gbmu_core::cartridge::Cartridge;
use gbmu_core::gameboy::{DOTS_PER_FRAME, GameBoy, GameBoyConfig};
use gbmu_core::theme::ThemeId;
use log::{LevelFilter, debug, error, info, warn};

use crate::audio::RegisterTrace;
use crate::save_file::FileSaveStore;
use crate::screenshot::LastFrame;

// 4.194304 MHz dot clock.
const DOTS_PER_SECOND: u64 = 4_194_304;
const FRAME_TIME: Duration =
    Duration::from_nanos(DOTS_PER_FRAME as u64 * 1_000_000_000 / DOTS_PER_SECOND);

#[derive(Parser)]
#[command(name = "gbmu", about = "Headless Game Boy emulator")]
struct Args {
    /// Path to ROM file
    rom: PathBuf,

    /// Number of frames to run; runs until the CPU stops if omitted
    #[arg(long)]
    frames: Option<u64>,

    /// Pace frames at the hardware refresh rate
    #[arg(long)]
    realtime: bool,

    /// Write the last frame to this PNG file on exit
    #[arg(long)]
    screenshot: Option<PathBuf>,

    /// Directory for battery-backed save files
    #[arg(long)]
    save_dir: Option<PathBuf>,

    /// Path to boot ROM file
    #[arg(long)]
    bootrom: Option<PathBuf>,

    /// Palette theme name
    #[arg(long, value_parser = parse_theme)]
    theme: Option<ThemeId>,

    /// Echo serial port output to stdout
    #[arg(long)]
    serial: bool,

    /// Enable debug logging of CPU state
    #[arg(long)]
    debug: bool,

    /// Config file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,
}

fn parse_theme(name: &str) -> Result<ThemeId, String> {
    ThemeId::from_name(name).ok_or_else(|| {
        let names: Vec<&str> = ThemeId::all().map(ThemeId::name).collect();
        format!("unknown theme '{name}' (expected one of: {})", names.join(", "))
    })
}

fn init_logging(debug: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if debug {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();
}

/// Echo serial bytes, escaping anything that is not printable text.
fn write_serial(out: &mut impl Write, bytes: &[u8]) -> io::Result<()> {
    for &b in bytes {
        if b.is_ascii_graphic() || b.is_ascii_whitespace() {
            write!(out, "{}", b as char)?;
        } else {
            write!(out, "\\x{b:02X}")?;
        }
    }
    out.flush()
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let config_path = args.config.clone().unwrap_or_else(config::default_config_path);
    let file_config = config::load_from_file(&config_path);

    let theme = match (args.theme, file_config.theme.as_deref()) {
        (Some(theme), _) => theme,
        (None, Some(name)) => ThemeId::from_name(name).unwrap_or_else(|| {
            warn!("Unknown theme '{name}' in {}; using default", config_path.display());
            ThemeId::default()
        }),
        (None, None) => ThemeId::default(),
    };

    let boot_rom = match args.bootrom.as_ref().or(file_config.boot_rom.as_ref()) {
        Some(path) => Some(
            std::fs::read(path)
                .map_err(|e| format!("failed to read boot ROM {}: {e}", path.display()))?,
        ),
        None => None,
    };

    let rom = std::fs::read(&args.rom)
        .map_err(|e| format!("failed to read ROM {}: {e}", args.rom.display()))?;

    let save_dir = args
        .save_dir
        .clone()
        .or(file_config.save_dir)
        .unwrap_or_else(config::default_save_dir);
    let mut store = FileSaveStore::new(save_dir);
    let cart = Cartridge::with_save_store(rom, &mut store)?;
    if cart.is_persistent() {
        info!("Save file: {}", store.path_for(cart.save_id()).display());
    }

    let mut gb = GameBoy::with_cartridge(GameBoyConfig { theme, boot_rom }, cart);
    let mut display = LastFrame::new();
    let mut audio = RegisterTrace::new();

    let start = Instant::now();
    let mut next_frame = start + FRAME_TIME;
    let mut frame_count = 0u64;
    let mut serial_failed = false;
    let result = loop {
        if let Some(max) = args.frames
            && frame_count >= max
        {
            break Ok(());
        }

        if let Err(e) = gb.run_frame_with(&mut display, &mut audio) {
            break Err(e);
        }
        frame_count += 1;

        if args.serial
            && let Err(e) = write_serial(&mut io::stdout().lock(), &gb.take_serial())
            && !serial_failed
        {
            serial_failed = true;
            warn!("Failed to echo serial output: {e}");
        }

        if args.debug && frame_count.is_multiple_of(60) {
            debug!("frame {frame_count}: {}", gb.cpu.debug_state());
        }

        if args.realtime {
            let now = Instant::now();
            if next_frame > now {
                std::thread::sleep(next_frame - now);
            }
            next_frame += FRAME_TIME;
        }
    };

    info!(
        "Ran {frame_count} frames ({} presented) in {:.2?}",
        display.presented(),
        start.elapsed()
    );

    if let Some(path) = &args.screenshot {
        screenshot::save_png(path, display.pixels())?;
        info!("Wrote screenshot to {}", path.display());
    }

    // Flush even when the CPU faulted so progress made before the fault is kept.
    gb.shutdown()?;
    result?;
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.debug);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
