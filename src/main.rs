//! # Clementine - GBA/GB/GBC Emulator Entry Point
//!
//! This is the main entry point for the Clementine emulator. It parses the
//! shared CLI surface (`emu::cli::Args`), resolves which console the ROM
//! targets, and dispatches to one of two front ends:
//!
//! - **GBA**: the existing `eframe`/`egui` GUI loop (`ui::app::App`).
//! - **DMG/CGB**: a headless cycle loop driving `emu::console::Machine`,
//!   with no BIOS dump required and cartridge RAM/RTC persisted to
//!   `<rom>.sav` on exit.

extern crate ui;

use std::fs;
use std::path::Path;

use clap::Parser;
use emu::cli::Args;
use emu::console::{ConsoleModel, Machine, SaveData};
use emu::error::CoreError;

fn main() {
    let args = Args::parse();

    let filter = tracing_subscriber::EnvFilter::try_new(args.log_level.filter_directive())
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let rom = match fs::read(&args.rom) {
        Ok(rom) => rom,
        Err(err) => {
            tracing::error!(path = %args.rom.display(), %err, "failed to read ROM");
            std::process::exit(1);
        }
    };

    let model = args.model.resolve(&rom);

    let result = match model {
        ConsoleModel::Agb => run_gba(&args),
        ConsoleModel::Dmg | ConsoleModel::Cgb => run_dmg(&args, rom, model),
    };

    if let Err(err) = result {
        tracing::error!(%err, "fatal error");
        std::process::exit(1);
    }
}

/// Boots the existing GBA GUI path unchanged.
fn run_gba(args: &Args) -> Result<(), CoreError> {
    tracing::info!(rom = %args.rom.display(), "starting GBA session");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    let cartridge_name = args.rom.display().to_string();
    eframe::run_native(
        "Clementine - A GBA Emulator",
        options,
        Box::new(|_cc| Ok(Box::new(ui::app::App::new(cartridge_name)))),
    )
    .ok();

    Ok(())
}

/// Runs a DMG/CGB cartridge headlessly: no display backend is wired up for
/// this console yet, so the session just drives the core at real-time pace
/// until a fatal error (e.g. a STOP hang) stops it, flushing cartridge RAM
/// and RTC state to `<rom>.sav` on the way out.
fn run_dmg(args: &Args, rom: Vec<u8>, model: ConsoleModel) -> Result<(), CoreError> {
    tracing::info!(rom = %args.rom.display(), ?model, "starting DMG/CGB session");

    let save_path = save_path_for(&args.rom);
    let save_bytes = fs::read(&save_path).ok();

    let machine = Machine::new(model, rom, None, None, args.multicart)?;
    let Machine::Dmg(mut gb) = machine else {
        unreachable!("run_dmg is only called for ConsoleModel::Dmg/Cgb")
    };

    if let Some(bytes) = &save_bytes {
        let save = SaveData::decode(bytes, gb.bus.external_ram.len());
        let n = save.cartridge_ram.len().min(gb.bus.external_ram.len());
        gb.bus.external_ram[..n].copy_from_slice(&save.cartridge_ram[..n]);
        if let (Some(rtc_bytes), Some(rtc)) = (save.rtc, gb.bus.mapper.rtc.as_mut()) {
            *rtc = emu::dmg::rtc::Rtc::from_bytes(&rtc_bytes);
        }
    }

    // One frame's worth of T-states at normal speed; double-speed mode just
    // makes each instruction account for half as many bus cycles, so the
    // frame boundary in T-states stays the same.
    const CYCLES_PER_FRAME: u64 = 70224;

    let result = loop {
        if let Err(err) = gb.run_cycles(CYCLES_PER_FRAME) {
            break Err(err);
        }
    };

    flush_dmg_save(&save_path, &gb);
    result
}

fn save_path_for(rom_path: &Path) -> std::path::PathBuf {
    rom_path.with_extension("sav")
}

fn flush_dmg_save(save_path: &Path, gb: &emu::dmg::gb::GameBoy) {
    let rtc = gb.bus.mapper.rtc.as_ref().map(emu::dmg::rtc::Rtc::to_bytes);
    let save = SaveData {
        cartridge_ram: gb.bus.external_ram.clone(),
        rtc,
    };

    if let Err(err) = fs::write(save_path, save.encode()) {
        tracing::warn!(path = %save_path.display(), %err, "failed to flush save file");
    }
}
