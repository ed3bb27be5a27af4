//! Save/Load state functionality.
//!
//! Persists Game Pak SRAM/Flash contents to a `.sav` file next to the
//! working directory, named after the cartridge's header title.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use emu::gba::Gba;

use crate::ui_traits::UiTool;

pub struct SaveGame {
    gba: Arc<Mutex<Gba>>,
    status: Option<String>,
}

impl SaveGame {
    pub const fn new(gba: Arc<Mutex<Gba>>) -> Self {
        Self { gba, status: None }
    }

    fn get_save_path(&self) -> PathBuf {
        let game_title = self.gba.lock().map_or_else(
            |_| String::new(),
            |g| g.cartridge_header.game_title.trim().replace(' ', "_"),
        );

        let filename = if game_title.is_empty() {
            "savestate.sav".to_string()
        } else {
            format!("{game_title}.sav")
        };

        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(filename)
    }

    fn save_state(&mut self) {
        let Ok(gba) = self.gba.lock() else {
            self.status = Some("Error: emulator lock poisoned".to_string());
            return;
        };

        let data = gba.cpu.bus.internal_memory.sram().to_vec();
        drop(gba);

        let path = self.get_save_path();
        match std::fs::write(&path, &data) {
            Ok(()) => {
                let size_kb = data.len() / 1024;
                self.status = Some(format!("Saved to {} ({size_kb} KB)", path.display()));
            }
            Err(e) => {
                self.status = Some(format!("Error: {e}"));
            }
        }
    }

    fn load_state(&mut self) {
        let path = self.get_save_path();

        if !path.exists() {
            self.status = Some(format!("No save file: {}", path.display()));
            return;
        }

        match std::fs::read(&path) {
            Ok(data) => {
                let size_kb = data.len() / 1024;
                if let Ok(mut gba) = self.gba.lock() {
                    gba.cpu.bus.internal_memory.load_sram(&data);
                    self.status = Some(format!("Loaded {} ({size_kb} KB)", path.display()));
                } else {
                    self.status = Some("Error: emulator lock poisoned".to_string());
                }
            }
            Err(e) => {
                self.status = Some(format!("Error: {e}"));
            }
        }
    }
}

impl UiTool for SaveGame {
    fn name(&self) -> &'static str {
        "Save Game"
    }

    fn show(&mut self, ctx: &egui::Context, open: &mut bool) {
        egui::Window::new(self.name())
            .default_width(150.0)
            .open(open)
            .default_pos(egui::pos2(10.0, 10.0))
            .show(ctx, |ui| self.ui(ui));
    }

    fn ui(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("Save").clicked() {
                self.save_state();
            }

            if ui.button("Load").clicked() {
                self.load_state();
            }
        });

        ui.separator();

        let path = self.get_save_path();
        ui.label("Save file:");
        ui.add(egui::Label::new(path.display().to_string()).wrap_mode(egui::TextWrapMode::Wrap));

        if path.exists() {
            if let Ok(metadata) = std::fs::metadata(&path) {
                let size_kb = metadata.len() / 1024;
                ui.small(format!("(exists, {size_kb} KB)"));
            }
        } else {
            ui.small("(no save yet)");
        }

        if let Some(status) = &self.status {
            ui.separator();
            ui.label(status);
        }
    }
}
