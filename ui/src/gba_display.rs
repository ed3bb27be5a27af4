use egui::{self, Color32, ColorImage, Vec2};

use std::sync::{Arc, Mutex};

use emu::{gba::Gba, render::LCD_HEIGHT, render::LCD_WIDTH};

use crate::{
    gba_color::GbaColor,
    ui_traits::{UiTool, View},
};

pub struct GbaDisplay {
    image: egui::ColorImage,
    texture: Option<egui::TextureHandle>,
    gba: Arc<Mutex<Gba>>,
    scale: f32,
}

impl GbaDisplay {
    pub(crate) fn new(gba: Arc<Mutex<Gba>>) -> Self {
        Self {
            image: ColorImage::new([LCD_WIDTH, LCD_HEIGHT], Color32::BLACK),
            texture: None,
            gba,
            scale: 1.0,
        }
    }
}

impl View for GbaDisplay {
    fn ui(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("x1").clicked() {
                self.scale = 1.0;
            }
            if ui.button("x2").clicked() {
                self.scale = 2.0;
            }
            if ui.button("x4").clicked() {
                self.scale = 4.0;
            }
        });

        let gba = self.gba.lock().unwrap();

        let buffer = &gba.cpu.bus.lcd.buffer;
        for row in 0..LCD_HEIGHT {
            for col in 0..LCD_WIDTH {
                self.image[(col, row)] = GbaColor(buffer[row][col]).into();
            }
        }

        let texture: &egui::TextureHandle = self.texture.get_or_insert_with(|| {
            // Load the texture only once.
            ui.ctx().load_texture(
                "gba_display",
                self.image.clone(),
                egui::TextureFilter::Linear,
            )
        });

        let size = Vec2::new(
            texture.size_vec2().x * self.scale,
            texture.size_vec2().y * self.scale,
        );
        ui.image(texture, size);
    }
}

impl UiTool for GbaDisplay {
    fn name(&self) -> &'static str {
        "Gba Display"
    }

    fn show(&mut self, ctx: &egui::Context, open: &mut bool) {
        egui::Window::new(self.name())
            .min_width(LCD_WIDTH as f32)
            .min_height(LCD_HEIGHT as f32)
            .open(open)
            .default_width(LCD_WIDTH as f32)
            .default_height(LCD_HEIGHT as f32)
            .resizable(false)
            .show(ctx, |ui| {
                self.ui(ui);
            });
    }
}
