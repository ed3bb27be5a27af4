//! Display-size constants shared with the GUI front end. Framebuffer
//! rendering itself lives in `cpu::hardware::lcd::Lcd`.

/// GBA display width
pub const LCD_WIDTH: usize = 240;

/// GBA display height
pub const LCD_HEIGHT: usize = 160;
