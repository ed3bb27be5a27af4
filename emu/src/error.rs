use thiserror::Error;

/// Fatal failures surfaced by the core. Recoverable anomalies (bad header
/// checksum, bad logo hash) are logged as warnings instead of returned here.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("rom size does not match the size declared in the cartridge header")]
    RomSizeMismatch,

    #[error("cartridge header checksum is invalid")]
    BadHeaderChecksum,

    #[error("nintendo boot logo hash does not match")]
    BadLogoHash,

    #[error("unrecognized mapper byte 0x{0:02X}")]
    UnknownMapper(u8),

    #[error("cartridge declares a real-time clock but its mapper is not MBC3")]
    UnsupportedRtc,

    #[error("cartridge declares rumble support on an unsupported mapper")]
    UnsupportedRumble,

    #[error("STOP executed with no joypad line active; the machine would hang forever")]
    StopWithNoJoypad,

    #[error("host I/O failure: {0}")]
    HostIo(#[from] std::io::Error),
}
