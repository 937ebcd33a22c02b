//! A single captured frame.

/// Raw bytes of one capture plus its dimensions, when the device knows them.
///
/// The loop assigns frame indices; a frame does not carry its own.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    /// Encoded or raw image bytes, as produced by the capture device.
    pub pixels: Vec<u8>,
    /// Width in pixels, `0` if unknown.
    pub width: u32,
    /// Height in pixels, `0` if unknown.
    pub height: u32,
}

impl Frame {
    /// A frame of unknown dimensions.
    pub fn from_bytes(pixels: Vec<u8>) -> Self {
        Self {
            pixels,
            width: 0,
            height: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}
