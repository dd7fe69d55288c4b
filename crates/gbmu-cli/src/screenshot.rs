use std::error::Error;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use gbmu_core::host::DisplaySink;
use gbmu_core::ppu::{SCREEN_HEIGHT, SCREEN_WIDTH};

const FRAME_LEN: usize = SCREEN_WIDTH * SCREEN_HEIGHT;

/// Display sink that keeps the most recent frame for a final snapshot.
pub struct LastFrame {
    pixels: Box<[u32; FRAME_LEN]>,
    presented: u64,
}

impl LastFrame {
    pub fn new() -> Self {
        Self {
            pixels: Box::new([0; FRAME_LEN]),
            presented: 0,
        }
    }

    pub fn pixels(&self) -> &[u32; FRAME_LEN] {
        &self.pixels
    }

    pub fn presented(&self) -> u64 {
        self.presented
    }
}

impl Default for LastFrame {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplaySink for LastFrame {
    fn present(&mut self, frame: &[u32; FRAME_LEN]) {
        self.pixels.copy_from_slice(frame);
        self.presented += 1;
    }
}

/// Write a 0x00RRGGBB frame as an 8-bit RGB PNG.
pub fn save_png(path: &Path, frame: &[u32; FRAME_LEN]) -> Result<(), Box<dyn Error>> {
    let mut pixels = Vec::with_capacity(FRAME_LEN * 3);
    for &c in frame.iter() {
        pixels.push(((c >> 16) & 0xFF) as u8);
        pixels.push(((c >> 8) & 0xFF) as u8);
        pixels.push((c & 0xFF) as u8);
    }

    let file = File::create(path)?;
    let mut encoder = png::Encoder::new(
        BufWriter::new(file),
        SCREEN_WIDTH as u32,
        SCREEN_HEIGHT as u32,
    );
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&pixels)?;
    writer.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn png_round_trips_dimensions_and_colour() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shot.png");
        let mut frame = [0x0000_0000u32; FRAME_LEN];
        frame[0] = 0x00_12_34_56;
        save_png(&path, &frame).unwrap();

        let decoder = png::Decoder::new(std::io::BufReader::new(File::open(&path).unwrap()));
        let mut reader = decoder.read_info().unwrap();
        let mut buf = vec![0; reader.output_buffer_size().unwrap()];
        let info = reader.next_frame(&mut buf).unwrap();
        assert_eq!((info.width, info.height), (160, 144));
        assert_eq!(&buf[..3], &[0x12, 0x34, 0x56]);
    }

    #[test]
    fn last_frame_keeps_latest() {
        let mut sink = LastFrame::new();
        sink.present(&[1; FRAME_LEN]);
        sink.present(&[2; FRAME_LEN]);
        assert_eq!(sink.presented(), 2);
        assert_eq!(sink.pixels()[0], 2);
    }
}
