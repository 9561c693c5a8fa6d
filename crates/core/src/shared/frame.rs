use ndarray::ArrayView3;

use crate::shared::face_box::FaceBox;

/// A decoded still image: contiguous RGB bytes in row-major order.
///
/// Decoding happens at the loader boundary; detectors and embedders only
/// ever see this type.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8) -> Self {
        assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
        }
    }

    /// Wraps packed RGB8 pixels.
    pub fn from_rgb(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self::new(data, width, height, 3)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Extracts a square crop centered on the face, clamped to frame bounds.
    ///
    /// The side is the larger of the box's width and height, so embedders
    /// receive the whole face even for tall or wide detections. Returns
    /// `None` when the clamped crop is empty.
    pub fn square_crop(&self, face: &FaceBox) -> Option<Frame> {
        let fw = self.width as i32;
        let fh = self.height as i32;

        let (cx, cy) = face.center();
        let half = face.width().max(face.height()) / 2;

        let x1 = (cx - half).max(0);
        let y1 = (cy - half).max(0);
        let x2 = (cx + half).min(fw);
        let y2 = (cy + half).min(fh);
        if x2 <= x1 || y2 <= y1 {
            return None;
        }

        let (x1, y1, x2, y2) = (x1 as usize, y1 as usize, x2 as usize, y2 as usize);
        let channels = self.channels as usize;
        let src = self.as_ndarray();
        let mut data = Vec::with_capacity((x2 - x1) * (y2 - y1) * channels);
        for row in y1..y2 {
            for col in x1..x2 {
                for c in 0..channels {
                    data.push(src[[row, col, c]]);
                }
            }
        }

        Some(Frame::new(
            data,
            (x2 - x1) as u32,
            (y2 - y1) as u32,
            self.channels,
        ))
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}
