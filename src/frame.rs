use crate::errors::*;
use crate::geometry::Rect;

// A single 8-bit luma plane, row major.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
	pub width: u32,
	pub height: u32,
	pub pixels: Vec<u8>,
}

impl Frame {
	pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
		if pixels.len() != (width as usize) * (height as usize) {
			return fail(ErrorType::MalformedGeometry, format!(
				"{} bytes for a {}x{} frame", pixels.len(), width, height));
		}
		Ok(Self{
			width: width,
			height: height,
			pixels: pixels,
		})
	}

	// YUYV packs two pixels in four bytes (Y0 U Y1 V),
	// so luma is every even byte.
	pub fn from_yuyv(data: &[u8], width: u32, height: u32) -> Result<Self> {
		let expected = (width as usize) * (height as usize) * 2;
		if data.len() != expected {
			return fail(ErrorType::MalformedGeometry, format!(
				"yuyv buffer is {} bytes, expected {}", data.len(), expected));
		}
		let pixels = data.iter().step_by(2).copied().collect();
		Frame::new(width, height, pixels)
	}

	// Flip left to right, so the picture moves the way the user does.
	pub fn mirror(&mut self) {
		let width = self.width as usize;
		if width == 0 {
			return;
		}
		for row in self.pixels.chunks_exact_mut(width) {
			row.reverse();
		}
	}

	pub fn crop(&self, rect: &Rect) -> Result<Frame> {
		if !rect.fits_within(self.width, self.height) {
			return fail(ErrorType::MalformedGeometry, format!(
				"{:?} outside {}x{} frame", rect, self.width, self.height));
		}
		let (x, y) = (rect.x as usize, rect.y as usize);
		let (w, h) = (rect.width as usize, rect.height as usize);
		let stride = self.width as usize;

		let mut pixels = Vec::with_capacity(w * h);
		for row in y..y + h {
			let start = row * stride + x;
			pixels.extend_from_slice(&self.pixels[start..start + w]);
		}
		Frame::new(rect.width, rect.height, pixels)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn ramp(width: u32, height: u32) -> Frame {
		let pixels = (0..width * height).map(|i| i as u8).collect();
		Frame::new(width, height, pixels).unwrap()
	}

	#[test]
	fn yuyv_keeps_luma() {
		let data = [10, 128, 20, 128, 30, 128, 40, 128];
		let f = Frame::from_yuyv(&data, 2, 2).unwrap();
		assert_eq!(f.pixels, vec![10, 20, 30, 40]);
	}

	#[test]
	fn yuyv_length_checked() {
		let e = Frame::from_yuyv(&[0; 6], 2, 2).unwrap_err();
		assert_eq!(error_type_of(e.as_ref()), Some(ErrorType::MalformedGeometry));
	}

	#[test]
	fn mirror_reverses_rows() {
		let mut f = ramp(3, 2);
		f.mirror();
		assert_eq!(f.pixels, vec![2, 1, 0, 5, 4, 3]);
		f.mirror();
		assert_eq!(f, ramp(3, 2));
	}

	#[test]
	fn crop_copies_the_window() {
		let f = ramp(4, 3);
		let c = f.crop(&Rect::new(1, 1, 2, 2)).unwrap();
		assert_eq!((c.width, c.height), (2, 2));
		assert_eq!(c.pixels, vec![5, 6, 9, 10]);
	}

	#[test]
	fn crop_outside_frame_fails() {
		let f = ramp(4, 3);
		let e = f.crop(&Rect::new(3, 0, 2, 2)).unwrap_err();
		assert_eq!(error_type_of(e.as_ref()), Some(ErrorType::MalformedGeometry));
	}
}
