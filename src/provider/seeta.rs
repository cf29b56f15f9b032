use rustface::{Detector, ImageData};

use crate::errors::*;
use crate::{info, tags};
use crate::frame::Frame;
use crate::geometry::Rect;
use super::FaceDetector;

// SeetaFace cascade face detector (rustface). Gives
// boxes only, eyes come from a separate EyeDetector.
pub struct SeetaFaceDetector {
	detector: Box<dyn Detector>,
}

impl SeetaFaceDetector {
	pub fn new(model_path: &str, min_face_size: u32) -> Result<Self> {
		info!("loading face model", tags![
			("path", model_path),
			("min_face_size", &min_face_size.to_string())
		]);

		let mut detector = match rustface::create_detector(model_path) {
			Ok(detector) => detector,
			Err(e) => return fail(ErrorType::SourceUnavailable,
				format!("{}: {}", model_path, e)),
		};

		detector.set_min_face_size(min_face_size);
		detector.set_score_thresh(2.0);
		detector.set_pyramid_scale_factor(0.8);
		detector.set_slide_window_step(4, 4);

		Ok(Self{
			detector: detector,
		})
	}
}

impl FaceDetector for SeetaFaceDetector {
	fn faces(&mut self, frame: &Frame) -> Result<Vec<Rect>> {
		let mut image = ImageData::new(&frame.pixels, frame.width, frame.height);
		let mut faces = self.detector.detect(&mut image);

		// Strongest first, so "the first face" is the best one
		faces.sort_by(|a, b| b.score().partial_cmp(&a.score())
			.unwrap_or(std::cmp::Ordering::Equal));

		Ok(faces.iter()
			.map(|f| {
				let b = f.bbox();
				Rect::new(b.x(), b.y(), b.width(), b.height())
			})
			.collect())
	}
}
