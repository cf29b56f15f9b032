use crate::errors::*;
use crate::{debug, tags};
use crate::frame::Frame;
use crate::geometry::{Geometry, LandmarkSet, Rect};

pub mod seeta;
pub mod sidecar;

// The black box models. Each takes the whole
// (mirrored) frame, or for eyes the face crop.

pub trait LandmarkModel {
	fn landmarks(&mut self, frame: &Frame) -> Result<Option<LandmarkSet>>;
}

pub trait FaceDetector {
	fn faces(&mut self, frame: &Frame) -> Result<Vec<Rect>>;
}

pub trait EyeDetector {
	// Boxes are relative to the face crop
	fn eyes(&mut self, face: &Frame) -> Result<Vec<Rect>>;
}

pub trait GeometryProvider {
	fn detect(&mut self, frame: &Frame) -> Result<Geometry>;
}

pub struct LandmarkProvider<M: LandmarkModel> {
	model: M,
}

impl<M: LandmarkModel> LandmarkProvider<M> {
	pub fn new(model: M) -> Self {
		Self{model: model}
	}
}

impl<M: LandmarkModel> GeometryProvider for LandmarkProvider<M> {
	fn detect(&mut self, frame: &Frame) -> Result<Geometry> {
		let landmarks = self.model.landmarks(frame)?;
		debug!("landmarks", tags![
			("found", &landmarks.as_ref().map_or(0, |l| l.len()).to_string())
		]);
		Ok(Geometry::Landmarks(landmarks))
	}
}

pub struct RegionProvider<F: FaceDetector, E: EyeDetector> {
	faces: F,
	eyes: E,
}

impl<F: FaceDetector, E: EyeDetector> RegionProvider<F, E> {
	pub fn new(faces: F, eyes: E) -> Self {
		Self{faces: faces, eyes: eyes}
	}
}

impl<F: FaceDetector, E: EyeDetector> GeometryProvider for RegionProvider<F, E> {
	fn detect(&mut self, frame: &Frame) -> Result<Geometry> {
		let faces = self.faces.faces(frame)?;

		// Only the first face is evaluated
		let face = faces.iter()
			.find_map(|f| f.clip_to(frame.width, frame.height));

		let face = match face {
			Some(face) => face,
			None => return Ok(Geometry::Regions{face: None, eyes: vec![]}),
		};

		let crop = frame.crop(&face)?;
		let eyes = self.eyes.eyes(&crop)?;
		debug!("regions", tags![
			("faces", &faces.len().to_string()),
			("face", &format!("{:?}", face)),
			("eyes", &eyes.len().to_string())
		]);

		Ok(Geometry::Regions{face: Some(face), eyes: eyes})
	}
}

impl<P: GeometryProvider + ?Sized> GeometryProvider for Box<P> {
	fn detect(&mut self, frame: &Frame) -> Result<Geometry> {
		(**self).detect(frame)
	}
}
