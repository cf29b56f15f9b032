use std::collections::HashMap;

use serde::{Serialize, Deserialize};

use crate::gaze::{self, Attention};

// Face mesh indices, refined (iris) topology
pub const LEFT_IRIS: u32 = 473;
pub const RIGHT_IRIS: u32 = 468;
pub const LEFT_EYE_INNER: u32 = 133;
pub const LEFT_EYE_OUTER: u32 = 263;
pub const RIGHT_EYE_INNER: u32 = 362;
pub const RIGHT_EYE_OUTER: u32 = 33;

// A landmark position normalized to the frame, (0, 0) top left.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub fn new(x: f64, y: f64) -> Self {
		Self{x: x, y: y}
	}
}

// Axis aligned box in pixels.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub struct Rect {
	pub x: i32,
	pub y: i32,
	pub width: u32,
	pub height: u32,
}

impl Rect {
	pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
		Self{x: x, y: y, width: width, height: height}
	}

	// Move a box detected inside `parent` into the parent's
	// coordinate frame. None if the sum doesn't fit an i32, model
	// output is not trusted.
	pub fn offset_by(&self, parent: &Rect) -> Option<Rect> {
		let x = self.x.checked_add(parent.x)?;
		let y = self.y.checked_add(parent.y)?;
		Some(Rect::new(x, y, self.width, self.height))
	}

	// Detectors can report boxes hanging off the frame edge,
	// None when nothing is left after clipping.
	pub fn clip_to(&self, width: u32, height: u32) -> Option<Rect> {
		let x0 = (self.x as i64).max(0);
		let y0 = (self.y as i64).max(0);
		let x1 = (self.x as i64 + self.width as i64).min(width as i64);
		let y1 = (self.y as i64 + self.height as i64).min(height as i64);
		if x1 <= x0 || y1 <= y0 {
			return None;
		}
		Some(Rect::new(x0 as i32, y0 as i32, (x1 - x0) as u32, (y1 - y0) as u32))
	}

	pub fn fits_within(&self, width: u32, height: u32) -> bool {
		self.x >= 0 && self.y >= 0 &&
			self.x as u64 + self.width as u64 <= width as u64 &&
			self.y as u64 + self.height as u64 <= height as u64
	}
}

// One frame's landmarks, keyed by mesh index.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LandmarkSet {
	points: HashMap<u32, Point>,
}

// Iris centre and the two corners of one eye.
#[derive(Clone, Copy, Debug)]
pub struct Eye {
	pub iris: Point,
	pub inner: Point,
	pub outer: Point,
}

impl LandmarkSet {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&mut self, id: u32, point: Point) {
		self.points.insert(id, point);
	}

	pub fn get(&self, id: u32) -> Option<Point> {
		self.points.get(&id).copied()
	}

	pub fn len(&self) -> usize {
		self.points.len()
	}

	pub fn points(&self) -> impl Iterator<Item = (u32, Point)> + '_ {
		self.points.iter().map(|(&id, &p)| (id, p))
	}

	pub fn left_eye(&self) -> Option<Eye> {
		self.eye(LEFT_IRIS, LEFT_EYE_INNER, LEFT_EYE_OUTER)
	}

	pub fn right_eye(&self) -> Option<Eye> {
		self.eye(RIGHT_IRIS, RIGHT_EYE_INNER, RIGHT_EYE_OUTER)
	}

	fn eye(&self, iris: u32, inner: u32, outer: u32) -> Option<Eye> {
		Some(Eye{
			iris: self.get(iris)?,
			inner: self.get(inner)?,
			outer: self.get(outer)?,
		})
	}
}

impl std::iter::FromIterator<(u32, Point)> for LandmarkSet {
	fn from_iter<I: IntoIterator<Item = (u32, Point)>>(iter: I) -> Self {
		Self{
			points: iter.into_iter().collect(),
		}
	}
}

// Whatever the geometry provider found in a frame.
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
	Landmarks(Option<LandmarkSet>),
	// Eye boxes are in the face's coordinate frame
	Regions {
		face: Option<Rect>,
		eyes: Vec<Rect>,
	},
}

impl Geometry {
	pub fn classify(&self) -> Attention {
		match self {
			Geometry::Landmarks(landmarks) => {
				Attention::Landmark(gaze::landmark::classify(landmarks.as_ref()))
			},
			Geometry::Regions { face, eyes } => {
				Attention::Region(gaze::region::classify(face.as_ref(), eyes))
			},
		}
	}
}
