// Gaze direction from iris position.
//
// Each eye gives the iris's horizontal position between its outer
// corner (0.0) and inner corner (1.0). The two are averaged and the
// result is split into four bands: a centre band, a left and a right
// band, and the two gaps between them, which count as looking away.

use serde::Serialize;

use crate::geometry::{Eye, LandmarkSet};
use super::{Color, GREEN, RED, BLUE, ORANGE};

// Centre 0.5, tolerance 0.15. Written out because 0.5 - 0.15
// doesn't land exactly on 0.35 in floating point.
pub const SCREEN_LOW: f64 = 0.35;
pub const SCREEN_HIGH: f64 = 0.65;
pub const LEFT_BELOW: f64 = 0.3;
pub const RIGHT_ABOVE: f64 = 0.7;

#[derive(Serialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LandmarkAttention {
	LookingAtScreen,
	LookingLeft,
	LookingRight,
	LookingAway,
	NoFaceDetected,
}

impl LandmarkAttention {
	pub fn label(&self) -> &'static str {
		use LandmarkAttention::*;
		match self {
			LookingAtScreen => "LOOKING AT SCREEN",
			LookingLeft => "Looking LEFT",
			LookingRight => "Looking RIGHT",
			LookingAway => "Looking AWAY",
			NoFaceDetected => "No face detected",
		}
	}

	pub fn color(&self) -> Color {
		use LandmarkAttention::*;
		match self {
			LookingAtScreen => GREEN,
			LookingLeft | LookingRight => BLUE,
			LookingAway => ORANGE,
			NoFaceDetected => RED,
		}
	}
}

// Iris position between the corners, 0 at the outer corner.
//
// Not clamped; tracking noise can push it outside [0, 1]. A zero
// width eye gives a non-finite value, which `classify` treats as
// looking away.
pub fn iris_ratio(eye: &Eye) -> f64 {
	(eye.iris.x - eye.outer.x) / (eye.inner.x - eye.outer.x)
}

// Mean iris ratio of both eyes, `None` unless all six points are present.
pub fn gaze_ratio(landmarks: &LandmarkSet) -> Option<f64> {
	let left = landmarks.left_eye()?;
	let right = landmarks.right_eye()?;
	Some((iris_ratio(&left) + iris_ratio(&right)) / 2.0)
}

pub fn classify_ratio(ratio: f64) -> LandmarkAttention {
	if SCREEN_LOW <= ratio && ratio <= SCREEN_HIGH {
		LandmarkAttention::LookingAtScreen
	} else if ratio < LEFT_BELOW {
		LandmarkAttention::LookingLeft
	} else if ratio > RIGHT_ABOVE {
		LandmarkAttention::LookingRight
	} else {
		// The gaps either side of the centre band, and NaN
		LandmarkAttention::LookingAway
	}
}

pub fn classify(landmarks: Option<&LandmarkSet>) -> LandmarkAttention {
	match landmarks.and_then(gaze_ratio) {
		// Degenerate eye corners, the ratio means nothing
		Some(ratio) if !ratio.is_finite() => LandmarkAttention::LookingAway,
		Some(ratio) => classify_ratio(ratio),
		None => LandmarkAttention::NoFaceDetected,
	}
}
