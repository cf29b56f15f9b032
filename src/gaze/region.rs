// Attention from the number of eye boxes found inside the face box.
// Both eyes visible is taken as a frontal pose; one eye gets no
// partial credit since the eye cascade misses eyes at oblique angles.

use serde::Serialize;

use crate::geometry::Rect;
use super::{Color, GREEN, RED};

pub const MIN_EYES: usize = 2;

#[derive(Serialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegionAttention {
	LookingAtScreen,
	NotLookingAtScreen,
	NoFaceDetected,
}

impl RegionAttention {
	pub fn label(&self) -> &'static str {
		use RegionAttention::*;
		match self {
			LookingAtScreen => "LOOKING AT SCREEN",
			NotLookingAtScreen => "NOT LOOKING AT SCREEN",
			NoFaceDetected => "No face detected",
		}
	}

	pub fn color(&self) -> Color {
		match self {
			RegionAttention::LookingAtScreen => GREEN,
			_ => RED,
		}
	}
}

// More than two eyes is a detector false positive,
// still counted as both eyes found.
pub fn classify(face: Option<&Rect>, eyes: &[Rect]) -> RegionAttention {
	match face {
		None => RegionAttention::NoFaceDetected,
		Some(_) if eyes.len() >= MIN_EYES => RegionAttention::LookingAtScreen,
		Some(_) => RegionAttention::NotLookingAtScreen,
	}
}
