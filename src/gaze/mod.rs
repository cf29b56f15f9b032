use serde::Serialize;

pub mod landmark;
pub mod region;

pub use landmark::LandmarkAttention;
pub use region::RegionAttention;

// Overlay colours are BGR, the camera's channel order
pub type Color = (u8, u8, u8);

pub const GREEN: Color = (0, 255, 0);
pub const RED: Color = (0, 0, 255);
pub const BLUE: Color = (255, 100, 0);
pub const ORANGE: Color = (0, 165, 255);

// The per-frame attention state, from whichever classifier ran.
#[derive(Serialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(untagged)]
pub enum Attention {
	Landmark(LandmarkAttention),
	Region(RegionAttention),
}

impl Attention {
	pub fn label(&self) -> &'static str {
		match self {
			Attention::Landmark(a) => a.label(),
			Attention::Region(a) => a.label(),
		}
	}

	pub fn color(&self) -> Color {
		match self {
			Attention::Landmark(a) => a.color(),
			Attention::Region(a) => a.color(),
		}
	}

	pub fn on_screen(&self) -> bool {
		match self {
			Attention::Landmark(a) => *a == LandmarkAttention::LookingAtScreen,
			Attention::Region(a) => *a == RegionAttention::LookingAtScreen,
		}
	}

	pub fn name(&self) -> String {
		// Unit variants always serialize to a plain string
		match serde_json::to_value(self) {
			Ok(serde_json::Value::String(s)) => s,
			_ => format!("{:?}", self),
		}
	}
}
