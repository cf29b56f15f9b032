use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;

use crate::errors::*;
use crate::{info, debug, tags};
use crate::frame::Frame;
use crate::gaze::{Attention, Color};
use crate::geometry::{Geometry, Rect};
use crate::source::Release;

#[derive(Copy, Clone, PartialEq, Debug)]
pub enum Key {
	Quit,
}

pub trait Display: Release {
	// Full overlay, may fail on bad geometry
	fn draw_overlay(&mut self, frame: &Frame, attention: Attention,
		geometry: &Geometry) -> Result<()>;
	// Text only, used when draw_overlay fails
	fn draw_status(&mut self, frame: &Frame, attention: Attention) -> Result<()>;
	fn show(&mut self, frame: &Frame) -> Result<()>;
	fn poll_key(&mut self) -> Option<Key>;
}

#[derive(Serialize, Clone, Copy, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
	pub x: u32,
	pub y: u32,
}

#[derive(Serialize, Clone, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Overlay {
	pub state: Attention,
	pub label: &'static str,
	pub color: Color,
	// Face and eye boxes, frame coordinates
	pub boxes: Vec<Rect>,
	// Landmarks, frame pixels
	pub markers: Vec<Marker>,
}

impl Overlay {
	pub fn status(attention: Attention) -> Self {
		Self{
			state: attention,
			label: attention.label(),
			color: attention.color(),
			boxes: vec![],
			markers: vec![],
		}
	}

	pub fn build(frame: &Frame, attention: Attention, geometry: &Geometry) -> Result<Self> {
		let mut overlay = Overlay::status(attention);

		match geometry {
			Geometry::Landmarks(None) => {},
			Geometry::Landmarks(Some(landmarks)) => {
				for (id, p) in landmarks.points() {
					if !(0.0..=1.0).contains(&p.x) || !(0.0..=1.0).contains(&p.y) {
						return fail(ErrorType::MalformedGeometry, format!(
							"landmark {} at ({}, {})", id, p.x, p.y));
					}
					overlay.markers.push(Marker{
						x: (p.x * (frame.width.saturating_sub(1)) as f64).round() as u32,
						y: (p.y * (frame.height.saturating_sub(1)) as f64).round() as u32,
					});
				}
			},
			Geometry::Regions { face: None, .. } => {},
			Geometry::Regions { face: Some(face), eyes } => {
				overlay.boxes.push(*face);
				for eye in eyes.iter() {
					match eye.offset_by(face) {
						Some(b) => overlay.boxes.push(b),
						None => return fail(ErrorType::MalformedGeometry, format!(
							"{:?} can't be offset by {:?}", eye, face)),
					}
				}
			},
		}

		for b in overlay.boxes.iter() {
			if !b.fits_within(frame.width, frame.height) {
				return fail(ErrorType::MalformedGeometry, format!(
					"{:?} outside {}x{} frame", b, frame.width, frame.height));
			}
		}

		Ok(overlay)
	}
}

// ConsoleDisplay is headless, each shown frame
// becomes a log line. Ctrl-C is the stop key.
pub struct ConsoleDisplay {
	stop: Arc<AtomicBool>,
	pending: Option<Overlay>,
	last_state: Option<Attention>,
	shown: u64,
}

impl ConsoleDisplay {
	pub fn new(stop: Arc<AtomicBool>) -> Self {
		Self{
			stop: stop,
			pending: None,
			last_state: None,
			shown: 0,
		}
	}
}

impl Display for ConsoleDisplay {
	fn draw_overlay(&mut self, frame: &Frame, attention: Attention,
		geometry: &Geometry) -> Result<()> {
		self.pending = Some(Overlay::build(frame, attention, geometry)?);
		Ok(())
	}

	fn draw_status(&mut self, _frame: &Frame, attention: Attention) -> Result<()> {
		self.pending = Some(Overlay::status(attention));
		Ok(())
	}

	fn show(&mut self, frame: &Frame) -> Result<()> {
		let overlay = match self.pending.take() {
			Some(overlay) => overlay,
			None => return Ok(()),
		};
		self.shown += 1;

		let json = serde_json::to_string(&overlay)?;
		debug!("frame shown", tags![
			("frame", &self.shown.to_string()),
			("resolution", &format!("{}x{}", frame.width, frame.height)),
			("overlay", &json)
		]);

		if self.last_state != Some(overlay.state) {
			info!("attention changed", tags![
				("state", &overlay.state.name()),
				("label", overlay.label),
				("on_screen", if overlay.state.on_screen() { "true" } else { "false" })
			]);
			self.last_state = Some(overlay.state);
		}
		Ok(())
	}

	fn poll_key(&mut self) -> Option<Key> {
		if self.stop.load(Ordering::SeqCst) {
			Some(Key::Quit)
		} else {
			None
		}
	}
}

impl Release for ConsoleDisplay {
	fn release(&mut self) {
		self.pending.take();
		info!("display closed", tags![
			("frames_shown", &self.shown.to_string())
		]);
	}
}
