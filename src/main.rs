use std::backtrace::BacktraceStatus;
use std::env;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

mod ltsv;
mod errors;
use errors::*;
mod gazewatch;
use gazewatch::{Config, Gazewatch, Mode};
mod frame;
mod geometry;
mod gaze;
mod source;
mod webcam;
use webcam::Webcam;
mod display;
use display::ConsoleDisplay;
mod provider;
use provider::{GeometryProvider, LandmarkProvider, RegionProvider};
use provider::seeta::SeetaFaceDetector;
use provider::sidecar::Sidecar;
mod controller;
use controller::Summary;

// Selected once, the loop only sees the trait
fn geometry_provider(config: &Config) -> Result<Box<dyn GeometryProvider>> {
	let timeout = Duration::from_secs(config.sidecar_timeout);
	let sidecar = Sidecar::connect(&config.sidecar_path, timeout)?;
	info!("geometry provider ready", tags![
		("mode", &format!("{:?}", config.mode)),
		("model", sidecar.model())
	]);

	Ok(match config.mode {
		Mode::Landmark => Box::new(LandmarkProvider::new(sidecar)),
		Mode::Region => {
			let faces = SeetaFaceDetector::new(
				&config.face_model_path, config.min_face_size)?;
			Box::new(RegionProvider::new(faces, sidecar))
		},
	})
}

fn report_fault(e: &(dyn std::error::Error + 'static)) {
	error!("unhandled fault", tags![
		("error", &e.to_string())
	]);

	eprintln!("error: {}", e);
	let mut cause = e.source();
	while let Some(c) = cause {
		eprintln!("caused by: {}", c);
		cause = c.source();
	}
	// Captured where the error was built, verbose only
	if let Some(ours) = e.downcast_ref::<Error>() {
		if ours.backtrace().status() == BacktraceStatus::Captured {
			eprintln!("{}", ours.backtrace());
		}
	}
}

// By the time the loop hands back a result the
// source and display are already released.
fn exit_code(result: Result<Summary>) -> i32 {
	match result {
		Ok(summary) => {
			info!("gazewatch stopped", tags![
				("frames", &summary.frames.to_string()),
				("reason", &format!("{:?}", summary.reason))
			]);
			0
		},
		Err(e) => {
			if error_type_of(e.as_ref()) == Some(ErrorType::SourceUnavailable) {
				error!("couldn't open video source", tags![
					("error", &e.to_string())
				]);
			} else {
				report_fault(e.as_ref());
			}
			1
		},
	}
}

// Everything acquired here is dropped before main exits
fn run() -> i32 {
	let args = env::args_os().skip(1).map(|a| a.to_string_lossy().into_owned());
	let g = match Gazewatch::new(args) {
		Ok(g) => g,
		Err(e) => {
			error!("bad arguments", tags![
				("error", &e.to_string()),
				("usage", "gazewatch [-v|--verbose] [--landmark|--region]")
			]);
			return 1;
		},
	};
	ltsv::set_verbose(g.config.verbose);
	info!("gazewatch started", tags![
		("mode", &format!("{:?}", g.config.mode)),
		("config", &serde_json::to_string(&g.config).unwrap_or_default())
	]);

	// Ctrl-C is the stop key
	let stop = Arc::new(AtomicBool::new(false));
	let s = stop.clone();
	if let Err(e) = ctrlc::set_handler(move || {
		info!("received ctrlc - closing");
		s.store(true, Ordering::SeqCst);
	}) {
		error!("couldn't set ctrl-c handler", tags![
			("error", &e.to_string())
		]);
		return 1;
	}

	let mut provider = match geometry_provider(&g.config) {
		Ok(provider) => provider,
		Err(e) => {
			error!("couldn't start geometry provider", tags![
				("error", &e.to_string())
			]);
			return 1;
		},
	};

	exit_code(controller::run(
		|| Webcam::open(&g.config),
		&mut provider,
		|| Ok(ConsoleDisplay::new(stop.clone()))))
}

fn main() {
	process::exit(run());
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::cell::Cell;
	use std::rc::Rc;

	use crate::display::{Display, Key};
	use crate::frame::Frame;
	use crate::gaze::Attention;
	use crate::geometry::Geometry;
	use crate::source::{Release, VideoSource};

	#[derive(Default)]
	struct Released {
		source: Cell<u32>,
		display: Cell<u32>,
	}

	// Two frames then the camera goes away
	struct Camera {
		r: Rc<Released>,
		left: u32,
	}

	impl VideoSource for Camera {
		fn read(&mut self) -> Result<Frame> {
			if self.left == 0 {
				return fail(ErrorType::EndOfStream, "camera unplugged");
			}
			self.left -= 1;
			Frame::new(4, 4, vec![0; 16])
		}
	}

	impl Release for Camera {
		fn release(&mut self) {
			self.r.source.set(self.r.source.get() + 1);
		}
	}

	struct Screen {
		r: Rc<Released>,
		quit: bool,
	}

	impl Display for Screen {
		fn draw_overlay(&mut self, _frame: &Frame, _attention: Attention,
			_geometry: &Geometry) -> Result<()> {
			Ok(())
		}

		fn draw_status(&mut self, _frame: &Frame, _attention: Attention) -> Result<()> {
			Ok(())
		}

		fn show(&mut self, _frame: &Frame) -> Result<()> {
			Ok(())
		}

		fn poll_key(&mut self) -> Option<Key> {
			if self.quit { Some(Key::Quit) } else { None }
		}
	}

	impl Release for Screen {
		fn release(&mut self) {
			self.r.display.set(self.r.display.get() + 1);
		}
	}

	struct NoFace;

	impl GeometryProvider for NoFace {
		fn detect(&mut self, _frame: &Frame) -> Result<Geometry> {
			Ok(Geometry::Landmarks(None))
		}
	}

	struct SidecarGone;

	impl GeometryProvider for SidecarGone {
		fn detect(&mut self, _frame: &Frame) -> Result<Geometry> {
			Err(Box::new(std::io::Error::new(
				std::io::ErrorKind::BrokenPipe, "sidecar gone")))
		}
	}

	fn session<P: GeometryProvider>(r: &Rc<Released>, provider: &mut P,
		quit: bool) -> i32 {
		let (a, b) = (r.clone(), r.clone());
		exit_code(controller::run(
			move || Ok(Camera{r: a, left: 2}),
			provider,
			move || Ok(Screen{r: b, quit: quit})))
	}

	#[test]
	fn stop_key_exits_zero() {
		let r = Rc::new(Released::default());
		assert_eq!(session(&r, &mut NoFace, true), 0);
		assert_eq!(r.source.get(), 1);
		assert_eq!(r.display.get(), 1);
	}

	#[test]
	fn end_of_stream_exits_zero() {
		let r = Rc::new(Released::default());
		assert_eq!(session(&r, &mut NoFace, false), 0);
		assert_eq!(r.source.get(), 1);
		assert_eq!(r.display.get(), 1);
	}

	#[test]
	fn open_failure_exits_non_zero() {
		let code = exit_code(controller::run(
			|| fail::<Camera>(ErrorType::SourceUnavailable, "/dev/video0"),
			&mut NoFace,
			|| -> Result<Screen> { panic!("display opened without a source") }));
		assert_ne!(code, 0);
	}

	#[test]
	fn unhandled_fault_exits_non_zero_after_cleanup() {
		let r = Rc::new(Released::default());
		assert_ne!(session(&r, &mut SidecarGone, false), 0);
		assert_eq!(r.source.get(), 1);
		assert_eq!(r.display.get(), 1);
	}
}
