use rscam::Camera;

use crate::errors::*;
use crate::{info, warn, error, debug, tags};
use crate::frame::Frame;
use crate::gazewatch::Config;
use crate::source::{Release, VideoSource};

pub struct Webcam {
	// None once released
	camera: Option<Camera>,
	device: String,
	resolution: (u32, u32),
	warned: bool,
}

impl Webcam {
	pub fn open(config: &Config) -> Result<Self> {
		// Open the camera
		info!("opening camera", tags![
			("webcam_device", &config.webcam_device),
			("webcam_interval", &format!("{:?}", &config.webcam_interval)),
			("webcam_resolution", &format!("{:?}", &config.webcam_resolution))
		]);

		let unavailable = |e: &dyn std::error::Error| {
			Error::with_detail(ErrorType::SourceUnavailable,
				format!("{}: {}", config.webcam_device, e))
		};

		let mut camera = Camera::new(&config.webcam_device)
			.map_err(|e| unavailable(&e))?;
		let rsconfig = rscam::Config{
			interval: config.webcam_interval,
			resolution: config.webcam_resolution,
			format: b"YUYV",
			nbuffers: 2,
			field: rscam::FIELD_NONE,
		};

		camera.start(&rsconfig).map_err(|e| unavailable(&e))?;

		// Check it's working
		for _ in 0..3 {
			camera.capture().map_err(|e| unavailable(&e))?;
		}

		Ok(Self{
			camera: Some(camera),
			device: config.webcam_device.clone(),
			resolution: config.webcam_resolution,
			warned: false,
		})
	}
}

impl VideoSource for Webcam {
	fn read(&mut self) -> Result<Frame> {
		let camera = match self.camera {
			Some(ref camera) => camera,
			None => return fail(ErrorType::EndOfStream, "camera released"),
		};

		let frame = match camera.capture() {
			Ok(frame) => frame,
			Err(e) => {
				error!("couldn't read frame", tags![
					("error", &e.to_string())
				]);
				return fail(ErrorType::EndOfStream, e.to_string());
			},
		};

		debug!("frame captured", tags![
			("timestamp", &frame.get_timestamp().to_string())
		]);

		// The driver may not honour the requested resolution
		let (width, height) = frame.resolution;
		if (width, height) != self.resolution && !self.warned {
			warn!("camera resolution differs from config", tags![
				("requested", &format!("{:?}", self.resolution)),
				("actual", &format!("{:?}", frame.resolution))
			]);
			self.warned = true;
		}
		Frame::from_yuyv(&frame[..], width, height)
	}
}

impl Release for Webcam {
	fn release(&mut self) {
		if let Some(mut camera) = self.camera.take() {
			if let Err(e) = camera.stop() {
				error!("couldn't stop camera", tags![
					("error", &e.to_string())
				]);
			}
			info!("camera released", tags![
				("webcam_device", &self.device)
			]);
		}
	}
}
