use serde::Serialize;

use crate::errors::*;

#[derive(Serialize, Clone, Copy, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
	// Iris ratio from a dense landmark model
	Landmark,
	// Eye count inside a cascade face box
	Region,
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Config {
	pub webcam_device: String,
	pub webcam_interval: (u32, u32),
	pub webcam_resolution: (u32, u32),
	pub mode: Mode,
	pub sidecar_path: String,
	pub sidecar_timeout: u64,
	pub face_model_path: String,
	pub min_face_size: u32,
	pub verbose: bool,
}

impl Config {
	pub fn validate(&self) -> Result<()> {
		let (w, h) = self.webcam_resolution;
		if w == 0 || h == 0 {
			return fail(ErrorType::InvalidConfig, "webcamResolution must be non-zero");
		}
		if self.webcam_interval.1 == 0 {
			return fail(ErrorType::InvalidConfig, "webcamInterval denominator must be non-zero");
		}
		// A zero read timeout is rejected by the socket
		if self.sidecar_timeout == 0 {
			return fail(ErrorType::InvalidConfig, "sidecarTimeout must be non-zero");
		}
		Ok(())
	}
}

// Gazewatch is the process wide configuration,
// built once in main and borrowed everywhere else.
// Everything is fixed here apart from the two
// command line switches.
pub struct Gazewatch {
	pub config: Config,
}

impl Gazewatch {
	pub fn new<I: IntoIterator<Item = String>>(args: I) -> Result<Self> {
		let mut config = Config {
			// Camera index 0
			webcam_device: "/dev/video0".to_string(),
			webcam_interval: (1, 30),
			webcam_resolution: (640, 480),
			mode: Mode::Landmark,
			sidecar_path: "/tmp/gazewatch-sidecar.sock".to_string(),
			sidecar_timeout: 2,
			face_model_path: "seeta_fd_frontal_v1.0.bin".to_string(),
			min_face_size: 40,
			verbose: false,
		};

		for arg in args {
			match arg.as_str() {
				"-v" | "--verbose" => config.verbose = true,
				"--landmark" => config.mode = Mode::Landmark,
				"--region" => config.mode = Mode::Region,
				_ => return fail(ErrorType::InvalidConfig,
					format!("unknown argument {}", arg)),
			}
		}

		config.validate()?;
		Ok(Self{
			config: config,
		})
	}
}
