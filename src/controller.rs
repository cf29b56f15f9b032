use crate::errors::*;
use crate::{info, error, debug, tags};
use crate::display::{Display, Key};
use crate::provider::GeometryProvider;
use crate::source::{Scoped, VideoSource};

#[derive(Copy, Clone, PartialEq, Debug)]
pub enum StopReason {
	StopKey,
	EndOfStream,
}

#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Summary {
	// Full classify and render cycles
	pub frames: u64,
	pub reason: StopReason,
}

// Drives read -> mirror -> detect -> classify -> render -> poll
// until the stop key or the end of the stream.
//
// The source is opened first and the display only once that has
// worked. Both are released exactly once on the way out, including
// when an error or panic escapes the loop.
pub fn run<S, D, P>(open_source: impl FnOnce() -> Result<S>,
	                provider: &mut P,
	                open_display: impl FnOnce() -> Result<D>) -> Result<Summary>
	where S: VideoSource,
	      D: Display,
	      P: GeometryProvider + ?Sized {

	let mut source = Scoped::new(open_source()?);
	let mut display = Scoped::new(open_display()?);

	info!("frame loop started");
	let mut frames: u64 = 0;

	let reason = loop {
		debug!("reading frame", tags![
			("frame", &frames.to_string())
		]);

		let mut frame = match source.read() {
			Ok(frame) => frame,
			Err(e) => {
				info!("stream ended", tags![
					("error", &e.to_string())
				]);
				break StopReason::EndOfStream;
			},
		};

		frame.mirror();

		let geometry = provider.detect(&frame).map_err(fault)?;
		let attention = geometry.classify();
		debug!("classified", tags![
			("frame", &frames.to_string()),
			("state", &attention.name())
		]);

		if let Err(e) = display.draw_overlay(&frame, attention, &geometry) {
			match disposition_of(e.as_ref()) {
				Disposition::Continue => {
					error!("couldn't draw overlay", tags![
						("frame", &frames.to_string()),
						("error", &e.to_string())
					]);
					display.draw_status(&frame, attention).map_err(fault)?;
				},
				_ => return Err(fault(e)),
			}
		}

		display.show(&frame).map_err(fault)?;
		frames += 1;

		if display.poll_key() == Some(Key::Quit) {
			info!("stop key received");
			break StopReason::StopKey;
		}
	};

	info!("frame loop finished", tags![
		("frames", &frames.to_string()),
		("reason", &format!("{:?}", reason))
	]);

	Ok(Summary{
		frames: frames,
		reason: reason,
	})
}
