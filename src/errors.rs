use std::backtrace::Backtrace;
use std::fmt;

use crate::ltsv;

#[derive(Copy, Clone, PartialEq, Debug)]
pub enum ErrorType{
	SourceUnavailable,
	EndOfStream,
	MalformedGeometry,
	InvalidResponse,
	InvalidConfig,
	// A foreign error that escaped the frame loop
	Unhandled,
}

// What the frame loop does with a failure at
// one of its boundary calls.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum Disposition {
	// Report and terminate
	Fatal,
	// Leave the loop normally
	Stop,
	// Degrade this frame and carry on
	Continue,
}

impl ErrorType {
	pub fn disposition(self) -> Disposition {
		use ErrorType::*;
		match self {
			SourceUnavailable | InvalidResponse | InvalidConfig | Unhandled => {
				Disposition::Fatal
			},
			EndOfStream => Disposition::Stop,
			MalformedGeometry => Disposition::Continue,
		}
	}
}

pub struct Error{
	pub error_type: ErrorType,
	pub detail: Option<String>,
	cause: Option<Box<dyn std::error::Error>>,
	// Taken where the error was built, only in verbose mode
	backtrace: Backtrace,
}

fn capture() -> Backtrace {
	if ltsv::verbose() {
		Backtrace::force_capture()
	} else {
		Backtrace::disabled()
	}
}

impl Error {
	pub fn with_detail(error_type: ErrorType, detail: impl Into<String>) -> Self {
		Self{
			error_type: error_type,
			detail: Some(detail.into()),
			cause: None,
			backtrace: capture(),
		}
	}

	pub fn backtrace(&self) -> &Backtrace {
		&self.backtrace
	}

	fn format(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		use ErrorType::*;
		write!(f, "{}", match self.error_type {
			SourceUnavailable => "source_unavailable",
			EndOfStream => "end_of_stream",
			MalformedGeometry => "malformed_geometry",
			InvalidResponse => "invalid_response",
			InvalidConfig => "invalid_config",
			Unhandled => "unhandled",
		})?;
		if let Some(ref detail) = self.detail {
			write!(f, ": {}", detail)?;
		}
		Ok(())
	}
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.format(f)
	}
}

impl fmt::Debug for Error {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.format(f)
	}
}

impl std::error::Error for Error{
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		self.cause.as_deref()
	}
}

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

// Shorthand for the common Err(Box::new(Error{..})) construction
pub fn fail<T>(error_type: ErrorType, detail: impl Into<String>) -> Result<T> {
	Err(Box::new(Error::with_detail(error_type, detail)))
}

// Foreign errors (io, json, a model library) carry no trace,
// wrap them where they cross into the frame loop so the trace
// points there. Ours pass through untouched.
pub fn fault(e: Box<dyn std::error::Error>) -> Box<dyn std::error::Error> {
	if e.downcast_ref::<Error>().is_some() {
		return e;
	}
	let mut wrapped = Error::with_detail(ErrorType::Unhandled, e.to_string());
	wrapped.cause = Some(e);
	Box::new(wrapped)
}

pub fn error_type_of(e: &(dyn std::error::Error + 'static)) -> Option<ErrorType> {
	e.downcast_ref::<Error>().map(|e| e.error_type)
}

// Anything that isn't one of ours is an unhandled fault.
pub fn disposition_of(e: &(dyn std::error::Error + 'static)) -> Disposition {
	match error_type_of(e) {
		Some(t) => t.disposition(),
		None => Disposition::Fatal,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::backtrace::BacktraceStatus;
	use std::error::Error as _;

	#[test]
	fn display_includes_detail() {
		let e = Error::with_detail(ErrorType::SourceUnavailable, "/dev/video0");
		assert_eq!(e.to_string(), "source_unavailable: /dev/video0");
	}

	#[test]
	fn boxed_errors_keep_their_disposition() {
		let r: Result<()> = fail(ErrorType::MalformedGeometry, "box off frame");
		let e = r.unwrap_err();
		assert_eq!(disposition_of(e.as_ref()), Disposition::Continue);

		let r: Result<()> = fail(ErrorType::EndOfStream, "camera gone");
		assert_eq!(disposition_of(r.unwrap_err().as_ref()), Disposition::Stop);
	}

	#[test]
	fn foreign_errors_are_fatal() {
		let e: Box<dyn std::error::Error> = Box::new(
			std::io::Error::new(std::io::ErrorKind::Other, "boom"));
		assert_eq!(error_type_of(e.as_ref()), None);
		assert_eq!(disposition_of(e.as_ref()), Disposition::Fatal);
	}

	#[test]
	fn fault_wraps_foreign_errors_only() {
		let io: Box<dyn std::error::Error> = Box::new(
			std::io::Error::new(std::io::ErrorKind::BrokenPipe, "sidecar gone"));
		let e = fault(io);
		assert_eq!(error_type_of(e.as_ref()), Some(ErrorType::Unhandled));
		assert_eq!(e.to_string(), "unhandled: sidecar gone");
		let cause = e.source().unwrap();
		assert!(cause.downcast_ref::<std::io::Error>().is_some());

		let ours = fault(Box::new(Error::with_detail(ErrorType::InvalidResponse, "bad id")));
		assert_eq!(error_type_of(ours.as_ref()), Some(ErrorType::InvalidResponse));
		assert!(ours.source().is_none());
	}

	#[test]
	fn verbose_errors_carry_their_origin() {
		ltsv::set_verbose(true);
		let e = Error::with_detail(ErrorType::InvalidResponse, "bad id");
		assert_eq!(e.backtrace().status(), BacktraceStatus::Captured);
	}
}
