// Client for an out of process model server on a unix socket.
//
// Every message is a ten byte header followed by a body:
//   version (u8, always 0)
//   msg_type (u8)
//   msg_len (u32 little endian, body length)
//   msg_id (u32 little endian)
// Requests carrying a frame have a body of width (u32 le),
// height (u32 le) then the luma pixels. Replies echo the
// type and id and carry a JSON body.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::time::Duration;

use serde::Deserialize;

use crate::errors::*;
use crate::{info, error, tags};
use crate::frame::Frame;
use crate::geometry::{LandmarkSet, Point, Rect};
use super::{EyeDetector, LandmarkModel};

const VERSION: u8 = 0;
const HEADER_LEN: usize = 10;
// A 4K luma frame is well under this
const MAX_BODY: u32 = 16 * 1024 * 1024;

#[derive(Copy, Clone, PartialEq, Debug)]
pub enum MsgType {
	Hello,
	Landmarks,
	Eyes,
	Shutdown,
}

impl MsgType {
	fn to_byte(self) -> u8 {
		match self {
			MsgType::Hello => b'A',
			MsgType::Landmarks => b'L',
			MsgType::Eyes => b'E',
			MsgType::Shutdown => b'Z',
		}
	}

	fn from_byte(b: u8) -> Result<Self> {
		match b {
			b'A' => Ok(MsgType::Hello),
			b'L' => Ok(MsgType::Landmarks),
			b'E' => Ok(MsgType::Eyes),
			b'Z' => Ok(MsgType::Shutdown),
			_ => fail(ErrorType::InvalidResponse,
				format!("unknown message type {:#04x}", b)),
		}
	}
}

#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Header {
	pub msg_type: MsgType,
	pub msg_len: u32,
	pub msg_id: u32,
}

impl Header {
	pub fn to_raw(&self) -> [u8; HEADER_LEN] {
		let mut raw = [0; HEADER_LEN];
		raw[0] = VERSION;
		raw[1] = self.msg_type.to_byte();
		raw[2..6].copy_from_slice(&self.msg_len.to_le_bytes());
		raw[6..10].copy_from_slice(&self.msg_id.to_le_bytes());
		raw
	}

	pub fn from_raw(raw: &[u8; HEADER_LEN]) -> Result<Self> {
		// The first byte is the version
		if raw[0] != VERSION {
			return fail(ErrorType::InvalidResponse,
				format!("unsupported version {}", raw[0]));
		}

		let msg_type = MsgType::from_byte(raw[1])?;

		let msg_len = u32::from_le_bytes([raw[2], raw[3], raw[4], raw[5]]);
		let msg_id = u32::from_le_bytes([raw[6], raw[7], raw[8], raw[9]]);

		Ok(Self{
			msg_type: msg_type,
			msg_len: msg_len,
			msg_id: msg_id,
		})
	}
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HelloResponse {
	model: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LandmarksResponse {
	landmarks: Option<HashMap<u32, (f64, f64)>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EyesResponse {
	eyes: Vec<Rect>,
}

pub struct Sidecar {
	stream: UnixStream,
	msg_id: u32,
	model: String,
}

impl Sidecar {
	pub fn connect(path: &str, timeout: Duration) -> Result<Self> {
		info!("connecting to model sidecar", tags![
			("path", path)
		]);
		let stream = match UnixStream::connect(path) {
			Ok(stream) => stream,
			Err(e) => return fail(ErrorType::SourceUnavailable,
				format!("{}: {}", path, e)),
		};
		Sidecar::handshake(stream, timeout)
	}

	// Split out from connect so tests can hand
	// in one end of a socket pair.
	pub fn handshake(stream: UnixStream, timeout: Duration) -> Result<Self> {
		stream.set_read_timeout(Some(timeout))?;
		let mut sidecar = Self{
			stream: stream,
			msg_id: 0,
			model: String::new(),
		};

		let body = sidecar.request(MsgType::Hello, &[])?;
		let hello: HelloResponse = parse(&body)?;
		sidecar.model = hello.model;

		info!("sidecar ready", tags![
			("model", &sidecar.model)
		]);
		Ok(sidecar)
	}

	pub fn model(&self) -> &str {
		&self.model
	}

	fn request(&mut self, msg_type: MsgType, body: &[u8]) -> Result<Vec<u8>> {
		self.msg_id = self.msg_id.wrapping_add(1);
		let header = Header{
			msg_type: msg_type,
			msg_len: body.len() as u32,
			msg_id: self.msg_id,
		};
		self.stream.write_all(&header.to_raw())?;
		self.stream.write_all(body)?;

		let mut raw = [0; HEADER_LEN];
		self.stream.read_exact(&mut raw)?;
		let reply = Header::from_raw(&raw)?;

		if reply.msg_len > MAX_BODY {
			return fail(ErrorType::InvalidResponse,
				format!("reply body of {} bytes", reply.msg_len));
		}

		// Always consume the body so the stream stays
		// aligned on a header.
		let mut body = vec![0; reply.msg_len as usize];
		self.stream.read_exact(&mut body)?;

		if reply.msg_type != msg_type || reply.msg_id != self.msg_id {
			return fail(ErrorType::InvalidResponse, format!(
				"expected {:?}/{} got {:?}/{}",
				msg_type, self.msg_id, reply.msg_type, reply.msg_id));
		}
		Ok(body)
	}

	fn frame_request(&mut self, msg_type: MsgType, frame: &Frame) -> Result<Vec<u8>> {
		let mut body = Vec::with_capacity(8 + frame.pixels.len());
		body.extend_from_slice(&frame.width.to_le_bytes());
		body.extend_from_slice(&frame.height.to_le_bytes());
		body.extend_from_slice(&frame.pixels);
		self.request(msg_type, &body)
	}
}

fn parse<'a, T: Deserialize<'a>>(body: &'a [u8]) -> Result<T> {
	match serde_json::from_slice(body) {
		Ok(t) => Ok(t),
		Err(e) => fail(ErrorType::InvalidResponse, e.to_string()),
	}
}

impl LandmarkModel for Sidecar {
	fn landmarks(&mut self, frame: &Frame) -> Result<Option<LandmarkSet>> {
		let body = self.frame_request(MsgType::Landmarks, frame)?;
		let reply: LandmarksResponse = parse(&body)?;
		Ok(reply.landmarks.map(|points| {
			points.into_iter()
				.map(|(id, (x, y))| (id, Point::new(x, y)))
				.collect()
		}))
	}
}

impl EyeDetector for Sidecar {
	fn eyes(&mut self, face: &Frame) -> Result<Vec<Rect>> {
		let body = self.frame_request(MsgType::Eyes, face)?;
		let reply: EyesResponse = parse(&body)?;
		Ok(reply.eyes)
	}
}

impl Drop for Sidecar {
	fn drop(&mut self) {
		// Tell the sidecar we're going, log an
		// error if it has already gone.
		if let Err(e) = self.request(MsgType::Shutdown, &[]) {
			error!("couldn't shut down sidecar", tags![
				("error", &e.to_string())
			]);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::thread;
	use crate::geometry::{LEFT_IRIS, RIGHT_IRIS};

	// Plays the sidecar side: answers each request with the
	// next scripted (type, body), echoing the request id.
	fn serve(mut stream: UnixStream, script: Vec<(u8, &'static str)>)
		-> thread::JoinHandle<Vec<Header>> {
		thread::spawn(move || {
			let mut seen = vec![];
			for (msg_type, body) in script {
				let mut raw = [0; HEADER_LEN];
				if stream.read_exact(&mut raw).is_err() {
					break;
				}
				let header = Header::from_raw(&raw).unwrap();
				let mut req = vec![0; header.msg_len as usize];
				stream.read_exact(&mut req).unwrap();
				seen.push(header);

				let mut reply = [0; HEADER_LEN];
				reply[1] = msg_type;
				reply[2..6].copy_from_slice(&(body.len() as u32).to_le_bytes());
				reply[6..10].copy_from_slice(&header.msg_id.to_le_bytes());
				stream.write_all(&reply).unwrap();
				stream.write_all(body.as_bytes()).unwrap();
			}
			seen
		})
	}

	fn frame() -> Frame {
		Frame::new(4, 2, vec![1; 8]).unwrap()
	}

	#[test]
	fn header_layout() {
		let h = Header{msg_type: MsgType::Eyes, msg_len: 258, msg_id: 7};
		let raw = h.to_raw();
		assert_eq!(raw, [0, b'E', 2, 1, 0, 0, 7, 0, 0, 0]);
		assert_eq!(Header::from_raw(&raw).unwrap(), h);
	}

	#[test]
	fn bad_headers_rejected() {
		let e = Header::from_raw(&[1, b'A', 0, 0, 0, 0, 0, 0, 0, 0]).unwrap_err();
		assert_eq!(error_type_of(e.as_ref()), Some(ErrorType::InvalidResponse));
		let e = Header::from_raw(&[0, b'?', 0, 0, 0, 0, 0, 0, 0, 0]).unwrap_err();
		assert_eq!(error_type_of(e.as_ref()), Some(ErrorType::InvalidResponse));
	}

	#[test]
	fn landmarks_round_trip() {
		let (ours, theirs) = UnixStream::pair().unwrap();
		let peer = serve(theirs, vec![
			(b'A', r#"{"model": "face_mesh_refined"}"#),
			(b'L', r#"{"landmarks": {"473": [0.41, 0.4], "468": [0.6, 0.41]}}"#),
			(b'L', r#"{"landmarks": null}"#),
			(b'Z', "{}"),
		]);

		{
			let mut s = Sidecar::handshake(ours, Duration::from_secs(2)).unwrap();
			assert_eq!(s.model(), "face_mesh_refined");

			let set = s.landmarks(&frame()).unwrap().unwrap();
			assert_eq!(set.len(), 2);
			assert_eq!(set.get(LEFT_IRIS), Some(Point::new(0.41, 0.4)));
			assert_eq!(set.get(RIGHT_IRIS), Some(Point::new(0.6, 0.41)));

			assert_eq!(s.landmarks(&frame()).unwrap(), None);
		// Drop sends shutdown
		}

		let seen = peer.join().unwrap();
		let types: Vec<MsgType> = seen.iter().map(|h| h.msg_type).collect();
		assert_eq!(types, vec![
			MsgType::Hello, MsgType::Landmarks, MsgType::Landmarks, MsgType::Shutdown
		]);
		// width + height + 8 pixels
		assert_eq!(seen[1].msg_len, 16);
		assert_eq!(seen[0].msg_len, 0);
	}

	#[test]
	fn eyes_in_face_coordinates() {
		let (ours, theirs) = UnixStream::pair().unwrap();
		let peer = serve(theirs, vec![
			(b'A', r#"{"model": "haar_eye"}"#),
			(b'E', r#"{"eyes": [{"x": 1, "y": 0, "width": 2, "height": 1}]}"#),
			(b'Z', "{}"),
		]);
		{
			let mut s = Sidecar::handshake(ours, Duration::from_secs(2)).unwrap();
			assert_eq!(s.eyes(&frame()).unwrap(), vec![Rect::new(1, 0, 2, 1)]);
		}
		peer.join().unwrap();
	}

	#[test]
	fn mismatched_reply_type_is_invalid() {
		let (ours, theirs) = UnixStream::pair().unwrap();
		let peer = serve(theirs, vec![
			(b'A', r#"{"model": "m"}"#),
			(b'E', r#"{"eyes": []}"#),
			(b'Z', "{}"),
		]);
		{
			let mut s = Sidecar::handshake(ours, Duration::from_secs(2)).unwrap();
			let e = s.landmarks(&frame()).unwrap_err();
			assert_eq!(error_type_of(e.as_ref()), Some(ErrorType::InvalidResponse));
		}
		peer.join().unwrap();
	}

	#[test]
	fn garbage_json_is_invalid() {
		let (ours, theirs) = UnixStream::pair().unwrap();
		let peer = serve(theirs, vec![
			(b'A', "not json"),
		]);
		let e = Sidecar::handshake(ours, Duration::from_secs(2)).err().unwrap();
		assert_eq!(error_type_of(e.as_ref()), Some(ErrorType::InvalidResponse));
		peer.join().unwrap();
	}

	#[test]
	fn missing_socket_is_unavailable() {
		let e = Sidecar::connect("/nonexistent/gazewatch.sock", Duration::from_secs(1))
			.err()
			.unwrap();
		assert_eq!(error_type_of(e.as_ref()), Some(ErrorType::SourceUnavailable));
	}
}
