use std::ops::{Deref, DerefMut};

use crate::errors::*;
use crate::frame::Frame;

pub trait Release {
	// Called at most once, by Scoped
	fn release(&mut self);
}

pub trait VideoSource: Release {
	// An Err here means the stream is over, whatever
	// its error type.
	fn read(&mut self) -> Result<Frame>;
}

// Scoped owns something that must be released and
// releases it exactly once when dropped, whether we
// leave by returning, by ? or by unwinding.
pub struct Scoped<T: Release> {
	inner: T,
	released: bool,
}

impl<T: Release> Scoped<T> {
	pub fn new(inner: T) -> Self {
		Self{
			inner: inner,
			released: false,
		}
	}
}

impl<T: Release> Deref for Scoped<T> {
	type Target = T;

	fn deref(&self) -> &T {
		&self.inner
	}
}

impl<T: Release> DerefMut for Scoped<T> {
	fn deref_mut(&mut self) -> &mut T {
		&mut self.inner
	}
}

impl<T: Release> Drop for Scoped<T> {
	fn drop(&mut self) {
		if !self.released {
			self.released = true;
			self.inner.release();
		}
	}
}
