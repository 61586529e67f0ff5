use crate::error::IoError;

/// FIFO of bytes read from the wire but not yet handed to a caller.
///
/// Grows at the back from the scratch buffer, drains from the front.
#[derive(Debug, Default)]
pub struct ReadCache {
	bytes: Vec<u8>,
}

impl ReadCache {
	pub fn new() -> Self {
		Self::default()
	}

	#[inline]
	pub fn len(&self) -> usize {
		self.bytes.len()
	}

	#[inline]
	pub fn is_empty(&self) -> bool {
		self.bytes.is_empty()
	}

	/// Appends freshly received bytes.
	pub fn append(&mut self, bytes: &[u8]) {
		self.bytes.extend_from_slice(bytes);
	}

	/// Puts bytes back at the front, ahead of everything still cached.
	pub fn unread(&mut self, bytes: &[u8]) {
		self.bytes.splice(0..0, bytes.iter().copied());
	}

	/// Copies cached bytes into `dest`.
	///
	/// - empty cache: `Ok(0)`
	/// - cache fits: everything is copied and the cache is emptied
	/// - cache larger than `dest` with `truncate`: the first `dest.len()` bytes
	///   are copied, the tail stays cached for the next call
	/// - cache larger than `dest` without `truncate`: [`IoError::BufferTooSmall`],
	///   nothing is consumed
	pub fn fill(&mut self, dest: &mut [u8], truncate: bool) -> Result<usize, IoError> {
		if self.bytes.is_empty() {
			return Ok(0);
		}

		if self.bytes.len() > dest.len() {
			if !truncate {
				return Err(IoError::BufferTooSmall {
					needed: self.bytes.len(),
					capacity: dest.len(),
				});
			}
			let n = dest.len();
			dest.copy_from_slice(&self.bytes[..n]);
			self.bytes.drain(..n);
			return Ok(n);
		}

		let n = self.bytes.len();
		dest[..n].copy_from_slice(&self.bytes);
		self.bytes.clear();
		Ok(n)
	}

	/// Moves the whole cache onto the end of `out`. Returns the count moved.
	pub fn drain_into(&mut self, out: &mut Vec<u8>) -> usize {
		let n = self.bytes.len();
		out.append(&mut self.bytes);
		n
	}
}
