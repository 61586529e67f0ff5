/// Fixed-capacity staging buffer for one raw receive.
///
/// Allocated once with the socket and freed with it. Every receive starts from
/// [`ScratchBuffer::prepare`], which zero-fills the whole buffer so bytes from
/// an earlier receive can never leak into a later one.
#[derive(Debug)]
pub(crate) struct ScratchBuffer {
	buf: Box<[u8]>,
}

impl ScratchBuffer {
	pub(crate) fn new(capacity: usize) -> Self {
		Self { buf: vec![0u8; capacity].into_boxed_slice() }
	}

	#[inline]
	pub(crate) fn capacity(&self) -> usize {
		self.buf.len()
	}

	/// Zero-fills and hands out the whole buffer as a receive target.
	pub(crate) fn prepare(&mut self) -> &mut [u8] {
		self.buf.fill(0);
		&mut self.buf
	}

	/// The first `n` bytes written by the last receive.
	pub(crate) fn filled(&self, n: usize) -> &[u8] {
		&self.buf[..n.min(self.buf.len())]
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn prepare_clears_stale_bytes() {
		let mut scratch = ScratchBuffer::new(8);
		scratch.prepare().copy_from_slice(b"stalebuf");
		assert_eq!(scratch.filled(5), b"stale");

		let target = scratch.prepare();
		assert!(target.iter().all(|&b| b == 0));
		assert_eq!(target.len(), 8);
	}

	#[test]
	fn filled_is_bounded_by_capacity() {
		let scratch = ScratchBuffer::new(4);
		assert_eq!(scratch.filled(100).len(), 4);
		assert_eq!(scratch.capacity(), 4);
	}
}
