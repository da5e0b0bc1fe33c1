use crate::dos_layout::{DOS_PRIVATE_SEGMENT, DOS_PRIVATE_SEGMENT_END};
use crate::error::Error;

use log::debug;

/// Hands out paragraphs from the DOS private segment. The cursor only ever moves forwards: the
/// tables are laid out once during boot and are never freed.
#[derive(Debug, Clone, PartialEq)]
pub struct DosPrivateAllocator {
	next_segment: u16,
	end_segment: u16,
}

impl Default for DosPrivateAllocator {
	fn default() -> DosPrivateAllocator {
		DosPrivateAllocator::new()
	}
}

impl DosPrivateAllocator {
	pub fn new() -> DosPrivateAllocator {
		DosPrivateAllocator::with_bounds(DOS_PRIVATE_SEGMENT, DOS_PRIVATE_SEGMENT_END)
	}

	pub fn with_bounds(start_segment: u16, end_segment: u16) -> DosPrivateAllocator {
		DosPrivateAllocator {
			next_segment: start_segment,
			end_segment,
		}
	}

	/// Returns the segment of `pages` fresh paragraphs.
	pub fn get_memory(&mut self, pages: u16) -> Result<u16, Error> {
		// The last paragraph before the end is never handed out.
		if pages as u32 + self.next_segment as u32 >= self.end_segment as u32 {
			return Err(Error::OutOfTableMemory {
				requested: pages,
				segment: self.next_segment,
				limit: self.end_segment,
			});
		}
		let segment = self.next_segment;
		self.next_segment += pages;
		debug!("DOS private memory: {} paragraphs at 0x{:04x}", pages, segment);
		Ok(segment)
	}

	pub fn next_segment(&self) -> u16 {
		self.next_segment
	}

	/// Paragraphs that can still be requested in one go.
	pub fn remaining_pages(&self) -> u16 {
		self.end_segment.saturating_sub(self.next_segment).saturating_sub(1)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test] fn test_allocations_are_increasing_and_disjoint() {
		let mut allocator = DosPrivateAllocator::new();
		let requests = [4u16, 4, 4, 2, 25, 4, 2, 3, 6, 3, 8];
		let mut previous_end = DOS_PRIVATE_SEGMENT;
		for pages in requests.iter() {
			let segment = allocator.get_memory(*pages).unwrap();
			assert_eq!(segment, previous_end);
			previous_end = segment + pages;
		}
		assert_eq!(allocator.next_segment(), previous_end);
	}

	#[test] fn test_overflow_is_reported() {
		let mut allocator = DosPrivateAllocator::with_bounds(0x100, 0x110);
		assert_eq!(allocator.remaining_pages(), 0xf);
		assert_eq!(allocator.get_memory(8).unwrap(), 0x100);
		// 0x108 + 8 reaches the bound, which is already too far.
		match allocator.get_memory(8) {
			Err(Error::OutOfTableMemory { requested, segment, limit }) => {
				assert_eq!((requested, segment, limit), (8, 0x108, 0x110));
			}
			other => panic!("expected overflow, got {:?}", other),
		}
		// A failed request doesn't move the cursor.
		assert_eq!(allocator.next_segment(), 0x108);
		assert_eq!(allocator.get_memory(7).unwrap(), 0x108);
		assert_eq!(allocator.remaining_pages(), 0);
	}

	#[test] fn test_whole_private_segment_cannot_be_taken() {
		let mut allocator = DosPrivateAllocator::new();
		let capacity = DOS_PRIVATE_SEGMENT_END - DOS_PRIVATE_SEGMENT;
		assert!(allocator.get_memory(capacity).is_err());
		assert_eq!(allocator.get_memory(capacity - 1).unwrap(), DOS_PRIVATE_SEGMENT);
		assert!(allocator.get_memory(1).is_err());
	}
}
