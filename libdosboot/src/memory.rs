use byteorder::{ByteOrder, LittleEndian};

// Conventional memory plus the high memory area just above 1MB.
pub const GUEST_MEMORY_BYTES: usize = 0x10_0000 + 0x1_0000;

/// A real mode segment:offset pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RealPtr {
	pub segment: u16,
	pub offset: u16,
}

impl RealPtr {
	pub const fn new(segment: u16, offset: u16) -> RealPtr {
		RealPtr { segment, offset }
	}

	pub const fn from_segment(segment: u16) -> RealPtr {
		RealPtr { segment, offset: 0 }
	}

	/// Unpacks a DOS far pointer dword (segment in the high word).
	pub const fn from_dword(value: u32) -> RealPtr {
		RealPtr { segment: (value >> 16) as u16, offset: (value & 0xffff) as u16 }
	}

	pub const fn to_dword(self) -> u32 {
		((self.segment as u32) << 16) | self.offset as u32
	}

	pub const fn physical(self) -> u32 {
		((self.segment as u32) << 4) + self.offset as u32
	}

	/// Moves the offset forward, wrapping within the segment like the 16 bit offset register does.
	pub const fn add_offset(self, bytes: u16) -> RealPtr {
		RealPtr { segment: self.segment, offset: self.offset.wrapping_add(bytes) }
	}
}

impl std::fmt::Display for RealPtr {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "{:04x}:{:04x}", self.segment, self.offset)
	}
}

/// The flat emulated address space. Addresses past the end wrap back to zero.
#[derive(Clone)]
pub struct GuestMemory {
	bytes: Vec<u8>,
}

impl std::fmt::Debug for GuestMemory {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		f.debug_struct("GuestMemory").field("len", &self.bytes.len()).finish()
	}
}

impl Default for GuestMemory {
	fn default() -> GuestMemory {
		GuestMemory::new()
	}
}

impl GuestMemory {
	pub fn new() -> GuestMemory {
		GuestMemory { bytes: vec![0; GUEST_MEMORY_BYTES] }
	}

	fn index(&self, addr: u32) -> usize {
		addr as usize % self.bytes.len()
	}

	pub fn peek_u8(&self, addr: u32) -> u8 {
		self.bytes[self.index(addr)]
	}

	pub fn poke_u8(&mut self, addr: u32, value: u8) {
		let index = self.index(addr);
		self.bytes[index] = value;
	}

	pub fn peek_u16(&self, addr: u32) -> u16 {
		let mut buf = [0u8; 2];
		self.read_block(addr, &mut buf);
		LittleEndian::read_u16(&buf)
	}

	pub fn poke_u16(&mut self, addr: u32, value: u16) {
		let mut buf = [0u8; 2];
		LittleEndian::write_u16(&mut buf, value);
		self.write_block(addr, &buf);
	}

	pub fn peek_u32(&self, addr: u32) -> u32 {
		let mut buf = [0u8; 4];
		self.read_block(addr, &mut buf);
		LittleEndian::read_u32(&buf)
	}

	pub fn poke_u32(&mut self, addr: u32, value: u32) {
		let mut buf = [0u8; 4];
		LittleEndian::write_u32(&mut buf, value);
		self.write_block(addr, &buf);
	}

	pub fn read_block(&self, addr: u32, destination: &mut [u8]) {
		for (i, byte) in destination.iter_mut().enumerate() {
			*byte = self.peek_u8(addr.wrapping_add(i as u32));
		}
	}

	pub fn write_block(&mut self, addr: u32, data: &[u8]) {
		for (i, byte) in data.iter().enumerate() {
			self.poke_u8(addr.wrapping_add(i as u32), *byte);
		}
	}

	pub fn fill(&mut self, addr: u32, count: usize, value: u8) {
		for i in 0..count {
			self.poke_u8(addr.wrapping_add(i as u32), value);
		}
	}

	// Segment:offset forms of the above, used when laying out the DOS structures.

	pub fn real_read_u8(&self, segment: u16, offset: u16) -> u8 {
		self.peek_u8(RealPtr::new(segment, offset).physical())
	}

	pub fn real_write_u8(&mut self, segment: u16, offset: u16, value: u8) {
		self.poke_u8(RealPtr::new(segment, offset).physical(), value);
	}

	pub fn real_read_u16(&self, segment: u16, offset: u16) -> u16 {
		self.peek_u16(RealPtr::new(segment, offset).physical())
	}

	pub fn real_write_u16(&mut self, segment: u16, offset: u16, value: u16) {
		self.poke_u16(RealPtr::new(segment, offset).physical(), value);
	}

	pub fn real_read_u32(&self, segment: u16, offset: u16) -> u32 {
		self.peek_u32(RealPtr::new(segment, offset).physical())
	}

	pub fn real_write_u32(&mut self, segment: u16, offset: u16, value: u32) {
		self.poke_u32(RealPtr::new(segment, offset).physical(), value);
	}

	pub fn real_write_ptr(&mut self, segment: u16, offset: u16, ptr: RealPtr) {
		self.real_write_u32(segment, offset, ptr.to_dword());
	}

	pub fn real_read_ptr(&self, segment: u16, offset: u16) -> RealPtr {
		RealPtr::from_dword(self.real_read_u32(segment, offset))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test] fn test_real_ptr_conversions() {
		let ptr = RealPtr::new(0xc800, 0x0102);
		assert_eq!(ptr.physical(), 0xc8102);
		assert_eq!(ptr.to_dword(), 0xc800_0102);
		assert_eq!(RealPtr::from_dword(0xc800_0102), ptr);
		assert_eq!(ptr.add_offset(258), RealPtr::new(0xc800, 0x0204));
		assert_eq!(format!("{}", ptr), "c800:0102");
	}

	#[test] fn test_little_endian_access() {
		let mut memory = GuestMemory::new();
		memory.real_write_u32(0xa8, 0x0a, 0x204e4f43);
		assert_eq!(memory.peek_u8(0xa8a), b'C');
		assert_eq!(memory.peek_u8(0xa8b), b'O');
		assert_eq!(memory.peek_u8(0xa8c), b'N');
		assert_eq!(memory.peek_u8(0xa8d), b' ');
		assert_eq!(memory.real_read_u16(0xa8, 0x0a), 0x4f43);
	}

	#[test] fn test_addresses_wrap() {
		let mut memory = GuestMemory::new();
		let last = (GUEST_MEMORY_BYTES - 1) as u32;
		memory.poke_u16(last, 0xbbaa);
		assert_eq!(memory.peek_u8(last), 0xaa);
		assert_eq!(memory.peek_u8(0), 0xbb);
	}
}
