use crate::dos_layout::{DOS_DRIVES, DOS_MEM_START};
use crate::memory::{GuestMemory, RealPtr};

// http://www.ctyme.com/intr/rb-2983.htm
// Offsets are from the start of the block; the list of lists pointer is at +0x26.
const DIB_MAGIC_WORD: u16 = 0x04;
const DIB_COUNT_LRU_CACHE: u16 = 0x10;
const DIB_COUNT_LRU_OPENS: u16 = 0x12;
const DIB_SHARING_COUNT: u16 = 0x1a;
const DIB_SHARING_DELAY: u16 = 0x1c;
const DIB_DISK_BUFFER_PTR: u16 = 0x1e;
const DIB_CON_INPUT_PTR: u16 = 0x22;
const DIB_FIRST_MCB: u16 = 0x24;
const DIB_FIRST_DPB: u16 = 0x26;
const DIB_FIRST_FILE_TABLE: u16 = 0x2a;
const DIB_ACTIVE_CLOCK: u16 = 0x2e;
const DIB_ACTIVE_CON: u16 = 0x32;
const DIB_MAX_SECTOR_LENGTH: u16 = 0x36;
const DIB_DISK_INFO_BUFFER: u16 = 0x38;
const DIB_CUR_DIR_STRUCTURE: u16 = 0x3c;
const DIB_FCB_TABLE: u16 = 0x40;
const DIB_PROT_FCBS: u16 = 0x44;
const DIB_BLOCK_DEVICES: u16 = 0x46;
const DIB_LAST_DRIVE: u16 = 0x47;
const DIB_NUL_NEXT_DRIVER: u16 = 0x48;
const DIB_NUL_ATTRIBUTES: u16 = 0x4c;
const DIB_NUL_STRATEGY: u16 = 0x4e;
const DIB_NUL_STRING: u16 = 0x52;
const DIB_JOINED_DRIVES: u16 = 0x5a;
const DIB_SPECIAL_CODE_SEG: u16 = 0x5b;
const DIB_SETVER_PTR: u16 = 0x5d;
const DIB_A20_FIX_OFS: u16 = 0x61;
const DIB_PSP_LAST_IF_HMA: u16 = 0x63;
const DIB_BUFFERS_X: u16 = 0x65;
const DIB_BUFFERS_Y: u16 = 0x67;
const DIB_BOOT_DRIVE: u16 = 0x69;
const DIB_USE_DWORD_MOV: u16 = 0x6a;
const DIB_EXTENDED_SIZE: u16 = 0x6b;
const DIB_DISK_BUFFER_HEAD: u16 = 0x6d;
const DIB_DIRTY_DISK_BUFFERS: u16 = 0x71;
const DIB_LOOKAHEAD_BUF_PTR: u16 = 0x73;
const DIB_LOOKAHEAD_BUF_NUMBER: u16 = 0x77;
const DIB_BUFFER_LOCATION: u16 = 0x79;
const DIB_WORKING_BUFFER: u16 = 0x7a;
const DIB_MIN_MEM_FOR_EXEC: u16 = 0x7e;
const DIB_MEM_ALLOC_SCAN_START: u16 = 0x80;
const DIB_START_OF_UMB_CHAIN: u16 = 0x82;
const DIB_CHAINING_UMB: u16 = 0x84;
const DIB_BYTES: usize = 0x90;

/// The DOS info block, better known by the list of lists pointer into it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DosInfoBlock {
	segment: u16,
}

impl DosInfoBlock {
	/// Places the block at `segment` and fills in the values a freshly booted DOS reports.
	pub fn set_location(memory: &mut GuestMemory, segment: u16) -> DosInfoBlock {
		let block = DosInfoBlock { segment };
		memory.fill(RealPtr::from_segment(segment).physical(), DIB_BYTES, 0);

		block.write_u16(memory, DIB_MAGIC_WORD, 0x0001);
		block.write_u16(memory, DIB_COUNT_LRU_CACHE, 0x00ff);
		block.write_u16(memory, DIB_COUNT_LRU_OPENS, 0x00ff);
		block.write_u16(memory, DIB_SHARING_COUNT, 1);
		block.write_u16(memory, DIB_SHARING_DELAY, 1);
		block.write_u32(memory, DIB_DISK_BUFFER_PTR, 0);
		block.write_u16(memory, DIB_CON_INPUT_PTR, 0);
		block.write_u16(memory, DIB_FIRST_MCB, DOS_MEM_START);
		block.write_u32(memory, DIB_FIRST_DPB, 0);
		block.write_u32(memory, DIB_FIRST_FILE_TABLE, 0);
		block.write_u32(memory, DIB_ACTIVE_CLOCK, 0);
		block.write_u32(memory, DIB_ACTIVE_CON, 0);
		block.write_u16(memory, DIB_MAX_SECTOR_LENGTH, 0x200);
		block.write_u32(memory, DIB_DISK_INFO_BUFFER, 0);
		block.write_u32(memory, DIB_CUR_DIR_STRUCTURE, 0);
		block.write_u32(memory, DIB_FCB_TABLE, 0);
		block.write_u16(memory, DIB_PROT_FCBS, 0);
		block.write_u8(memory, DIB_BLOCK_DEVICES, 0);
		block.write_u8(memory, DIB_LAST_DRIVE, DOS_DRIVES as u8);

		// The NUL device header is embedded in the block and heads the driver chain.
		block.write_u32(memory, DIB_NUL_NEXT_DRIVER, 0xffffffff);
		block.write_u16(memory, DIB_NUL_ATTRIBUTES, 0x8004);
		block.write_u32(memory, DIB_NUL_STRATEGY, 0);
		let nul_addr = block.location().add_offset(DIB_NUL_STRING).physical();
		memory.write_block(nul_addr, b"NUL     ");

		block.write_u8(memory, DIB_JOINED_DRIVES, 0);
		block.write_u16(memory, DIB_SPECIAL_CODE_SEG, 0);
		block.write_u32(memory, DIB_SETVER_PTR, 0);
		block.write_u16(memory, DIB_A20_FIX_OFS, 0);
		block.write_u16(memory, DIB_PSP_LAST_IF_HMA, 0);
		block.write_u16(memory, DIB_BUFFERS_X, 0);
		block.write_u16(memory, DIB_BUFFERS_Y, 0);
		// Drive C:
		block.write_u8(memory, DIB_BOOT_DRIVE, 3);
		block.write_u8(memory, DIB_USE_DWORD_MOV, 1);
		block.write_u16(memory, DIB_EXTENDED_SIZE, 0);
		block.write_u32(memory, DIB_DISK_BUFFER_HEAD, 0);
		block.write_u16(memory, DIB_DIRTY_DISK_BUFFERS, 0);
		block.write_u32(memory, DIB_LOOKAHEAD_BUF_PTR, 0);
		block.write_u16(memory, DIB_LOOKAHEAD_BUF_NUMBER, 0);
		block.write_u8(memory, DIB_BUFFER_LOCATION, 0);
		block.write_u32(memory, DIB_WORKING_BUFFER, 0);
		block.write_u16(memory, DIB_MIN_MEM_FOR_EXEC, 0);
		block.write_u16(memory, DIB_MEM_ALLOC_SCAN_START, DOS_MEM_START);
		block.write_u16(memory, DIB_START_OF_UMB_CHAIN, 0xffff);
		block.write_u8(memory, DIB_CHAINING_UMB, 0);

		block
	}

	pub fn location(&self) -> RealPtr {
		RealPtr::from_segment(self.segment)
	}

	pub fn list_of_lists(&self) -> RealPtr {
		RealPtr::new(self.segment, DIB_FIRST_DPB)
	}

	pub fn set_device_chain_start(&self, memory: &mut GuestMemory, ptr: RealPtr) {
		memory.real_write_ptr(self.segment, DIB_NUL_NEXT_DRIVER, ptr);
	}

	pub fn device_chain_start(&self, memory: &GuestMemory) -> RealPtr {
		memory.real_read_ptr(self.segment, DIB_NUL_NEXT_DRIVER)
	}

	pub fn set_cur_dir_struct(&self, memory: &mut GuestMemory, ptr: RealPtr) {
		memory.real_write_ptr(self.segment, DIB_CUR_DIR_STRUCTURE, ptr);
	}

	pub fn cur_dir_struct(&self, memory: &GuestMemory) -> RealPtr {
		memory.real_read_ptr(self.segment, DIB_CUR_DIR_STRUCTURE)
	}

	pub fn set_fcb_table(&self, memory: &mut GuestMemory, ptr: RealPtr) {
		memory.real_write_ptr(self.segment, DIB_FCB_TABLE, ptr);
	}

	pub fn fcb_table(&self, memory: &GuestMemory) -> RealPtr {
		memory.real_read_ptr(self.segment, DIB_FCB_TABLE)
	}

	pub fn set_disk_buffer_head(&self, memory: &mut GuestMemory, ptr: RealPtr) {
		memory.real_write_ptr(self.segment, DIB_DISK_BUFFER_HEAD, ptr);
	}

	pub fn disk_buffer_head(&self, memory: &GuestMemory) -> RealPtr {
		memory.real_read_ptr(self.segment, DIB_DISK_BUFFER_HEAD)
	}

	pub fn set_buffers(&self, memory: &mut GuestMemory, x: u16, y: u16) {
		self.write_u16(memory, DIB_BUFFERS_X, x);
		self.write_u16(memory, DIB_BUFFERS_Y, y);
	}

	pub fn buffers(&self, memory: &GuestMemory) -> (u16, u16) {
		(memory.real_read_u16(self.segment, DIB_BUFFERS_X), memory.real_read_u16(self.segment, DIB_BUFFERS_Y))
	}

	fn write_u8(&self, memory: &mut GuestMemory, offset: u16, value: u8) {
		memory.real_write_u8(self.segment, offset, value);
	}

	fn write_u16(&self, memory: &mut GuestMemory, offset: u16, value: u16) {
		memory.real_write_u16(self.segment, offset, value);
	}

	fn write_u32(&self, memory: &mut GuestMemory, offset: u16, value: u32) {
		memory.real_write_u32(self.segment, offset, value);
	}
}

// Swappable data area. Only the fields the kernel touches before the first program runs.
const SDA_BYTES: usize = 0x1a;
const SDA_DRIVE_CRIT_ERROR: u16 = 0x02;

pub fn init_swappable_data_area(memory: &mut GuestMemory, location: RealPtr) {
	memory.fill(location.physical(), SDA_BYTES, 0);
	memory.real_write_u8(location.segment, location.offset + SDA_DRIVE_CRIT_ERROR, 0xff);
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::dos_layout::{dos_sda, DOS_INFOBLOCK_SEG};

	#[test] fn test_info_block_defaults() {
		let mut memory = GuestMemory::new();
		let block = DosInfoBlock::set_location(&mut memory, DOS_INFOBLOCK_SEG);
		assert_eq!(block.list_of_lists(), RealPtr::new(0x80, 0x26));
		assert_eq!(memory.real_read_u16(0x80, 0x04), 1);
		assert_eq!(memory.real_read_u16(0x80, 0x24), DOS_MEM_START);
		assert_eq!(memory.real_read_u8(0x80, 0x47), 26);
		assert_eq!(memory.real_read_u16(0x80, 0x4c), 0x8004);
		let mut nul = [0u8; 8];
		memory.read_block(block.location().add_offset(0x52).physical(), &mut nul);
		assert_eq!(&nul, b"NUL     ");
		assert_eq!(block.device_chain_start(&memory), RealPtr::from_dword(0xffffffff));
	}

	#[test] fn test_info_block_setters() {
		let mut memory = GuestMemory::new();
		let block = DosInfoBlock::set_location(&mut memory, DOS_INFOBLOCK_SEG);
		block.set_cur_dir_struct(&mut memory, RealPtr::from_segment(0x108));
		block.set_fcb_table(&mut memory, RealPtr::from_segment(0xc820));
		block.set_disk_buffer_head(&mut memory, RealPtr::from_segment(0xc830));
		block.set_device_chain_start(&mut memory, RealPtr::from_segment(0xa0));
		block.set_buffers(&mut memory, 50, 50);
		assert_eq!(block.cur_dir_struct(&memory), RealPtr::from_segment(0x108));
		assert_eq!(block.fcb_table(&memory), RealPtr::from_segment(0xc820));
		assert_eq!(block.disk_buffer_head(&memory), RealPtr::from_segment(0xc830));
		assert_eq!(block.device_chain_start(&memory), RealPtr::from_segment(0xa0));
		assert_eq!(block.buffers(&memory), (50, 50));
		assert_eq!(memory.real_read_u32(0x80, 0x40), 0xc820_0000);
	}

	#[test] fn test_sda_init() {
		let mut memory = GuestMemory::new();
		memory.fill(dos_sda().physical(), 0x20, 0x55);
		init_swappable_data_area(&mut memory, dos_sda());
		assert_eq!(memory.real_read_u8(0xb2, 0x00), 0);
		assert_eq!(memory.real_read_u8(0xb2, 0x02), 0xff);
		assert_eq!(memory.real_read_u8(0xb2, 0x19), 0);
		assert_eq!(memory.real_read_u8(0xb2, 0x1a), 0x55);
	}
}
