use crate::memory::RealPtr;

// Fixed low memory segments used by the DOS kernel structures.
// http://www.ctyme.com/intr/rb-2983.htm (list of lists)
pub const DOS_INFOBLOCK_SEG: u16 = 0x80;
pub const DOS_CONDRV_SEG: u16 = 0xa0;
pub const DOS_CONSTRING_SEG: u16 = 0xa8;
pub const DOS_SDA_SEG: u16 = 0xb2;
pub const DOS_SDA_OFS: u16 = 0;
pub const DOS_CDS_SEG: u16 = 0x108;
// First memory control block.
pub const DOS_MEM_START: u16 = 0x158;

// Internal tables are carved out of this range.
pub const DOS_PRIVATE_SEGMENT: u16 = 0xc800;
pub const DOS_PRIVATE_SEGMENT_END: u16 = 0xd000;

pub const DOS_DRIVES: u16 = 26;

pub const fn dos_sda() -> RealPtr {
	RealPtr::new(DOS_SDA_SEG, DOS_SDA_OFS)
}

// The DBCS lead byte table sits in the paragraph just under the first MCB. Windows 3.1 falls back to English mode
// if it is any higher.
pub const fn dos_dbcs_table() -> RealPtr {
	RealPtr::from_segment(DOS_MEM_START - 1)
}
