use crate::callback::{CallbackKind, CallbackReturn, CallbackTable};
use crate::dos_info_block::{init_swappable_data_area, DosInfoBlock};
use crate::dos_layout::*;
use crate::dos_memory::DosPrivateAllocator;
use crate::error::Error;
use crate::memory::{GuestMemory, RealPtr};

use log::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MachineType {
	Ibm,
	/// Japanese AX architecture.
	Ax,
	/// Toshiba J-3100.
	J3,
	/// IBM DOS/V double byte mode.
	DosV,
}

impl Default for MachineType {
	fn default() -> MachineType {
		MachineType::Ibm
	}
}

impl MachineType {
	pub fn is_japanese(&self) -> bool {
		match self {
			MachineType::J3 | MachineType::DosV => true,
			_ => false,
		}
	}

	pub fn is_ax_family(&self) -> bool {
		*self == MachineType::Ax || self.is_japanese()
	}

	pub fn default_code_page(&self) -> u16 {
		if self.is_ax_family() { 932 } else { 437 }
	}

	pub fn country_code(&self) -> u16 {
		if self.is_ax_family() { 81 } else { 1 }
	}
}

impl std::str::FromStr for MachineType {
	type Err = String;

	fn from_str(name: &str) -> Result<MachineType, String> {
		match name.to_ascii_lowercase().as_str() {
			"ibm" | "vga" => Ok(MachineType::Ibm),
			"ax" | "jega" => Ok(MachineType::Ax),
			"j3" | "j3100" => Ok(MachineType::J3),
			"dosv" => Ok(MachineType::DosV),
			_ => Err(format!("Unknown machine type: {}", name)),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DosTablesConfig {
	pub machine_type: MachineType,
	/// Installs the double byte lead table even on an IBM machine (for AX software).
	pub set_ax_enabled: bool,
	pub code_page: u16,
}

impl Default for DosTablesConfig {
	fn default() -> DosTablesConfig {
		DosTablesConfig::for_machine(MachineType::default())
	}
}

impl DosTablesConfig {
	pub fn for_machine(machine_type: MachineType) -> DosTablesConfig {
		DosTablesConfig {
			machine_type,
			set_ax_enabled: false,
			code_page: machine_type.default_code_page(),
		}
	}
}

/// Where everything ended up. The INT 21h handlers look the tables up from here.
#[derive(Debug, Clone, PartialEq)]
pub struct DosTables {
	pub info_block: DosInfoBlock,
	pub mediaid: RealPtr,
	pub tempdta: RealPtr,
	pub tempdta_fcbdelete: RealPtr,
	pub dbcs: RealPtr,
	pub filenamechar: RealPtr,
	pub collatingseq: RealPtr,
	pub upcase: RealPtr,
	pub fcb_sft: RealPtr,
	pub dpb: u16,
	pub dcp: u16,
	pub disk_buffer_head: RealPtr,
	pub country_seg: u16,
	pub casemap: RealPtr,
	pub lfn_dta_seg: u16,
	pub con_driver_seg: Option<u16>,
	pub win_startup_info_seg: Option<u16>,
}

// http://www.ctyme.com/intr/rb-2773.htm
static COUNTRY_INFO: [u8; 0x22] = [
	/* Date format      */ 0x00, 0x00,
	/* Currency string  */ 0x24, 0x00, 0x00, 0x00, 0x00,
	/* Thousands sep    */ 0x2c, 0x00,
	/* Decimal sep      */ 0x2e, 0x00,
	/* Date sep         */ 0x2d, 0x00,
	/* Time sep         */ 0x3a, 0x00,
	/* Currency format  */ 0x00,
	/* Digits after dec */ 0x02,
	/* Time format      */ 0x00,
	/* Casemap          */ 0x00, 0x00, 0x00, 0x00,
	/* Data sep         */ 0x2c, 0x00,
	/* Reserved         */ 0x00, 0x00, 0x00, 0x00, 0x00,
	/* Reserved         */ 0x00, 0x00, 0x00, 0x00, 0x00,
];
const COUNTRY_INFO_OFS: u16 = 7;
const COUNTRY_CASEMAP_OFS: u16 = COUNTRY_INFO_OFS + 0x12;

// Characters that end a file name, after the permitted/excluded ranges.
static FILENAME_SEPARATORS: [u8; 14] = [
	b'.', b'"', b'/', b'\\', b'[', b']', b':', b'|', b'<', b'>', b'+', b'=', b';', b',',
];

// Shift-JIS lead byte ranges, zero terminated.
static DBCS_LEAD_RANGES: [u8; 6] = [0x81, 0x9f, 0xe0, 0xfc, 0x00, 0x00];

// Guest code of the $IBMADSP strategy routine: or word ptr es:[bx+03],0100h
static IBMADSP_STRATEGY: [u8; 6] = [0x26, 0x81, 0x4f, 0x03, 0x00, 0x01];

const COLLATING_ENTRIES: u16 = 0x100;
const UPCASE_ENTRIES: u16 = 0x80;
const SFT_FCB_FILES: u16 = 100;
const DOS_BUFFERS: u16 = 50;

fn dos_casemap_func(_memory: &mut GuestMemory) -> CallbackReturn {
	trace!("Case map routine called");
	CallbackReturn::None
}

/// Lays the fixed kernel tables out in guest memory.
///
/// This is the boot time counterpart of the INT 21h handlers: it has to run once before any of them
/// do. Running out of private memory here means DOS can't boot, so the error should end the session.
pub fn setup_tables(memory: &mut GuestMemory, allocator: &mut DosPrivateAllocator, callbacks: &mut CallbackTable, config: &DosTablesConfig) -> Result<DosTables, Error> {
	let machine = config.machine_type;
	debug!("Setting up DOS tables for {:?} (code page {})", machine, config.code_page);

	let mediaid = RealPtr::from_segment(allocator.get_memory(4)?);
	let tempdta = RealPtr::from_segment(allocator.get_memory(4)?);
	let tempdta_fcbdelete = RealPtr::from_segment(allocator.get_memory(4)?);
	for drive in 0..DOS_DRIVES {
		memory.poke_u16(mediaid.physical() + drive as u32 * 2, 0);
	}

	let info_block = DosInfoBlock::set_location(memory, DOS_INFOBLOCK_SEG);
	init_swappable_data_area(memory, dos_sda());

	// Some programs look for these to detect more than 20 open files.
	for offset in [0x0a, 0x1a, 0x2a].iter() {
		memory.real_write_u32(DOS_CONSTRING_SEG, *offset, 0x204e4f43);
	}

	let mut con_driver_seg = None;
	let mut win_startup_info_seg = None;
	if machine.is_japanese() {
		let seg = setup_ibmadsp_driver(memory, allocator)?;
		win_startup_info_seg = Some(setup_win_startup_info(memory, allocator)?);
		info_block.set_device_chain_start(memory, RealPtr::from_segment(seg));
		con_driver_seg = Some(seg);
	}

	let seg = DOS_CONDRV_SEG;
	memory.real_write_u32(seg, 0x00, 0xffffffff); // next ptr
	memory.real_write_u16(seg, 0x04, 0x8013); // attributes
	memory.real_write_u32(seg, 0x06, 0xffffffff); // strategy routine
	memory.real_write_u32(seg, 0x0a, 0x204e4f43); // driver name
	memory.real_write_u32(seg, 0x0e, 0x20202020); // driver name
	if !machine.is_japanese() {
		info_block.set_device_chain_start(memory, RealPtr::from_segment(seg));
	}

	// C:\
	memory.real_write_u32(DOS_CDS_SEG, 0x00, 0x005c3a43);
	info_block.set_cur_dir_struct(memory, RealPtr::from_segment(DOS_CDS_SEG));

	let dbcs = dos_dbcs_table();
	if config.set_ax_enabled || machine.is_japanese() {
		memory.poke_u16(dbcs.physical(), DBCS_LEAD_RANGES.len() as u16);
		memory.write_block(dbcs.physical() + 2, &DBCS_LEAD_RANGES);
	} else {
		memory.poke_u32(dbcs.physical(), 0);
	}

	let filenamechar = RealPtr::from_segment(allocator.get_memory(2)?);
	write_filename_char_table(memory, filenamechar);

	// 2 + 256 bytes of collating sequence, then 2 + 128 bytes of upper case table.
	let collatingseq = RealPtr::from_segment(allocator.get_memory(25)?);
	memory.poke_u16(collatingseq.physical(), COLLATING_ENTRIES);
	for i in 0..COLLATING_ENTRIES as u32 {
		memory.poke_u8(collatingseq.physical() + 2 + i, i as u8);
	}
	let upcase = collatingseq.add_offset(2 + COLLATING_ENTRIES);
	memory.poke_u16(upcase.physical(), UPCASE_ENTRIES);
	for i in 0..UPCASE_ENTRIES as u32 {
		memory.poke_u8(upcase.physical() + 2 + i, (0x80 + i) as u8);
	}

	let fcb_sft = RealPtr::from_segment(allocator.get_memory(4)?);
	memory.real_write_u32(fcb_sft.segment, 0, 0xffffffff); // last file table
	memory.real_write_u16(fcb_sft.segment, 4, SFT_FCB_FILES);
	info_block.set_fcb_table(memory, fcb_sft);

	// Each drive's DPB just carries its drive number.
	let dpb = allocator.get_memory(2)?;
	for drive in 0..DOS_DRIVES {
		memory.real_write_u8(dpb, drive, drive as u8);
	}

	let dcp = allocator.get_memory(3)?;

	let disk_buffer_head = RealPtr::from_segment(allocator.get_memory(6)?);
	let seg = disk_buffer_head.segment;
	memory.fill(disk_buffer_head.physical(), 0x20, 0);
	memory.real_write_u16(seg, 0x00, 0xffff); // forward ptr
	memory.real_write_u16(seg, 0x02, 0xffff); // backward ptr
	memory.real_write_u8(seg, 0x04, 0xff); // not in use
	memory.real_write_u8(seg, 0x0a, 0x01); // number of FATs
	memory.real_write_u32(seg, 0x0d, 0xffffffff); // pointer to DPB
	info_block.set_disk_buffer_head(memory, disk_buffer_head);

	info_block.set_buffers(memory, DOS_BUFFERS, DOS_BUFFERS);

	// INT 21h/38h hands programs this routine through the country info.
	let casemap_number = callbacks.allocate()?;
	let casemap = callbacks.setup(casemap_number, dos_casemap_func, CallbackKind::Retf, "DOS CaseMap", memory)?;

	let country_seg = allocator.get_memory(3)?;
	write_country_info(memory, country_seg, casemap, config);

	let lfn_dta_seg = allocator.get_memory(8)?;

	let tables = DosTables {
		info_block,
		mediaid,
		tempdta,
		tempdta_fcbdelete,
		dbcs,
		filenamechar,
		collatingseq,
		upcase,
		fcb_sft,
		dpb,
		dcp,
		disk_buffer_head,
		country_seg,
		casemap,
		lfn_dta_seg,
		con_driver_seg,
		win_startup_info_seg,
	};
	debug!("DOS tables ready, private memory continues at 0x{:04x}", allocator.next_segment());
	Ok(tables)
}

// Console driver the Japanese DOS versions chain in front of CON.
fn setup_ibmadsp_driver(memory: &mut GuestMemory, allocator: &mut DosPrivateAllocator) -> Result<u16, Error> {
	let seg = allocator.get_memory(2)?;
	memory.real_write_u16(seg, 0x00, 0x0000); // next ptr
	memory.real_write_u16(seg, 0x02, DOS_CONDRV_SEG);
	memory.real_write_u16(seg, 0x04, 0xc000); // attributes
	memory.real_write_u16(seg, 0x06, 0x0018); // strategy routine
	memory.real_write_u16(seg, 0x08, 0x001e); // interrupt routine
	memory.real_write_u32(seg, 0x0a, 0x4d424924); // "$IBM"
	memory.real_write_u32(seg, 0x0e, 0x50534441); // "ADSP"
	memory.write_block(RealPtr::new(seg, 0x18).physical(), &IBMADSP_STRATEGY);
	memory.real_write_u8(seg, 0x1e, 0xcb); // retf
	Ok(seg)
}

// Japanese Windows 3.1 in enhanced mode refuses to start without one of these.
fn setup_win_startup_info(memory: &mut GuestMemory, allocator: &mut DosPrivateAllocator) -> Result<u16, Error> {
	let seg = allocator.get_memory(2)?;
	memory.real_write_u16(seg, 0x00, 0x03); // version major
	memory.real_write_u16(seg, 0x01, 0x00); // version minor
	memory.real_write_u32(seg, 0x02, 0); // next startup information
	memory.real_write_u32(seg, 0x06, 0); // virtual device name
	memory.real_write_u32(seg, 0x0a, 0); // virtual device reference data
	memory.real_write_u16(seg, 0x0e, 0x0012); // instance data record
	memory.real_write_u16(seg, 0x10, seg);
	memory.real_write_u16(seg, 0x12, 0x001c); // instance data
	memory.real_write_u16(seg, 0x14, seg);
	memory.real_write_u16(seg, 0x16, 0x0004); // instance data size
	memory.real_write_u32(seg, 0x18, 0); // end of instance table
	memory.real_write_u32(seg, 0x1c, 0);
	Ok(seg)
}

// http://www.ctyme.com/intr/rb-3163.htm
fn write_filename_char_table(memory: &mut GuestMemory, table: RealPtr) {
	let addr = table.physical();
	memory.poke_u16(addr, 0x16);
	memory.write_block(addr + 2, &[
		0x01,
		0x00, 0xff, // permitted characters
		0x00,
		0x00, 0x20, // excluded characters
		0x02,
		FILENAME_SEPARATORS.len() as u8,
	]);
	memory.write_block(addr + 0x0a, &FILENAME_SEPARATORS);
}

fn write_country_info(memory: &mut GuestMemory, seg: u16, casemap: RealPtr, config: &DosTablesConfig) {
	memory.write_block(RealPtr::new(seg, COUNTRY_INFO_OFS).physical(), &COUNTRY_INFO);
	memory.real_write_u8(seg, 0, 1); // info id
	memory.real_write_u16(seg, 1, 0x26); // size
	memory.real_write_u16(seg, 3, config.machine_type.country_code());
	memory.real_write_u16(seg, 5, config.code_page);
	memory.real_write_ptr(seg, COUNTRY_CASEMAP_OFS, casemap);
	if config.machine_type.is_ax_family() {
		memory.real_write_u16(seg, 0x07, 2); // Y-M-D
		memory.real_write_u8(seg, 0x09, 0x5c); // yen
		memory.real_write_u8(seg, 0x17, 0); // no decimals
		memory.real_write_u8(seg, 0x18, 1); // 24 hour clock
	}
}
