use crate::error::Error;
use crate::memory::{GuestMemory, RealPtr};

use log::debug;

// Callback stubs live in the BIOS segment, one fixed size slot per callback.
pub const CB_SEG: u16 = 0xf000;
pub const CB_SOFFSET: u16 = 0x1000;
pub const CB_SIZE: u16 = 32;
pub const CB_MAX: u16 = 128;

// GRP 4 with an otherwise invalid modrm byte, followed by the callback number. The CPU traps on it
// and hands the number to CallbackTable::dispatch.
const CALLBACK_OPCODE: [u8; 2] = [0xfe, 0x38];
const RETF_OPCODE: u8 = 0xcb;

/// What the CPU should do once a handler has run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CallbackReturn {
	None,
	Stop,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CallbackKind {
	/// The stub returns with a far return.
	Retf,
}

pub type CallbackHandler = fn(&mut GuestMemory) -> CallbackReturn;

#[derive(Clone)]
struct Callback {
	name: String,
	kind: CallbackKind,
	handler: CallbackHandler,
}

impl std::fmt::Debug for Callback {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		f.debug_struct("Callback").field("name", &self.name).field("kind", &self.kind).finish()
	}
}

/// Native routines reachable from emulated code through small stubs in guest memory.
#[derive(Debug, Clone)]
pub struct CallbackTable {
	slots: Vec<Option<Callback>>,
	allocated: Vec<bool>,
}

impl Default for CallbackTable {
	fn default() -> CallbackTable {
		CallbackTable::new()
	}
}

impl CallbackTable {
	pub fn new() -> CallbackTable {
		let mut allocated = vec![false; CB_MAX as usize];
		// Number 0 is never handed out so a zeroed stub can't look valid.
		allocated[0] = true;
		CallbackTable {
			slots: vec![None; CB_MAX as usize],
			allocated,
		}
	}

	pub fn allocate(&mut self) -> Result<u16, Error> {
		match self.allocated.iter().position(|used| !used) {
			Some(number) => {
				self.allocated[number] = true;
				Ok(number as u16)
			}
			None => Err(Error::NoFreeCallbacks),
		}
	}

	/// Stub location for `number`. Numbers past the table wrap within the segment.
	pub fn real_pointer(number: u16) -> RealPtr {
		RealPtr::new(CB_SEG, CB_SOFFSET.wrapping_add(number.wrapping_mul(CB_SIZE)))
	}

	/// Binds a handler to an allocated number and writes its stub into guest memory.
	pub fn setup(&mut self, number: u16, handler: CallbackHandler, kind: CallbackKind, name: &str, memory: &mut GuestMemory) -> Result<RealPtr, Error> {
		if number == 0 || number >= CB_MAX || !self.allocated[number as usize] {
			return Err(Error::InvalidCallback(number));
		}
		let ptr = CallbackTable::real_pointer(number);
		let mut addr = ptr.physical();
		memory.write_block(addr, &CALLBACK_OPCODE);
		addr += CALLBACK_OPCODE.len() as u32;
		memory.poke_u16(addr, number);
		addr += 2;
		match kind {
			CallbackKind::Retf => memory.poke_u8(addr, RETF_OPCODE),
		}
		self.slots[number as usize] = Some(Callback {
			name: name.to_string(),
			kind,
			handler,
		});
		debug!("Callback {} ({}) installed at {}", number, name, ptr);
		Ok(ptr)
	}

	pub fn name(&self, number: u16) -> Option<&str> {
		self.slots.get(number as usize)
			.and_then(|slot| slot.as_ref())
			.map(|callback| callback.name.as_str())
	}

	pub fn dispatch(&self, number: u16, memory: &mut GuestMemory) -> Result<CallbackReturn, Error> {
		match self.slots.get(number as usize) {
			Some(Some(callback)) => Ok((callback.handler)(memory)),
			_ => Err(Error::UnknownCallback(number)),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn stop_handler(_memory: &mut GuestMemory) -> CallbackReturn {
		CallbackReturn::Stop
	}

	#[test] fn test_allocation_skips_zero() {
		let mut callbacks = CallbackTable::new();
		assert_eq!(callbacks.allocate().unwrap(), 1);
		assert_eq!(callbacks.allocate().unwrap(), 2);
	}

	#[test] fn test_allocation_exhausts() {
		let mut callbacks = CallbackTable::new();
		for _ in 1..CB_MAX {
			callbacks.allocate().unwrap();
		}
		assert!(matches!(callbacks.allocate(), Err(Error::NoFreeCallbacks)));
	}

	#[test] fn test_setup_writes_stub() {
		let mut memory = GuestMemory::new();
		let mut callbacks = CallbackTable::new();
		let number = callbacks.allocate().unwrap();
		let ptr = callbacks.setup(number, stop_handler, CallbackKind::Retf, "Test", &mut memory).unwrap();
		assert_eq!(ptr, RealPtr::new(0xf000, 0x1020));
		let mut stub = [0u8; 5];
		memory.read_block(ptr.physical(), &mut stub);
		assert_eq!(stub, [0xfe, 0x38, 0x01, 0x00, 0xcb]);
		assert_eq!(callbacks.name(number), Some("Test"));
		assert_eq!(callbacks.dispatch(number, &mut memory).unwrap(), CallbackReturn::Stop);
	}

	#[test] fn test_setup_requires_allocation() {
		let mut memory = GuestMemory::new();
		let mut callbacks = CallbackTable::new();
		assert!(matches!(callbacks.setup(5, stop_handler, CallbackKind::Retf, "Test", &mut memory), Err(Error::InvalidCallback(5))));
		assert!(matches!(callbacks.setup(0, stop_handler, CallbackKind::Retf, "Test", &mut memory), Err(Error::InvalidCallback(0))));
	}

	#[test] fn test_real_pointer() {
		assert_eq!(CallbackTable::real_pointer(1), RealPtr::new(0xf000, 0x1020));
		assert_eq!(CallbackTable::real_pointer(CB_MAX - 1), RealPtr::new(0xf000, 0x1fe0));
		// 0x1000 + 1920 * 32 is exactly 0x10000.
		assert_eq!(CallbackTable::real_pointer(1920), RealPtr::new(0xf000, 0x0000));
		assert_eq!(CallbackTable::real_pointer(0xffff), RealPtr::new(0xf000, 0x0fe0));
	}

	#[test] fn test_dispatch_unknown() {
		let mut memory = GuestMemory::new();
		let callbacks = CallbackTable::new();
		assert!(matches!(callbacks.dispatch(3, &mut memory), Err(Error::UnknownCallback(3))));
	}
}
