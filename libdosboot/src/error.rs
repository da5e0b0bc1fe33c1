use thiserror::Error;

/// Failures while bringing up the DOS kernel structures. None of these can be recovered from
/// during boot, the caller is expected to stop the machine.
#[derive(Debug, Error)]
pub enum Error {
	/// The private segment has no room for the requested paragraphs.
	#[error("DOS: Not enough memory for internal tables ({requested} paragraphs at segment 0x{segment:04x}, limit 0x{limit:04x})")]
	OutOfTableMemory {
		requested: u16,
		segment: u16,
		limit: u16,
	},

	#[error("no free callback slots")]
	NoFreeCallbacks,

	#[error("callback {0} is not installed")]
	UnknownCallback(u16),

	#[error("callback {0} is out of range")]
	InvalidCallback(u16),
}
