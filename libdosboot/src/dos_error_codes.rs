use log::warn;

// http://stanislavs.org/helppc/dos_error_codes.html
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(u8)]
pub enum DosErrorCode {
	PathNotFound = 0x03,
	AccessDenied = 0x05,
}

impl DosErrorCode {
	/// The error a directory operation reports for a failed host call.
	pub fn from_dir_error(err: &std::io::Error) -> DosErrorCode {
		match err.kind() {
			std::io::ErrorKind::NotFound => DosErrorCode::PathNotFound,
			std::io::ErrorKind::PermissionDenied => DosErrorCode::AccessDenied,
			_ => {
				warn!("Unexpected directory error: {:?}", err);
				DosErrorCode::PathNotFound
			}
		}
	}
}

impl std::fmt::Display for DosErrorCode {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		let text = match self {
			DosErrorCode::PathNotFound => "Path not found",
			DosErrorCode::AccessDenied => "Access denied",
		};
		write!(f, "{} (0x{:02x})", text, *self as u8)
	}
}

impl std::error::Error for DosErrorCode {}
