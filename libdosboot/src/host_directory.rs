use crate::code_page::{CodePage, SingleByteCodePage};
use crate::dos_error_codes::DosErrorCode;
use crate::short_name::ShortNameCache;

use log::{debug, trace, warn};

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShortNameMode {
	/// Only what the host file system reports. The standard library exposes no native short names,
	/// so entries come back without one and the DOS layer has to make its own.
	HostOnly,
	/// Legal 8.3 names are used as they are, everything else gets a unique `~N` alias.
	Synthesize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryEntry {
	pub long_name: String,
	pub short_name: String,
	pub is_directory: bool,
}

#[derive(Debug)]
struct Cursor {
	dot_entries: VecDeque<&'static str>,
	read_dir: std::fs::ReadDir,
}

/// An open listing of one host directory.
///
/// `read_first` starts (or restarts) the listing, `read_next` continues it, and both return `None`
/// once everything has been seen. `.` and `..` come first, as they do on DOS.
#[derive(Debug)]
pub struct DirectoryHandle {
	base_path: PathBuf,
	search_pattern: String,
	wide: bool,
	code_page: Box<dyn CodePage>,
	short_name_mode: ShortNameMode,
	short_names: ShortNameCache,
	cursor: Option<Cursor>,
	started: bool,
}

impl DirectoryHandle {
	pub fn open<P: AsRef<Path>>(path: P) -> Result<DirectoryHandle, DosErrorCode> {
		let path = path.as_ref();
		if path.as_os_str().is_empty() {
			return Err(DosErrorCode::PathNotFound);
		}
		let metadata = std::fs::metadata(path).map_err(|err| DosErrorCode::from_dir_error(&err))?;
		if !metadata.is_dir() {
			return Err(DosErrorCode::PathNotFound);
		}
		// Make sure it can actually be listed before handing out a handle.
		std::fs::read_dir(path).map_err(|err| DosErrorCode::from_dir_error(&err))?;

		let path_text = path.to_string_lossy();
		let search_pattern = if path_text.ends_with(std::path::MAIN_SEPARATOR) {
			format!("{}*.*", path_text)
		} else {
			format!("{}{}*.*", path_text, std::path::MAIN_SEPARATOR)
		};
		// Windows hands out UTF-16 names; elsewhere they are raw bytes.
		let wide = cfg!(windows);
		debug!("Opened directory {} (wide names: {})", search_pattern, wide);

		Ok(DirectoryHandle {
			base_path: path.to_path_buf(),
			search_pattern,
			wide,
			code_page: Box::new(SingleByteCodePage::default()),
			short_name_mode: ShortNameMode::Synthesize,
			short_names: ShortNameCache::new(),
			cursor: None,
			started: false,
		})
	}

	pub fn with_code_page(mut self, code_page: Box<dyn CodePage>) -> DirectoryHandle {
		self.code_page = code_page;
		self.short_names = ShortNameCache::new();
		self
	}

	pub fn with_short_name_mode(mut self, short_name_mode: ShortNameMode) -> DirectoryHandle {
		self.short_name_mode = short_name_mode;
		self
	}

	pub fn base_path(&self) -> &Path {
		&self.base_path
	}

	pub fn search_pattern(&self) -> &str {
		&self.search_pattern
	}

	pub fn is_open(&self) -> bool {
		self.cursor.is_some()
	}

	pub fn read_first(&mut self) -> Option<DirectoryEntry> {
		self.started = true;
		if self.short_name_mode == ShortNameMode::Synthesize {
			self.reserve_legal_names();
		}
		self.cursor = match std::fs::read_dir(&self.base_path) {
			Ok(read_dir) => Some(Cursor {
				dot_entries: vec![".", ".."].into(),
				read_dir,
			}),
			Err(err) => {
				warn!("Couldn't list {}: {}", self.base_path.display(), err);
				None
			}
		};
		self.read_next()
	}

	pub fn read_next(&mut self) -> Option<DirectoryEntry> {
		loop {
			let cursor = self.cursor.as_mut()?;
			if let Some(dot_name) = cursor.dot_entries.pop_front() {
				let short_name = match self.short_name_mode {
					ShortNameMode::HostOnly => String::new(),
					ShortNameMode::Synthesize => dot_name.to_string(),
				};
				return Some(DirectoryEntry {
					long_name: dot_name.to_string(),
					short_name,
					is_directory: true,
				});
			}

			let dir_entry = match cursor.read_dir.next()? {
				Ok(dir_entry) => dir_entry,
				Err(err) => {
					warn!("Skipping unreadable entry in {}: {}", self.base_path.display(), err);
					continue;
				}
			};
			let long_name = match dir_entry.file_name().into_string() {
				Ok(long_name) => long_name,
				Err(raw_name) => {
					warn!("Skipping {:?}: not representable as text", raw_name);
					continue;
				}
			};
			// Same as the host to guest conversion failing: DOS never sees the entry.
			if !self.code_page.encodes(&long_name) {
				let source = if self.wide { "wide" } else { "host" };
				debug!("Skipping {}: {} name not representable in code page {}", long_name, source, self.code_page.number());
				continue;
			}

			let is_directory = match dir_entry.file_type() {
				Ok(file_type) if file_type.is_dir() => true,
				Ok(file_type) if file_type.is_file() => false,
				// Links and the like: ask for the real thing.
				_ => std::fs::metadata(self.base_path.join(&long_name)).map(|metadata| metadata.is_dir()).unwrap_or(false),
			};

			let short_name = match self.short_name_mode {
				ShortNameMode::HostOnly => String::new(),
				ShortNameMode::Synthesize => self.short_names.get_dos_name(&long_name, self.code_page.as_ref()),
			};
			trace!("{} -> {} (dir: {})", long_name, short_name, is_directory);

			return Some(DirectoryEntry {
				long_name,
				short_name,
				is_directory,
			});
		}
	}

	// Legal 8.3 names keep their own name whatever order the host lists them in, so they are
	// claimed before any alias is made up.
	fn reserve_legal_names(&mut self) {
		let read_dir = match std::fs::read_dir(&self.base_path) {
			Ok(read_dir) => read_dir,
			Err(_) => return,
		};
		for dir_entry in read_dir.filter_map(|dir_entry| dir_entry.ok()) {
			if let Ok(long_name) = dir_entry.file_name().into_string() {
				self.short_names.reserve(&long_name, self.code_page.as_ref());
			}
		}
	}

	/// Releases the host listing. Safe to call more than once.
	pub fn close(&mut self) {
		if self.cursor.take().is_some() {
			debug!("Closed directory {}", self.search_pattern);
		}
	}
}

impl Iterator for DirectoryHandle {
	type Item = DirectoryEntry;

	fn next(&mut self) -> Option<DirectoryEntry> {
		if self.started {
			self.read_next()
		} else {
			self.read_first()
		}
	}
}
