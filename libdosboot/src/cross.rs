//! Host paths the emulator needs regardless of what is mounted: where its configuration lives and
//! how the host spells absolute paths.

use log::debug;

use std::path::MAIN_SEPARATOR;

#[cfg(windows)]
const CONFIG_DIR_NAME: &str = "DOSBoot";

#[cfg(windows)]
fn windows_app_data_dir(create: bool) -> String {
	if let Ok(app_data) = std::env::var("APPDATA") {
		if !app_data.is_empty() {
			return app_data;
		}
	}
	let windir = std::env::var("windir").unwrap_or_else(|_| "c:\\windows".to_string());
	let result = format!("{}\\Application Data", windir);
	if create {
		create_dir(&result).ok();
	}
	result
}

/// The directory the configuration file is looked up in, always ending with a separator.
pub fn platform_config_dir() -> String {
	#[cfg(windows)]
	let dir = format!("{}\\{}", windows_app_data_dir(false), CONFIG_DIR_NAME);
	#[cfg(target_os = "macos")]
	let dir = resolve_homedir("~/Library/Preferences");
	#[cfg(not(any(windows, target_os = "macos")))]
	let dir = resolve_homedir("~/.dosboot");

	with_trailing_separator(dir)
}

pub fn platform_config_name() -> &'static str {
	if cfg!(target_os = "macos") {
		"DOSBoot Preferences"
	} else {
		"dosboot.conf"
	}
}

/// Like `platform_config_dir`, but makes sure the directory exists. On macOS the preferences
/// directory is assumed to be there already.
pub fn create_platform_config_dir() -> String {
	#[cfg(windows)]
	let dir = {
		let dir = format!("{}\\{}", windows_app_data_dir(true), CONFIG_DIR_NAME);
		create_dir(&dir).ok();
		dir
	};
	#[cfg(target_os = "macos")]
	let dir = resolve_homedir("~/Library/Preferences/");
	#[cfg(not(any(windows, target_os = "macos")))]
	let dir = {
		let dir = resolve_homedir("~/.dosboot");
		if let Err(err) = create_dir(&dir) {
			debug!("Config directory {} not created: {}", dir, err);
		}
		dir
	};

	with_trailing_separator(dir)
}

/// Full path of the configuration file, creating its directory on the way.
pub fn config_file_path() -> String {
	let path = create_platform_config_dir() + platform_config_name();
	debug!("Config file: {}", path);
	path
}

fn with_trailing_separator(mut dir: String) -> String {
	if !dir.ends_with(MAIN_SEPARATOR) {
		dir.push(MAIN_SEPARATOR);
	}
	dir
}

/// Expands `~` and `~/...` using `HOME`. Other forms, including `~user`, are left alone.
pub fn resolve_homedir(path: &str) -> String {
	resolve_homedir_with(path, std::env::var("HOME").ok().as_deref())
}

fn resolve_homedir_with(path: &str, home: Option<&str>) -> String {
	let mut chars = path.chars();
	if chars.next() != Some('~') {
		return path.to_string();
	}
	match (chars.next(), home) {
		(None, Some(home)) => home.to_string(),
		(Some(c), Some(home)) if c == MAIN_SEPARATOR => format!("{}{}", home, &path[1..]),
		_ => path.to_string(),
	}
}

/// Creates one directory. Only the owner gets access on Unix.
pub fn create_dir(path: &str) -> std::io::Result<()> {
	let mut builder = std::fs::DirBuilder::new();
	#[cfg(unix)]
	{
		use std::os::unix::fs::DirBuilderExt;
		builder.mode(0o700);
	}
	builder.create(path)
}

pub fn is_path_absolute(path: &str) -> bool {
	let bytes = path.as_bytes();
	if cfg!(windows) {
		// Drive letter or UNC.
		(bytes.len() > 2 && bytes[1] == b':') || (bytes.len() > 2 && bytes[0] == b'\\' && bytes[1] == b'\\')
	} else {
		bytes.len() > 1 && bytes[0] == b'/'
	}
}
