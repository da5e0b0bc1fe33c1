use crate::code_page::CodePage;

use std::collections::{HashMap, HashSet};

const SHORT_TITLE_WIDTH: usize = 8;
const SHORT_EXT_WIDTH: usize = 3;

// Characters that can't appear in a short name. Anything at or below space counts too.
fn is_illegal_short_char(c: char) -> bool {
	c <= ' ' || c == '\u{7f}' || "\"+=,;:<>|?*".contains(c)
}

/// True if `name` can be shown to DOS as it is: up to 8 characters, optionally a dot and up to
/// 3 more, nothing that DOS rejects, and no second dot. Widths are in guest code page bytes.
pub fn is_filename_8by3(name: &str, code_page: &dyn CodePage) -> bool {
	if name.is_empty() || !code_page.encodes(name) {
		return false;
	}

	let mut chars = name.chars().peekable();
	let mut title_width = 0;
	while let Some(&c) = chars.peek() {
		if c == '.' {
			break;
		}
		if is_illegal_short_char(c) {
			return false;
		}
		title_width += code_page.char_width(c);
		chars.next();
	}
	if title_width > SHORT_TITLE_WIDTH {
		return false;
	}

	if chars.peek() == Some(&'.') {
		chars.next();
	}

	let mut ext_width = 0;
	while let Some(&c) = chars.peek() {
		if c == '.' {
			break;
		}
		if is_illegal_short_char(c) {
			return false;
		}
		ext_width += code_page.char_width(c);
		chars.next();
	}
	if ext_width > SHORT_EXT_WIDTH {
		return false;
	}

	// A second dot makes it a long name.
	chars.next().is_none()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ShortName {
	title: String,
	ext: String,
}

impl ShortName {
	fn to_dos_name(&self) -> String {
		let mut result = self.title.clone();
		if !self.ext.is_empty() {
			result.push('.');
			result.push_str(&self.ext);
		}
		result
	}
}

fn split_filename(filename: &str) -> (&str, Option<&str>) {
	match filename.rfind('.') {
		Some(dot_pos) => (&filename[..dot_pos], Some(&filename[dot_pos + 1..])),
		None => (filename, None),
	}
}

// Keeps whole characters while the running width stays within `max_width`.
fn truncate_to_width(text: &str, max_width: usize, code_page: &dyn CodePage) -> String {
	let mut width = 0;
	let mut result = String::new();
	for c in text.chars() {
		width += code_page.char_width(c);
		if width > max_width {
			break;
		}
		result.push(c);
	}
	result
}

/// Turns a host name into an upper case 8.3 candidate, optionally with a `~N` tail squeezed into
/// the title. The flag says whether anything had to be cut off to fit.
fn real_to_short_name(filename: &str, extra_index: Option<usize>, code_page: &dyn CodePage) -> (ShortName, bool) {
	let mut converted = String::new();
	for c in filename.trim_start_matches('.').chars() {
		if c == ' ' {
			continue;
		}
		if !code_page.can_encode(c) || is_illegal_short_char(c) || c == '[' || c == ']' {
			converted.push('_');
		} else {
			converted.push(c.to_ascii_uppercase());
		}
	}

	let (file_title, file_ext) = split_filename(&converted);
	let mut title: String = file_title.chars().filter(|c| *c != '.').collect();
	if title.is_empty() {
		title.push('_');
	}
	let file_ext = file_ext.unwrap_or("");
	let ext = truncate_to_width(file_ext, SHORT_EXT_WIDTH, code_page);

	let mut index_text = String::new();
	if let Some(extra_index) = extra_index {
		index_text.push('~');
		index_text.push_str(&extra_index.to_string());
	}
	let mut short_title = truncate_to_width(&title, SHORT_TITLE_WIDTH.saturating_sub(index_text.len()), code_page);
	let truncated = short_title.len() < title.len() || ext.len() < file_ext.len();
	short_title.push_str(&index_text);

	(ShortName { title: short_title, ext }, truncated)
}

/// Remembers the short names handed out for one directory so that every entry gets a distinct
/// one, and the same host name gets the same short name each time it is seen.
#[derive(Debug, Default)]
pub struct ShortNameCache {
	real_to_dos_names: HashMap<String, String>,
	used_dos_names: HashSet<String>,
}

impl ShortNameCache {
	pub fn new() -> ShortNameCache {
		ShortNameCache::default()
	}

	/// Claims a name that is already 8.3 legal for itself, so no alias handed out later can take
	/// it. Returns false if the name isn't legal or another host name got there first.
	pub fn reserve(&mut self, real_filename: &str, code_page: &dyn CodePage) -> bool {
		if let Some(existing_dos_name) = self.real_to_dos_names.get(real_filename) {
			return existing_dos_name == real_filename;
		}
		if !is_filename_8by3(real_filename, code_page) {
			return false;
		}
		let upper_name = real_filename.to_ascii_uppercase();
		if self.is_used(&upper_name) {
			return false;
		}
		self.used_dos_names.insert(upper_name);
		self.real_to_dos_names.insert(real_filename.to_string(), real_filename.to_string());
		true
	}

	pub fn get_dos_name(&mut self, real_filename: &str, code_page: &dyn CodePage) -> String {
		if let Some(existing_dos_name) = self.real_to_dos_names.get(real_filename) {
			return existing_dos_name.clone();
		}
		if self.reserve(real_filename, code_page) {
			return real_filename.to_string();
		}

		// Anything that lost characters gets a tail straight away, so it can't take the plain
		// name from a host file that really is called that.
		let (plain_name, truncated) = real_to_short_name(real_filename, None, code_page);
		let mut dos_name = plain_name.to_dos_name();
		if truncated || self.is_used(&dos_name) {
			let mut name_index = 1;
			loop {
				dos_name = real_to_short_name(real_filename, Some(name_index), code_page).0.to_dos_name();
				if !self.is_used(&dos_name) {
					break;
				}
				name_index += 1;
			}
		}

		self.used_dos_names.insert(dos_name.to_ascii_uppercase());
		self.real_to_dos_names.insert(real_filename.to_string(), dos_name.clone());
		dos_name
	}

	fn is_used(&self, dos_name: &str) -> bool {
		self.used_dos_names.contains(&dos_name.to_ascii_uppercase())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::code_page::{ShiftJisCodePage, SingleByteCodePage};

	#[test] fn test_8by3_legal_names() {
		let page = SingleByteCodePage::default();
		assert!(is_filename_8by3("FILE.TXT", &page));
		assert!(is_filename_8by3("A.B", &page));
		assert!(is_filename_8by3("README", &page));
		assert!(is_filename_8by3("12345678.123", &page));
		assert!(is_filename_8by3("lower.txt", &page));
	}

	#[test] fn test_8by3_illegal_names() {
		let page = SingleByteCodePage::default();
		assert!(!is_filename_8by3("", &page));
		assert!(!is_filename_8by3("longfilename.txt", &page));
		assert!(!is_filename_8by3("123456789", &page));
		assert!(!is_filename_8by3("FILE.TEXT", &page));
		assert!(!is_filename_8by3("A.B.C", &page));
		assert!(!is_filename_8by3("..", &page));
		assert!(!is_filename_8by3("MY FILE", &page));
		assert!(!is_filename_8by3("A+B.TXT", &page));
		assert!(!is_filename_8by3("WHAT?.TXT", &page));
		assert!(!is_filename_8by3("TAB\t", &page));
		assert!(!is_filename_8by3("DEL\u{7f}", &page));
		assert!(!is_filename_8by3("\u{65e5}.TXT", &page));
	}

	#[test] fn test_8by3_double_byte_widths() {
		let page = ShiftJisCodePage;
		// Four kanji fill the title.
		assert!(is_filename_8by3("\u{65e5}\u{672c}\u{8a9e}\u{6587}.TXT", &page));
		assert!(!is_filename_8by3("\u{65e5}\u{672c}\u{8a9e}\u{6587}X.TXT", &page));
		assert!(!is_filename_8by3("A.\u{65e5}\u{672c}", &page));
		assert!(is_filename_8by3("\u{ff71}\u{ff72}\u{ff73}\u{ff74}\u{ff75}\u{ff76}\u{ff77}\u{ff78}", &page));
	}

	#[test] fn test_dir_listing_cache() {
		let page = SingleByteCodePage::default();
		let mut cache = ShortNameCache::new();
		assert_eq!(cache.get_dos_name("foot.text", &page), "FOOT~1.TEX");
		assert_eq!(cache.get_dos_name("foot.text2", &page), "FOOT~2.TEX");
		assert_eq!(cache.get_dos_name("filewithlongname.txt", &page), "FILEWI~1.TXT");
		assert_eq!(cache.get_dos_name("filewithlongername.txt", &page), "FILEWI~2.TXT");
		assert_eq!(cache.get_dos_name("filewithlongerername.txt", &page), "FILEWI~3.TXT");
		// Seen before, same answer.
		assert_eq!(cache.get_dos_name("foot.text2", &page), "FOOT~2.TEX");
	}

	#[test] fn test_shortened_name_leaves_plain_name_free() {
		let page = SingleByteCodePage::default();
		let mut cache = ShortNameCache::new();
		assert_eq!(cache.get_dos_name("longfilename.txt", &page), "LONGFI~1.TXT");
		assert_eq!(cache.get_dos_name("LONGFILE.TXT", &page), "LONGFILE.TXT");

		let mut cache = ShortNameCache::new();
		assert_eq!(cache.get_dos_name("LONGFILE.TXT", &page), "LONGFILE.TXT");
		assert_eq!(cache.get_dos_name("longfilename.txt", &page), "LONGFI~1.TXT");
	}

	#[test] fn test_reserved_names_are_skipped_by_aliases() {
		let page = SingleByteCodePage::default();
		let mut cache = ShortNameCache::new();
		assert!(cache.reserve("FILEWI~1.TXT", &page));
		assert!(cache.reserve("MYFILE.C", &page));
		assert!(!cache.reserve("filewithlongname.txt", &page));
		// Case insensitive clash with the first reservation.
		assert!(!cache.reserve("filewi~1.txt", &page));
		// Reserving again is harmless.
		assert!(cache.reserve("MYFILE.C", &page));

		assert_eq!(cache.get_dos_name("filewithlongname.txt", &page), "FILEWI~2.TXT");
		assert_eq!(cache.get_dos_name("my file.c", &page), "MYFILE~1.C");
		assert_eq!(cache.get_dos_name("FILEWI~1.TXT", &page), "FILEWI~1.TXT");
		assert_eq!(cache.get_dos_name("MYFILE.C", &page), "MYFILE.C");
	}

	#[test] fn test_legal_names_pass_through() {
		let page = SingleByteCodePage::default();
		let mut cache = ShortNameCache::new();
		assert_eq!(cache.get_dos_name("FILE.TXT", &page), "FILE.TXT");
		assert_eq!(cache.get_dos_name("a.b", &page), "a.b");
		// Case insensitive clash with a name already handed out.
		assert_eq!(cache.get_dos_name("A.B", &page), "A~1.B");
	}

	#[test] fn test_awkward_names_become_legal() {
		let page = SingleByteCodePage::default();
		let mut cache = ShortNameCache::new();
		let names = [
			"longfilename.txt", ".bashrc", "my file.c", "a.b.c.d", "what+is=this;.txt",
			"...", "\u{65e5}\u{672c}.txt", "[brackets]", "archive.tar.gz",
		];
		let mut seen = HashSet::new();
		for name in names.iter() {
			let short = cache.get_dos_name(name, &page);
			assert!(is_filename_8by3(&short, &page), "{} -> {}", name, short);
			assert_ne!(short.as_str(), *name);
			assert!(seen.insert(short));
		}
		assert_eq!(cache.get_dos_name(".bashrc", &page), "BASHRC");
		assert_eq!(cache.get_dos_name("my file.c", &page), "MYFILE.C");
		assert_eq!(cache.get_dos_name("archive.tar.gz", &page), "ARCHIV~1.GZ");
		assert_eq!(cache.get_dos_name("[brackets]", &page), "_BRACK~1");
		assert_eq!(cache.get_dos_name("...", &page), "_");
	}

	#[test] fn test_double_byte_aliases_keep_whole_characters() {
		let page = ShiftJisCodePage;
		let mut cache = ShortNameCache::new();
		let short = cache.get_dos_name("\u{65e5}\u{672c}\u{8a9e}\u{6587}\u{66f8}.txt", &page);
		assert_eq!(short, "\u{65e5}\u{672c}\u{8a9e}~1.TXT");
		let short = cache.get_dos_name("\u{65e5}\u{672c}\u{8a9e}\u{6587}\u{66f8}\u{985e}.txt", &page);
		assert_eq!(short, "\u{65e5}\u{672c}\u{8a9e}~2.TXT");
		assert!(is_filename_8by3(&short, &page));
	}
}
