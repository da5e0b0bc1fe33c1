/// How the guest code page sees host characters. Name length limits are counted in guest bytes,
/// so a character that needs two bytes in the code page takes two places in an 8.3 name.
pub trait CodePage: std::fmt::Debug {
	fn number(&self) -> u16;

	/// Bytes the character occupies once converted to the guest code page.
	fn char_width(&self, c: char) -> usize;

	/// Whether the character survives conversion to the guest code page at all.
	fn can_encode(&self, c: char) -> bool;

	fn encodes(&self, text: &str) -> bool {
		text.chars().all(|c| self.can_encode(c))
	}

	fn text_width(&self, text: &str) -> usize {
		text.chars().map(|c| self.char_width(c)).sum()
	}
}

/// Any of the western single byte pages (437, 850, ...).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SingleByteCodePage {
	pub number: u16,
}

impl Default for SingleByteCodePage {
	fn default() -> SingleByteCodePage {
		SingleByteCodePage { number: 437 }
	}
}

impl CodePage for SingleByteCodePage {
	fn number(&self) -> u16 {
		self.number
	}

	fn char_width(&self, _c: char) -> usize {
		1
	}

	fn can_encode(&self, c: char) -> bool {
		(c as u32) <= 0xff
	}
}

/// Code page 932 (Shift-JIS).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ShiftJisCodePage;

impl ShiftJisCodePage {
	fn is_halfwidth_katakana(c: char) -> bool {
		('\u{ff61}'..='\u{ff9f}').contains(&c)
	}
}

impl CodePage for ShiftJisCodePage {
	fn number(&self) -> u16 {
		932
	}

	fn char_width(&self, c: char) -> usize {
		if c as u32 > 0xff && !ShiftJisCodePage::is_halfwidth_katakana(c) { 2 } else { 1 }
	}

	fn can_encode(&self, _c: char) -> bool {
		true
	}
}

pub fn code_page_for(number: u16) -> Box<dyn CodePage> {
	match number {
		932 => Box::new(ShiftJisCodePage),
		_ => Box::new(SingleByteCodePage { number }),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test] fn test_single_byte_widths() {
		let page = SingleByteCodePage::default();
		assert_eq!(page.text_width("README.TXT"), 10);
		assert!(page.encodes("caf\u{e9}"));
		assert!(!page.encodes("\u{65e5}\u{672c}"));
	}

	#[test] fn test_shift_jis_widths() {
		let page = ShiftJisCodePage;
		// Two kanji, two bytes each.
		assert_eq!(page.text_width("\u{65e5}\u{672c}"), 4);
		// Half width katakana stay single byte.
		assert_eq!(page.text_width("\u{ff71}\u{ff72}"), 2);
		assert_eq!(page.text_width("abc"), 3);
		assert!(page.encodes("\u{65e5}\u{672c}"));
	}

	#[test] fn test_code_page_lookup() {
		assert_eq!(code_page_for(932).number(), 932);
		assert_eq!(code_page_for(850).number(), 850);
		assert_eq!(code_page_for(850).char_width('\u{65e5}'), 1);
	}
}
