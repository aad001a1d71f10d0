use std::fmt;
use std::io::BufRead;

use serde::{Deserialize, Serialize};

use crate::error::GopherError;

/// Gopher item type, taken from the first character of a menu line.
///
/// Unrecognized characters are preserved verbatim in `Other` so that
/// follow-up requests can still be formed for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemType {
    TextFile,
    Menu,
    Search,
    Binary,
    Gif,
    Image,
    Info,
    Html,
    Other(char),
}

impl From<char> for ItemType {
    fn from(c: char) -> Self {
        match c {
            '0' => ItemType::TextFile,
            '1' => ItemType::Menu,
            '7' => ItemType::Search,
            '9' => ItemType::Binary,
            'g' => ItemType::Gif,
            'I' => ItemType::Image,
            'i' => ItemType::Info,
            'h' => ItemType::Html,
            other => ItemType::Other(other),
        }
    }
}

impl ItemType {
    pub fn to_char(&self) -> char {
        match self {
            ItemType::TextFile => '0',
            ItemType::Menu => '1',
            ItemType::Search => '7',
            ItemType::Binary => '9',
            ItemType::Gif => 'g',
            ItemType::Image => 'I',
            ItemType::Info => 'i',
            ItemType::Html => 'h',
            ItemType::Other(c) => *c,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ItemType::TextFile => "TextFile",
            ItemType::Menu => "Menu",
            ItemType::Search => "Search",
            ItemType::Binary => "Binary",
            ItemType::Gif => "Gif",
            ItemType::Image => "Image",
            ItemType::Info => "Info",
            ItemType::Html => "Html",
            ItemType::Other(_) => "Other",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            ItemType::Menu => "application/x-gopher-menu",
            ItemType::Binary => "application/octet-stream",
            ItemType::Gif => "image/gif",
            ItemType::Image => "image/jpeg",
            ItemType::Html => "text/html",
            _ => "text/plain",
        }
    }
}

/// One parsed line of a menu response, kept as a relative resource reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub item_type: ItemType,
    pub selector: String,
}

impl DirectoryEntry {
    /// Addressable path for this entry: `/` + type character + selector.
    ///
    /// Servers that already encode the item type in their selectors
    /// (`/1/foo`) would end up double-prefixed, so such selectors are kept
    /// verbatim.
    pub fn path(&self) -> String {
        let c = self.item_type.to_char();
        if self.selector.starts_with(&format!("/{c}/")) {
            self.selector.clone()
        } else {
            format!("/{c}{}", self.selector)
        }
    }
}

impl fmt::Display for DirectoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// An ordered menu listing with a rewindable forward cursor.
///
/// Line order is preserved, duplicates included; weeding out duplicates is
/// the caller's business.
#[derive(Debug, Clone, Default)]
pub struct DirectoryListing {
    entries: Vec<DirectoryEntry>,
    cursor: usize,
}

impl DirectoryListing {
    /// Parses a full menu response.
    ///
    /// Lines are split on LF and trimmed afterwards, so CRLF and bare-LF
    /// servers both work. Empty lines are skipped and a lone `.` ends the
    /// listing. A non-empty line with fewer than two tab-separated fields
    /// poisons the whole parse.
    pub fn parse<R: BufRead>(mut reader: R) -> Result<Self, GopherError> {
        let mut entries = Vec::new();
        let mut raw = Vec::new();

        loop {
            raw.clear();
            if reader.read_until(b'\n', &mut raw)? == 0 {
                break;
            }
            let text = String::from_utf8_lossy(&raw);
            let line = text.trim();
            if line.is_empty() {
                continue;
            }
            if line == "." {
                break;
            }

            let mut fields = line.split('\t');
            let label = fields.next().unwrap_or_default();
            let selector = match fields.next() {
                Some(s) => s,
                None => {
                    return Err(GopherError::MalformedListing {
                        line: line.to_string(),
                    })
                }
            };

            entries.push(DirectoryEntry {
                item_type: ItemType::from(label.chars().next().unwrap_or('?')),
                selector: selector.to_string(),
            });
        }

        Ok(DirectoryListing { entries, cursor: 0 })
    }

    /// Returns the entry at the cursor and advances it.
    pub fn next_entry(&mut self) -> Option<DirectoryEntry> {
        let entry = self.entries.get(self.cursor).cloned()?;
        self.cursor += 1;
        Some(entry)
    }

    /// Resets the cursor to the first entry.
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Result<DirectoryListing, GopherError> {
        DirectoryListing::parse(input.as_bytes())
    }

    #[test]
    fn parses_menu_lines_in_order() {
        let listing = parse(
            "1Article One\t/1/article1\texample.com\t70\r\n\
             1Article Two\t/1/article2\texample.com\t70\r\n",
        )
        .unwrap();
        let paths: Vec<String> = listing.entries().iter().map(|e| e.path()).collect();
        assert_eq!(paths, vec!["/1/article1", "/1/article2"]);
    }

    #[test]
    fn tolerates_bare_lf_line_endings() {
        let listing = parse("0About\t/about\texample.com\t70\n").unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing.entries()[0].selector, "/about");
    }

    #[test]
    fn entry_path_prefixes_item_type() {
        let listing = parse("0About\t/about\texample.com\t70\n").unwrap();
        assert_eq!(listing.entries()[0].path(), "/0/about");
    }

    #[test]
    fn already_typed_selector_kept_verbatim() {
        let entry = DirectoryEntry {
            item_type: ItemType::Menu,
            selector: "/1/article1".to_string(),
        };
        assert_eq!(entry.path(), "/1/article1");
    }

    #[test]
    fn unknown_type_character_preserved() {
        let listing = parse("sSound clip\t/clip.wav\texample.com\t70\n").unwrap();
        assert_eq!(listing.entries()[0].item_type, ItemType::Other('s'));
        assert_eq!(listing.entries()[0].path(), "/s/clip.wav");
    }

    #[test]
    fn blank_lines_skipped_and_dot_terminates() {
        let listing = parse(
            "1First\t/1/a\texample.com\t70\r\n\
             \r\n\
             1Second\t/1/b\texample.com\t70\r\n\
             .\r\n\
             1After the end\t/1/c\texample.com\t70\r\n",
        )
        .unwrap();
        assert_eq!(listing.len(), 2);
    }

    #[test]
    fn tabless_line_fails_whole_listing() {
        let err = parse(
            "1Good\t/1/a\texample.com\t70\r\n\
             this line has no tabs\r\n",
        )
        .unwrap_err();
        assert!(matches!(err, GopherError::MalformedListing { line } if line == "this line has no tabs"));
    }

    #[test]
    fn duplicates_preserved() {
        let listing = parse(
            "1Same\t/1/a\texample.com\t70\n\
             1Same\t/1/a\texample.com\t70\n",
        )
        .unwrap();
        assert_eq!(listing.len(), 2);
    }

    #[test]
    fn cursor_advances_and_rewinds() {
        let mut listing = parse(
            "1A\t/1/a\texample.com\t70\n\
             1B\t/1/b\texample.com\t70\n",
        )
        .unwrap();
        assert_eq!(listing.next_entry().unwrap().path(), "/1/a");
        assert_eq!(listing.next_entry().unwrap().path(), "/1/b");
        assert!(listing.next_entry().is_none());
        listing.rewind();
        assert_eq!(listing.next_entry().unwrap().path(), "/1/a");
    }

    #[test]
    fn empty_response_is_empty_listing() {
        let mut listing = parse("").unwrap();
        assert!(listing.is_empty());
        assert!(listing.next_entry().is_none());
        listing.rewind();
    }
}
