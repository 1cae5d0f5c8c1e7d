//! Byte-exact GDT document framing.

use crate::fields;

/// Record type 6310, "new examination data".
pub const RECORD_TYPE_NEW_EXAM: &str = "6310";

/// GDT interface version.
const VERSION: &str = "02.10";

/// Charset identifier 2 = IBM CP 437 / ISO 8859-1 family, 8-bit.
const CHARSET_ISO_8859_1: &str = "2";

/// An ordered GDT document under construction.
///
/// Header lines (record type, record length, version, sender, receiver,
/// charset) are emitted first, then content fields in insertion order.
/// The record length is a fixed point of the serialization: the digits of
/// the total affect the total. [`GdtDocument::to_bytes`] iterates until
/// the declared length is stable.
#[derive(Debug, Clone)]
pub struct GdtDocument {
    record_type: String,
    sender_id: String,
    receiver_id: String,
    content: Vec<(String, String)>,
}

impl GdtDocument {
    /// Start a new-examination-data document.
    #[must_use]
    pub fn new(sender_id: impl Into<String>, receiver_id: impl Into<String>) -> Self {
        Self {
            record_type: RECORD_TYPE_NEW_EXAM.to_string(),
            sender_id: sender_id.into(),
            receiver_id: receiver_id.into(),
            content: Vec::new(),
        }
    }

    /// Append a content field. Fields serialize in the order they were
    /// added.
    pub fn add_field(&mut self, field_id: &str, content: impl Into<String>) {
        self.content.push((field_id.to_string(), content.into()));
    }

    /// Number of content fields added so far.
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.content.len()
    }

    /// Serialize the document to its exact on-disk bytes.
    ///
    /// The declared record length (field 8100) equals the byte length of
    /// the returned buffer, terminators included.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut declared = 0usize;
        loop {
            let buffer = self.render(declared);
            if buffer.len() == declared {
                return buffer;
            }
            declared = buffer.len();
        }
    }

    fn render(&self, declared_length: usize) -> Vec<u8> {
        let mut buffer = Vec::new();
        push_line(&mut buffer, fields::RECORD_TYPE, &self.record_type);
        push_line(
            &mut buffer,
            fields::RECORD_LENGTH,
            &declared_length.to_string(),
        );
        push_line(&mut buffer, fields::VERSION, VERSION);
        push_line(&mut buffer, fields::SENDER_ID, &self.sender_id);
        push_line(&mut buffer, fields::RECEIVER_ID, &self.receiver_id);
        push_line(&mut buffer, fields::CHARSET, CHARSET_ISO_8859_1);
        for (field_id, content) in &self.content {
            push_line(&mut buffer, field_id, content);
        }
        buffer
    }
}

/// Append one `LLLFFFFContent\r\n` line. `LLL` counts every byte of the
/// line including itself, the field identifier and the terminator.
fn push_line(buffer: &mut Vec<u8>, field_id: &str, content: &str) {
    let content_bytes = encode_latin1(content);
    let length = 3 + 4 + content_bytes.len() + 2;
    buffer.extend_from_slice(format!("{length:03}").as_bytes());
    buffer.extend_from_slice(field_id.as_bytes());
    buffer.extend_from_slice(&content_bytes);
    buffer.extend_from_slice(b"\r\n");
}

/// Encode to ISO-8859-1, replacing unmappable characters with `?`.
fn encode_latin1(content: &str) -> Vec<u8> {
    content
        .chars()
        .map(|c| {
            let cp = c as u32;
            if cp <= 0xFF {
                cp as u8
            } else {
                b'?'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_line_is_record_type() {
        let doc = GdtDocument::new("VITA", "PRAX");
        let bytes = doc.to_bytes();
        let first = bytes.split(|b| *b == b'\n').next().unwrap();
        assert_eq!(first, b"01380006310\r");
    }

    #[test]
    fn declared_length_matches_total_bytes() {
        let mut doc = GdtDocument::new("VITA", "PRAX");
        doc.add_field("3000", "1");
        doc.add_field("8402", "EKG01");
        let bytes = doc.to_bytes();

        let text = String::from_utf8(bytes.clone()).unwrap();
        let length_line = text
            .lines()
            .find(|l| l[3..7].eq("8100"))
            .expect("record length line");
        let declared: usize = length_line[7..].parse().unwrap();
        assert_eq!(declared, bytes.len());
    }

    #[test]
    fn every_line_length_prefix_is_exact() {
        let mut doc = GdtDocument::new("SND1", "RCV1");
        doc.add_field("6228", "Herzfrequenz: 72 /min");
        doc.add_field("8460", "Sinus Rhythm");
        let bytes = doc.to_bytes();

        let mut offset = 0;
        while offset < bytes.len() {
            let prefix = std::str::from_utf8(&bytes[offset..offset + 3]).unwrap();
            let line_len: usize = prefix.parse().unwrap();
            assert_eq!(&bytes[offset + line_len - 2..offset + line_len], b"\r\n");
            offset += line_len;
        }
        assert_eq!(offset, bytes.len());
    }

    #[test]
    fn empty_content_line_has_length_9() {
        let mut buffer = Vec::new();
        push_line(&mut buffer, "6228", "");
        assert_eq!(buffer, b"0096228\r\n");
    }

    #[test]
    fn version_header_present() {
        let bytes = GdtDocument::new("A", "B").to_bytes();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("02.10"));
        assert!(text.lines().any(|l| &l[3..7] == "9206" && &l[7..] == "2"));
    }

    #[test]
    fn umlauts_encode_as_single_latin1_bytes() {
        let encoded = encode_latin1("Größe");
        assert_eq!(encoded, vec![b'G', b'r', 0xF6, 0xDF, b'e']);
        // Characters above U+00FF degrade to '?'.
        assert_eq!(encode_latin1("€"), vec![b'?']);
    }

    #[test]
    fn record_length_fixed_point_is_stable_near_digit_boundaries() {
        // Grow a document so the total crosses 99 -> 100 and 999 -> 1000;
        // the fixed point must converge either way.
        for extra_fields in 0..64 {
            let mut doc = GdtDocument::new("S", "R");
            for i in 0..extra_fields {
                doc.add_field("6228", format!("line {i}"));
            }
            let bytes = doc.to_bytes();
            let text = String::from_utf8(bytes.clone()).unwrap();
            let declared: usize = text
                .lines()
                .find(|l| &l[3..7] == "8100")
                .map(|l| l[7..].parse().unwrap())
                .unwrap();
            assert_eq!(declared, bytes.len(), "fields={extra_fields}");
        }
    }
}
