//! Property tests for GDT framing: the declared record length always
//! equals the serialized byte count, and every line's length prefix is
//! exact, for arbitrary field content.

use proptest::prelude::*;
use vitalink_gdt::GdtDocument;

fn arb_content() -> impl Strategy<Value = String> {
    // Latin-1 range plus a few astral characters that degrade to '?'.
    proptest::collection::vec(
        prop_oneof![
            proptest::char::range('\u{20}', '\u{7e}'),
            proptest::char::range('\u{a0}', '\u{ff}'),
            Just('€'),
        ],
        0..120,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

fn arb_field_id() -> impl Strategy<Value = String> {
    proptest::collection::vec(proptest::char::range('0', '9'), 4)
        .prop_map(|digits| digits.into_iter().collect::<String>())
        // Content fields never reuse the header identifiers.
        .prop_filter("header field ids are reserved", |id| {
            id != "8000" && id != "8100"
        })
}

proptest! {
    #[test]
    fn declared_length_equals_total_bytes(
        fields in proptest::collection::vec((arb_field_id(), arb_content()), 0..24)
    ) {
        let mut doc = GdtDocument::new("SND1", "RCV1");
        for (id, content) in &fields {
            doc.add_field(id, content.clone());
        }
        let bytes = doc.to_bytes();

        // Walk lines by their own length prefixes.
        let mut offset = 0;
        let mut declared_total = None;
        while offset < bytes.len() {
            let prefix = std::str::from_utf8(&bytes[offset..offset + 3]).unwrap();
            let line_len: usize = prefix.parse().unwrap();
            prop_assert!(line_len >= 9);
            prop_assert_eq!(&bytes[offset + line_len - 2..offset + line_len], b"\r\n");

            let field_id = std::str::from_utf8(&bytes[offset + 3..offset + 7]).unwrap();
            if field_id == "8100" {
                let content =
                    std::str::from_utf8(&bytes[offset + 7..offset + line_len - 2]).unwrap();
                declared_total = Some(content.parse::<usize>().unwrap());
            }
            offset += line_len;
        }

        prop_assert_eq!(offset, bytes.len());
        prop_assert_eq!(declared_total, Some(bytes.len()));
    }

    #[test]
    fn serialization_is_deterministic(
        fields in proptest::collection::vec((arb_field_id(), arb_content()), 0..12)
    ) {
        let mut doc = GdtDocument::new("SND1", "RCV1");
        for (id, content) in &fields {
            doc.add_field(id, content.clone());
        }
        prop_assert_eq!(doc.to_bytes(), doc.to_bytes());
    }
}
