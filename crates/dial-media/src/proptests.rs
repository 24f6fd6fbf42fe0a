use crate::layout::{blocks_to_bytes, BYTES_PER_BLOCK};
use crate::tape::{decode_bytes, CoreImage, CORE_WORDS};
use crate::transcode::{canonicalize, materialize};
use crate::{MediaKind, MemBackend, TapeFooter};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Record {
    Origin(u16),
    Data(u16),
    FieldUpdate(u8),
}

fn record_strategy() -> impl Strategy<Value = Record> {
    prop_oneof![
        1 => (0u16..0o10000).prop_map(Record::Origin),
        6 => (0u16..0o10000).prop_map(Record::Data),
        1 => (0u8..0x3F).prop_map(|low| Record::FieldUpdate(0xC0 | low)),
    ]
}

fn encode(records: &[Record]) -> Vec<u8> {
    let mut tape = vec![0x80; 8];
    // Real tapes open with an origin; it also keeps an empty body from reading as all leader.
    tape.extend_from_slice(&[0x40, 0x00]);
    for record in records {
        match *record {
            Record::Origin(addr) => {
                tape.push(0x40 | ((addr >> 6) & 0x3F) as u8);
                tape.push((addr & 0x3F) as u8);
            }
            Record::Data(value) => {
                tape.push(((value >> 6) & 0x3F) as u8);
                tape.push((value & 0x3F) as u8);
            }
            Record::FieldUpdate(frame) => tape.push(frame),
        }
    }
    tape.extend_from_slice(&[0x80; 8]);
    tape
}

/// Straightforward model of what the loader does with a record list.
fn model(records: &[Record]) -> CoreImage {
    let mut image = CoreImage::new();
    let mut address = 0usize;
    for record in records {
        match *record {
            Record::Origin(addr) => address = usize::from(addr),
            Record::Data(value) => {
                image.set_word(address, value);
                address = (address + 1) % CORE_WORDS;
            }
            Record::FieldUpdate(_) => {}
        }
    }
    image
}

proptest! {
    #[test]
    fn decoder_matches_model(records in prop::collection::vec(record_strategy(), 0..256)) {
        let decoded = decode_bytes(&encode(&records)).unwrap();
        prop_assert_eq!(decoded, model(&records));
    }

    #[test]
    fn skipped_regions_are_opaque(
        records in prop::collection::vec(record_strategy(), 0..64),
        filler in prop::collection::vec(
            any::<u8>().prop_filter("not a skip toggle", |b| *b != 0xFF),
            0..64,
        ),
    ) {
        let plain = encode(&records);
        let mut with_skip = plain.clone();
        // Splice the skipped filler in right after the leader.
        let mut region = vec![0xFF];
        region.extend_from_slice(&filler);
        region.push(0xFF);
        with_skip.splice(8..8, region);

        prop_assert_eq!(decode_bytes(&with_skip).unwrap(), decode_bytes(&plain).unwrap());
    }

    #[test]
    fn materialized_size_is_max_of_media_and_image(
        blocks in 0o370usize..0o1200,
        kind in prop_oneof![
            Just(MediaKind::Linc),
            Just(MediaKind::Rk08),
            Just(MediaKind::Rk05),
            Just(MediaKind::Sdsk),
        ],
    ) {
        let mut tape = vec![0x5Au8; blocks_to_bytes(blocks)];
        tape.extend_from_slice(&TapeFooter::default().to_bytes());
        let image = canonicalize(&tape, MediaKind::Linc).unwrap();

        let mut out = MemBackend::new();
        let len = materialize(&image, kind, &mut out).unwrap();
        let footer = if kind.is_tape() { 6 } else { 0 };
        let expected = (blocks * BYTES_PER_BLOCK) as u64;
        let expected = expected.max(kind.geometry().size_bytes()) + footer;

        prop_assert_eq!(len, expected);
        prop_assert_eq!(out.as_slice().len() as u64, expected);
        prop_assert_eq!(&out.as_slice()[..blocks * BYTES_PER_BLOCK], image.as_bytes());
    }
}
