#![cfg(not(target_arch = "wasm32"))]

use dial_media::handler::{read_handler, HANDLER_LEN};
use dial_media::layout::{blocks_to_bytes, IO_MASTERS_SECOND, IO_ROUTINES};
use dial_media::transcode::{canonicalize, copy_media, materialize};
use dial_media::{
    build_system_image, tape, BuildPlan, CoreImage, Handler, HandlerSlot, MediaError, MediaKind,
    MemBackend, StdFileBackend, StorageBackend, TapeFooter, UnitSpecSource,
};

const TAPE_BLOCKS: usize = 512;

fn data_frames(value: u16) -> [u8; 2] {
    [((value >> 6) & 0x3F) as u8, (value & 0x3F) as u8]
}

fn origin_frames(address: u16) -> [u8; 2] {
    [0x40 | ((address >> 6) & 0x3F) as u8, (address & 0x3F) as u8]
}

/// Loader tape placing `words` at consecutive addresses starting at `origin`.
fn loader_tape(origin: u16, words: &[u16]) -> Vec<u8> {
    let mut out = vec![0x80; 16];
    out.extend_from_slice(&origin_frames(origin));
    for w in words {
        out.extend_from_slice(&data_frames(*w));
    }
    out.extend_from_slice(&[0x80; 16]);
    out
}

/// A 512-block LINCtape image where every block is filled with its own block number.
fn reference_linctape() -> Vec<u8> {
    let mut out = Vec::with_capacity(blocks_to_bytes(TAPE_BLOCKS) + 6);
    for block in 0..TAPE_BLOCKS {
        out.extend(std::iter::repeat((block % 255) as u8 + 1).take(512));
    }
    out.extend_from_slice(&TapeFooter::default().to_bytes());
    out
}

#[test]
fn decoder_scenario_sets_single_word() {
    let image = tape::decode(&[0x80u8, 0x80, 0x40, 0x05, 0x0A, 0x1C, 0x80][..]).unwrap();
    assert_eq!(image.word(5), 0o1234);
    assert_eq!(image.word(5), 668);
    for addr in (0..4096).filter(|a| *a != 5) {
        assert_eq!(image.word(addr), 0, "word {addr:o}");
    }
}

#[test]
fn tape_handler_roundtrips_through_masters_slot() {
    let words: Vec<u16> = (0..0o150).map(|i| (i * 3 + 0o100) & 0o7777).collect();
    let tape_bytes = loader_tape(0o230, &words);

    let core = tape::decode_bytes(&tape_bytes).unwrap();
    let handler = Handler::from_core(&core);
    assert_eq!(handler.as_bytes().len(), HANDLER_LEN);

    let mut masters = vec![0u8; 512];
    dial_media::handler::write_handler(&mut masters, handler.as_bytes(), HandlerSlot::Primary)
        .unwrap();
    let back = read_handler(&masters, HandlerSlot::Primary).unwrap();
    assert_eq!(back.as_bytes(), core.bytes_at(0o230, 0o150).unwrap().as_slice());
}

#[test]
fn tape_resized_to_rk05_keeps_content_and_zero_tail() {
    let input = reference_linctape();
    let image = canonicalize(&input, MediaKind::Linc).unwrap();
    assert_eq!(image.block_count(), TAPE_BLOCKS);

    let mut out = MemBackend::new();
    let len = materialize(&image, MediaKind::Rk05, &mut out).unwrap();
    let out = out.into_vec();

    assert_eq!(len, 3248 * 256 * 2 * 2);
    assert_eq!(out.len(), 3248 * 256 * 2 * 2);
    assert_eq!(&out[..blocks_to_bytes(TAPE_BLOCKS)], &input[..blocks_to_bytes(TAPE_BLOCKS)]);
    assert!(out[blocks_to_bytes(TAPE_BLOCKS)..].iter().all(|b| *b == 0));
}

#[test]
fn sparse_file_output_reads_back_as_zero() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("system.rk08");

    let mut backend = StdFileBackend::create(&path).unwrap();
    copy_media(
        &reference_linctape(),
        MediaKind::Linc,
        MediaKind::Rk08,
        true,
        &mut backend,
    )
    .unwrap();
    assert_eq!(backend.len().unwrap(), 3248 * 512);

    let written = std::fs::read(&path).unwrap();
    assert_eq!(written.len(), 3248 * 512);
    assert_eq!(written[blocks_to_bytes(0o322)], (0o322 % 255) as u8 + 1);
    assert!(written[blocks_to_bytes(TAPE_BLOCKS)..].iter().all(|b| *b == 0));
}

#[test]
fn full_build_installs_every_component() {
    let primary = Handler::try_from(&[0x11u8; HANDLER_LEN][..]).unwrap();
    let secondary = Handler::try_from(&[0x22u8; HANDLER_LEN][..]).unwrap();

    let booter: Vec<u16> = (0..0o100).map(|i| 0o6000 + i).collect();
    let reference = tape::decode_bytes(&loader_tape(0o7200, &booter)).unwrap();

    let plan = BuildPlan {
        preserve_index: false,
        masters: IO_MASTERS_SECOND,
        primary_handler: Some(primary.clone()),
        secondary_handler: Some(secondary.clone()),
        reboot_patch: Some(reference),
        unit_specs: Some(vec![
            UnitSpecSource::parse("linctape-units.pri", "0,1,2\n").unwrap(),
            UnitSpecSource::parse("sys-units.pri", "").unwrap(),
            UnitSpecSource::parse("rk08-units.sec", "20,21,22\n").unwrap(),
        ]),
    };
    let image = build_system_image(&reference_linctape(), MediaKind::Linc, &plan).unwrap();
    let routines = image.current_routines();

    // The last two words of the primary slot are system communication cells owned by the patch.
    let installed = read_handler(routines.handler_block(), HandlerSlot::Primary).unwrap();
    assert_eq!(
        &installed.as_bytes()[..HANDLER_LEN - 4],
        &primary.as_bytes()[..HANDLER_LEN - 4]
    );
    assert_eq!(&installed.as_bytes()[HANDLER_LEN - 4..], &[0, 0, 0, 0]);
    assert_eq!(
        read_handler(routines.handler_block(), HandlerSlot::Secondary).unwrap(),
        secondary
    );
    assert_eq!(
        &routines.as_bytes()[0o200 * 2..0o200 * 2 + 4],
        &[0x00, 0x0C, 0x01, 0x0C]
    );
    assert_eq!(
        &routines.unit_table()[..14],
        &[0, 0, 1, 0, 2, 0, 0o20, 0, 0o21, 0, 0o22, 0, 0xFF, 0x0F]
    );
    assert_eq!(&routines.unit_table()[126..], &[0xFD, 0x0F]);

    // Index erased, masters kept.
    assert!(image.as_bytes()[..blocks_to_bytes(0o300)].iter().all(|b| *b == 0));
    assert!(image.region(IO_MASTERS_SECOND).iter().all(|b| *b == (0o366 % 255) as u8 + 1));
    assert_eq!(image.region(IO_ROUTINES), routines.as_bytes());
}

#[test]
fn truncated_input_is_rejected_before_any_write() {
    let mut input = vec![0u8; blocks_to_bytes(0o200)];
    input.extend_from_slice(&TapeFooter::default().to_bytes());
    let err = build_system_image(&input, MediaKind::Linc, &BuildPlan::default()).unwrap_err();
    assert!(matches!(err, MediaError::Format("missing system area")));
}

#[test]
fn reference_patch_needs_full_core_image() {
    let core = CoreImage::new();
    let mut short = vec![0u8; 1000];
    assert!(matches!(
        dial_media::patch::apply(&mut short, &core).unwrap_err(),
        MediaError::Length { .. }
    ));
}
