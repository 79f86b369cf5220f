use super::*;
use crate::test_support::png_bytes;

#[test]
fn sniffs_png_and_reads_dimensions() {
    let payload = ImagePayload::sniff(png_bytes(7, 5)).expect("png accepted");
    assert_eq!(payload.preview().format, ImageFormat::Png);
    assert_eq!(payload.mime_type(), "image/png");
    assert_eq!(payload.preview().dimensions, Some((7, 5)));
    assert_eq!(payload.file_name(), "upload.png");
}

#[test]
fn rejects_empty_payload() {
    let err = ImagePayload::sniff(Vec::new()).expect_err("empty rejected");
    assert!(matches!(err, WorkflowError::InvalidInput(_)));
}

#[test]
fn rejects_non_image_bytes() {
    let err = ImagePayload::sniff(b"%PDF-1.7 not an image".to_vec()).expect_err("pdf rejected");
    assert!(matches!(err, WorkflowError::InvalidInput(_)));
}

#[test]
fn recognises_jpeg_magic_without_full_decode() {
    let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
    bytes.extend_from_slice(&[0u8; 16]);
    let payload = ImagePayload::sniff(bytes).expect("jpeg magic accepted");
    assert_eq!(payload.preview().format, ImageFormat::Jpeg);
    assert_eq!(payload.preview().dimensions, None);
    assert_eq!(payload.file_name(), "upload.jpg");
}

#[test]
fn keeps_caller_file_name_unless_blank() {
    let named = ImagePayload::sniff(png_bytes(1, 1))
        .expect("png")
        .with_file_name("amanita.png");
    assert_eq!(named.file_name(), "amanita.png");

    let blank = ImagePayload::sniff(png_bytes(1, 1))
        .expect("png")
        .with_file_name("  ");
    assert_eq!(blank.file_name(), "upload.png");
}

#[test]
fn clones_share_the_selected_bytes() {
    let payload = ImagePayload::sniff(png_bytes(2, 2)).expect("png");
    let clone = payload.clone();
    assert!(payload.is_same_selection(&clone));

    let other = ImagePayload::sniff(png_bytes(2, 2)).expect("png");
    assert!(!payload.is_same_selection(&other));
}
