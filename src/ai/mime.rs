/// Media type assumed when nothing better is known.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Sniff a media type from leading bytes.
pub fn detect_mime(bytes: &[u8]) -> &'static str {
    match bytes {
        [0x25, 0x50, 0x44, 0x46, ..] => "application/pdf",
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [0x89, 0x50, 0x4E, 0x47, ..] => "image/png",
        [0x47, 0x49, 0x46, 0x38, ..] => "image/gif",
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => "image/webp",
        _ if !bytes.is_empty() && std::str::from_utf8(bytes).is_ok() => "text/plain",
        _ => {
            tracing::warn!(
                "Unrecognized file format (first 4 bytes: {:02X?}), falling back to {}",
                &bytes[..bytes.len().min(4)],
                OCTET_STREAM
            );
            OCTET_STREAM
        }
    }
}

/// The declared type when it is usable, otherwise a sniffed one.
pub fn resolve_mime(declared: Option<&str>, bytes: &[u8]) -> String {
    match declared.map(str::trim) {
        Some(declared) if !declared.is_empty() && declared != OCTET_STREAM => declared.to_string(),
        _ => detect_mime(bytes).to_string(),
    }
}
