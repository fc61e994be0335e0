//! Upload safety checks and content-type resolution for note images.
//!
//! Uploads are rejected when they are oversized, carry a blocked extension,
//! or start with executable magic bytes. File names are sanitized before
//! they become part of a storage key.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use tracing::debug;

use crate::defaults::DEFAULT_CONTENT_TYPE;

/// Magic byte signatures for executable files
pub const MAGIC_SIGNATURES: &[(&str, &[u8])] = &[
    ("Windows PE/MZ", &[0x4D, 0x5A]),
    ("ELF", &[0x7F, 0x45, 0x4C, 0x46]),
    ("Mach-O 32", &[0xFE, 0xED, 0xFA, 0xCE]),
    ("Mach-O 64", &[0xFE, 0xED, 0xFA, 0xCF]),
    ("Mach-O Fat / Java Class", &[0xCA, 0xFE, 0xBA, 0xBE]),
    ("WebAssembly", &[0x00, 0x61, 0x73, 0x6D]),
];

/// Blocked file extensions (case-insensitive)
static BLOCKED_EXTENSIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "exe", "dll", "scr", "pif", "com", "msi", "so", "dylib", "jar", "class", "deb", "rpm",
        "apk", "app", "dmg", "pkg", "reg", "lnk", "hta",
    ]
    .into_iter()
    .collect()
});

/// Outcome of [`validate_file`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileVerdict {
    Allowed,
    Blocked { reason: String },
}

impl FileVerdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, FileVerdict::Allowed)
    }

    fn blocked(reason: impl Into<String>) -> Self {
        FileVerdict::Blocked {
            reason: reason.into(),
        }
    }
}

/// Check an upload against the size limit, extension blocklist and
/// executable magic bytes.
pub fn validate_file(file_name: &str, data: &[u8], max_size_bytes: u64) -> FileVerdict {
    if data.len() as u64 > max_size_bytes {
        return FileVerdict::blocked(format!(
            "file exceeds maximum size of {} bytes",
            max_size_bytes
        ));
    }

    if let Some((_, ext)) = file_name.rsplit_once('.') {
        if BLOCKED_EXTENSIONS.contains(ext.to_lowercase().as_str()) {
            return FileVerdict::blocked(format!("file extension .{} is not allowed", ext));
        }
    }

    for (name, magic) in MAGIC_SIGNATURES {
        if data.starts_with(magic) {
            return FileVerdict::blocked(format!("executable file detected: {}", name));
        }
    }

    FileVerdict::Allowed
}

/// Pick the content type for an upload.
///
/// Order: the declared type when it is a well-formed MIME type, then magic
/// byte detection, then the image extension table, then
/// `application/octet-stream`.
pub fn resolve_content_type(file_name: &str, data: &[u8], declared: Option<&str>) -> String {
    if let Some(declared) = declared.map(str::trim).filter(|d| is_valid_mime_type(d)) {
        return declared.to_string();
    }
    if let Some(bad) = declared {
        debug!(subsystem = "storage", file_name, declared = bad, "Ignoring malformed declared content type");
    }

    if let Some(kind) = infer::get(data) {
        debug!(subsystem = "storage", file_name, content_type = kind.mime_type(), "Content type from magic bytes");
        return kind.mime_type().to_string();
    }

    let content_type = file_name
        .rsplit_once('.')
        .and_then(|(_, ext)| mime_from_extension(ext))
        .unwrap_or(DEFAULT_CONTENT_TYPE);
    debug!(subsystem = "storage", file_name, content_type, "Content type from extension or default");
    content_type.to_string()
}

fn mime_from_extension(ext: &str) -> Option<&'static str> {
    match ext.to_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "heic" => Some("image/heic"),
        "avif" => Some("image/avif"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

/// Validate MIME type format per RFC 2045 (type/subtype).
pub fn is_valid_mime_type(mime: &str) -> bool {
    let Some((media_type, subtype)) = mime.split_once('/') else {
        return false;
    };
    if media_type.is_empty() || subtype.is_empty() {
        return false;
    }
    let is_token_char = |c: char| -> bool {
        c.is_ascii_alphanumeric() || matches!(c, '!' | '#' | '$' | '&' | '-' | '^' | '_' | '.' | '+')
    };
    media_type.chars().all(is_token_char) && subtype.chars().all(is_token_char)
}

/// Sanitize a client-supplied file name so it can be embedded in a storage key.
pub fn sanitize_filename(file_name: &str) -> String {
    let name = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);

    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '|' | '?' | '*' | '#' | '%' | '&' | '\0' => '_',
            c if c.is_control() || c.is_whitespace() => '_',
            c => c,
        })
        .collect();

    let sanitized = sanitized.trim_matches('.');
    if sanitized.is_empty() {
        return "unnamed_file".to_string();
    }

    // Truncate on a char boundary, keeping the extension.
    const MAX_LEN: usize = 200;
    if sanitized.len() > MAX_LEN {
        let (stem, ext) = match sanitized.rfind('.') {
            Some(dot) if sanitized.len() - dot <= 16 => sanitized.split_at(dot),
            _ => (sanitized, ""),
        };
        let mut cut = MAX_LEN - ext.len();
        while !stem.is_char_boundary(cut) {
            cut -= 1;
        }
        return format!("{}{}", &stem[..cut], ext);
    }

    sanitized.to_string()
}
