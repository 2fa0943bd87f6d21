//! Best-effort content type detection

/// Fallback content type when detection is inconclusive
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Number of leading bytes handed to a sniffer
pub(crate) const SNIFF_LEN: usize = 8192;

/// Detects the media type of a stored blob
///
/// `head` holds up to the first 8 KiB of the blob. Returning `None` means "don't know";
/// the store then falls back to [`OCTET_STREAM`].
pub trait ContentSniffer: Send + Sync + std::fmt::Debug {
    fn sniff(&self, name: &str, head: &[u8]) -> Option<String>;
}

/// Magic-byte detection via `infer`, then extension lookup via `mime_guess`
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultSniffer;

impl ContentSniffer for DefaultSniffer {
    fn sniff(&self, name: &str, head: &[u8]) -> Option<String> {
        if let Some(kind) = infer::get(head) {
            return Some(kind.mime_type().to_owned());
        }

        mime_guess::from_path(name)
            .first()
            .map(|mime| mime.essence_str().to_owned())
    }
}
