//! # Code Minter
//!
//! Fresh item codes, generated locally with no coordination.
//!
//! A code is the hyphenated text of a random UUID v4. The label printed
//! under each QR shows only its first [`CAPTION_LEN`] characters, which is
//! enough for a human to tell stickers apart on a sheet.

use uuid::Uuid;

/// Codes per printed sheet (3×3 grid).
pub const BATCH_SIZE: usize = 9;

/// Characters of a code shown in captions and file names.
pub const CAPTION_LEN: usize = 8;

/// Produces `n` fresh codes in generation order.
///
/// ## Example
/// ```rust
/// use tally_core::minter;
///
/// let codes = minter::mint(3);
/// assert_eq!(codes.len(), 3);
/// assert_ne!(codes[0], codes[1]);
/// ```
pub fn mint(n: usize) -> Vec<String> {
    (0..n).map(|_| Uuid::new_v4().to_string()).collect()
}

/// A full sheet of codes.
pub fn mint_batch() -> Vec<String> {
    mint(BATCH_SIZE)
}

/// Leading characters of a code, never splitting a character.
pub fn caption(code: &str) -> &str {
    match code.char_indices().nth(CAPTION_LEN) {
        Some((end, _)) => &code[..end],
        None => code,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_mint_unique_uuids() {
        let codes = mint(500);
        let unique: HashSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), 500);
        for code in &codes {
            let parsed = Uuid::parse_str(code).unwrap();
            assert_eq!(parsed.get_version_num(), 4);
        }
    }

    #[test]
    fn test_mint_zero() {
        assert!(mint(0).is_empty());
        assert_eq!(mint_batch().len(), BATCH_SIZE);
    }

    #[test]
    fn test_caption() {
        assert_eq!(caption("5b1e6a0c-aaaa-4bbb"), "5b1e6a0c");
        assert_eq!(caption("short"), "short");
        assert_eq!(caption("ñññññññññññ"), "ññññññññ");
    }
}
