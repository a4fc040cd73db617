//! Wide string conversion for ProjFS callback data.

use windows::core::PCWSTR;

/// Convert a ProjFS wide string to UTF-8. Null pointers yield "".
///
/// Unpaired surrogates, which NTFS accepts in file names, are replaced
/// with `?` so every event still reaches its handler.
///
/// # Safety
/// `s` must be null or point to a null-terminated UTF-16 string that
/// outlives the call.
pub unsafe fn pcwstr_to_string(s: PCWSTR) -> String {
    if s.is_null() {
        return String::new();
    }

    let wide: &[u16] = s.as_wide();
    char::decode_utf16(wide.iter().copied())
        .map(|c| c.unwrap_or('?'))
        .collect()
}

/// Convert a Rust string to a null-terminated wide string.
pub fn string_to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}
