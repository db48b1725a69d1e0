/// Single zero byte returned for zero-valued input.
static ZERO_BYTE: [u8; 1] = [0];

/// Strip leading zero bytes of a big-endian integer.
///
/// Empty or all-zero input yields the single byte `0x00`; otherwise the
/// slice starts at the first non-zero byte.
pub fn without_leading_zeros(bytes: &[u8]) -> &[u8] {
    if bytes.is_empty() {
        return &ZERO_BYTE;
    }

    match bytes.iter().position(|&b| b != 0) {
        Some(first) => &bytes[first..],
        None => &bytes[bytes.len() - 1..],
    }
}

/// True when `bytes` is already in trimmed form.
pub fn is_trimmed(bytes: &[u8]) -> bool {
    match bytes {
        [] => false,
        [_] => true,
        [first, ..] => *first != 0,
    }
}
