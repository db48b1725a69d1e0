use super::{bytes::without_leading_zeros, Hash, MerkleError};
use sha3::{Digest, Keccak256};

// =============================================================================
// RLP ENCODING HELPERS
// =============================================================================

/// Encoding of the empty byte string.
pub const EMPTY_STRING: u8 = 0x80;

/// Encoding of the empty list.
pub const EMPTY_LIST: u8 = 0xc0;

/// Append the RLP encoding of a byte string.
pub fn append_bytes(out: &mut Vec<u8>, data: &[u8]) {
    if data.len() == 1 && data[0] < 0x80 {
        out.push(data[0]);
    } else {
        append_header(out, data.len(), 0x80);
        out.extend_from_slice(data);
    }
}

/// RLP-encode a byte slice.
pub fn encode_bytes(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + 9);
    append_bytes(&mut out, data);
    out
}

/// Append a big-endian unsigned integer as a scalar (zero is the empty string).
pub fn append_uint(out: &mut Vec<u8>, be_bytes: &[u8]) {
    match without_leading_zeros(be_bytes) {
        [0] => out.push(EMPTY_STRING),
        trimmed => append_bytes(out, trimmed),
    }
}

/// Wrap an already-encoded payload in a list header.
pub fn encode_list(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 9);
    append_header(&mut out, payload.len(), 0xc0);
    out.extend_from_slice(payload);
    out
}

fn append_header(out: &mut Vec<u8>, len: usize, base: u8) {
    if len < 56 {
        out.push(base + len as u8);
    } else {
        let len_bytes = encode_length(len);
        out.push(base + 55 + len_bytes.len() as u8);
        out.extend_from_slice(&len_bytes);
    }
}

/// Encode a length as minimal big-endian bytes.
fn encode_length(len: usize) -> Vec<u8> {
    without_leading_zeros(&len.to_be_bytes()).to_vec()
}

/// Compute Keccak256 hash.
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

// =============================================================================
// RLP DECODING
// =============================================================================

/// One decoded RLP item borrowed from its source buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Item<'a> {
    pub is_list: bool,
    /// String contents, or the concatenated encodings of a list's items.
    pub payload: &'a [u8],
    /// The complete encoding including the header.
    pub raw: &'a [u8],
}

impl<'a> Item<'a> {
    /// Split a list payload into its items.
    pub fn list_items(&self) -> Result<Vec<Item<'a>>, MerkleError> {
        if !self.is_list {
            return Err(MerkleError::malformed("expected RLP list"));
        }
        let mut items = Vec::new();
        let mut rest = self.payload;
        while !rest.is_empty() {
            let (item, tail) = decode_item(rest)?;
            items.push(item);
            rest = tail;
        }
        Ok(items)
    }
}

/// Decode exactly one item spanning all of `data`.
pub fn decode_exact(data: &[u8]) -> Result<Item<'_>, MerkleError> {
    let (item, rest) = decode_item(data)?;
    if !rest.is_empty() {
        return Err(MerkleError::malformed(format!(
            "{} trailing bytes after RLP item",
            rest.len()
        )));
    }
    Ok(item)
}

/// Decode the first item of `data`, returning it and the remaining bytes.
///
/// Rejects non-canonical encodings.
pub fn decode_item(data: &[u8]) -> Result<(Item<'_>, &[u8]), MerkleError> {
    let Some(&first) = data.first() else {
        return Err(MerkleError::malformed("unexpected end of RLP input"));
    };

    let (is_list, header_len, payload_len) = match first {
        0x00..=0x7f => (false, 0, 1),
        0x80..=0xb7 => (false, 1, (first - 0x80) as usize),
        0xb8..=0xbf => {
            let len_of_len = (first - 0xb7) as usize;
            (false, 1 + len_of_len, decode_long_length(&data[1..], len_of_len)?)
        }
        0xc0..=0xf7 => (true, 1, (first - 0xc0) as usize),
        0xf8..=0xff => {
            let len_of_len = (first - 0xf7) as usize;
            (true, 1 + len_of_len, decode_long_length(&data[1..], len_of_len)?)
        }
    };

    let end = header_len
        .checked_add(payload_len)
        .filter(|end| *end <= data.len())
        .ok_or_else(|| MerkleError::malformed("RLP item overruns input"))?;

    let payload = &data[header_len..end];
    if first == 0x81 && payload[0] < 0x80 {
        return Err(MerkleError::malformed("single byte below 0x80 must encode as itself"));
    }

    let item = Item {
        is_list,
        payload,
        raw: &data[..end],
    };
    Ok((item, &data[end..]))
}

fn decode_long_length(data: &[u8], len_of_len: usize) -> Result<usize, MerkleError> {
    if data.len() < len_of_len {
        return Err(MerkleError::malformed("RLP length overruns input"));
    }
    let len_bytes = &data[..len_of_len];
    if len_bytes[0] == 0 || len_of_len > std::mem::size_of::<usize>() {
        return Err(MerkleError::malformed("non-canonical RLP length"));
    }
    let len = len_bytes
        .iter()
        .fold(0usize, |acc, b| (acc << 8) | *b as usize);
    if len < 56 {
        return Err(MerkleError::malformed("long RLP form used for short payload"));
    }
    Ok(len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_bytes() {
        assert_eq!(encode_bytes(&[]), vec![0x80]);
        assert_eq!(encode_bytes(&[0x7f]), vec![0x7f]);
        assert_eq!(encode_bytes(&[0x80]), vec![0x81, 0x80]);
        assert_eq!(encode_bytes(b"dog"), vec![0x83, b'd', b'o', b'g']);

        let long = vec![0xAA; 60];
        let encoded = encode_bytes(&long);
        assert_eq!(&encoded[..2], &[0xb8, 60]);
        assert_eq!(encoded.len(), 62);
    }

    #[test]
    fn test_append_uint() {
        let mut out = Vec::new();
        append_uint(&mut out, &[0, 0]);
        append_uint(&mut out, &[0, 0x0f]);
        append_uint(&mut out, &[0x04, 0x00]);
        assert_eq!(out, vec![0x80, 0x0f, 0x82, 0x04, 0x00]);
    }

    #[test]
    fn test_encode_list() {
        // ["cat", "dog"]
        let mut payload = Vec::new();
        append_bytes(&mut payload, b"cat");
        append_bytes(&mut payload, b"dog");
        assert_eq!(
            encode_list(&payload),
            vec![0xc8, 0x83, b'c', b'a', b't', 0x83, b'd', b'o', b'g']
        );
        assert_eq!(encode_list(&[]), vec![EMPTY_LIST]);
    }

    #[test]
    fn test_decode_list_items() {
        let mut payload = Vec::new();
        append_bytes(&mut payload, b"cat");
        append_bytes(&mut payload, &[0x05]);
        payload.extend(encode_list(&[]));
        let encoded = encode_list(&payload);

        let item = decode_exact(&encoded).unwrap();
        let items = item.list_items().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].payload, b"cat");
        assert_eq!(items[1].payload, &[0x05]);
        assert!(items[2].is_list);
        assert_eq!(items[2].raw, &[0xc0]);
    }

    #[test]
    fn test_decode_long_string() {
        let long = vec![0x11; 300];
        let encoded = encode_bytes(&long);
        let item = decode_exact(&encoded).unwrap();
        assert!(!item.is_list);
        assert_eq!(item.payload, &long[..]);
    }

    #[test]
    fn test_decode_rejects_non_canonical() {
        assert!(decode_exact(&[0x81, 0x05]).is_err());
        assert!(decode_exact(&[0xb8, 0x05, 1, 2, 3, 4, 5]).is_err());
        assert!(decode_exact(&[0x83, b'a']).is_err());
        assert!(decode_exact(&[0x05, 0x06]).is_err());
        assert!(decode_exact(&[]).is_err());
    }

    #[test]
    fn test_keccak_empty() {
        assert_eq!(
            hex::encode(keccak256(&[])),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }
}
