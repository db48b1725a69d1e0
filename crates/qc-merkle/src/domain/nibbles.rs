use super::MerkleError;
use std::cmp::Ordering;
use std::fmt;

// =============================================================================
// NIBBLE PATH: borrowed half-byte view
// =============================================================================

/// A borrowed view over a byte sequence read as nibbles (half-bytes, 0-15).
///
/// The view never copies: `slice` narrows the window over the same bytes.
/// A 32-byte hash becomes a 64-nibble path. Length is counted in nibbles.
#[derive(Clone, Copy)]
pub struct NibblePath<'a> {
    data: &'a [u8],
    /// Nibble offset into `data` where the view starts.
    offset: usize,
    len: usize,
}

impl<'a> NibblePath<'a> {
    /// The zero-length path.
    pub const EMPTY: NibblePath<'static> = NibblePath {
        data: &[],
        offset: 0,
        len: 0,
    };

    /// Every nibble of `key`, high nibble of each byte first.
    pub fn from_key(key: &'a [u8]) -> Self {
        Self {
            data: key,
            offset: 0,
            len: key.len() * 2,
        }
    }

    /// `len` nibbles of `data` starting at nibble `start`.
    ///
    /// Panics if the window does not fit inside `data`.
    pub fn from_raw(data: &'a [u8], start: usize, len: usize) -> Self {
        assert!(
            start + len <= data.len() * 2,
            "nibble window {}..{} exceeds {} bytes",
            start,
            start + len,
            data.len()
        );
        Self {
            data,
            offset: start,
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Nibble at `index` within this view.
    pub fn nibble_at(&self, index: usize) -> u8 {
        debug_assert!(index < self.len);
        let at = self.offset + index;
        let byte = self.data[at / 2];
        if at % 2 == 0 {
            byte >> 4
        } else {
            byte & 0x0F
        }
    }

    /// Sub-view of `len` nibbles starting at `start`.
    ///
    /// Panics if the window runs past the end of this view.
    pub fn slice(&self, start: usize, len: usize) -> NibblePath<'a> {
        assert!(start + len <= self.len, "slice out of bounds");
        NibblePath {
            data: self.data,
            offset: self.offset + start,
            len,
        }
    }

    /// Sub-view from `start` to the end.
    ///
    /// Panics if `start` is past the end of this view.
    pub fn slice_from(&self, start: usize) -> NibblePath<'a> {
        self.slice(start, self.len - start)
    }

    /// Count of leading nibbles equal in both paths.
    pub fn common_prefix_len(&self, other: &NibblePath<'_>) -> usize {
        self.iter()
            .zip(other.iter())
            .take_while(|(a, b)| a == b)
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (0..self.len).map(move |i| self.nibble_at(i))
    }

    /// Copy the view into an owned path.
    pub fn to_nibbles(&self) -> Nibbles {
        Nibbles(self.iter().collect())
    }
}

impl PartialEq for NibblePath<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.common_prefix_len(other) == self.len
    }
}

impl Eq for NibblePath<'_> {}

impl Ord for NibblePath<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.iter().cmp(other.iter())
    }
}

impl PartialOrd for NibblePath<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for NibblePath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NibblePath(")?;
        for nibble in self.iter() {
            write!(f, "{:x}", nibble)?;
        }
        f.write_str(")")
    }
}

// =============================================================================
// NIBBLES: owned path, one nibble per byte
// =============================================================================

/// Owned nibble path used for node paths.
///
/// Holds one nibble per byte so it can grow (`push`) and shrink (`truncate`)
/// while a trie is walked.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Nibbles(Vec<u8>);

impl Nibbles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw nibble values. Each value must be below 16.
    pub fn from_nibbles(nibbles: Vec<u8>) -> Self {
        debug_assert!(nibbles.iter().all(|n| *n < 16));
        Nibbles(nibbles)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Append one nibble.
    pub fn push(&mut self, nibble: u8) {
        debug_assert!(nibble < 16);
        self.0.push(nibble);
    }

    /// Append every nibble of `path`.
    pub fn extend(&mut self, path: &NibblePath<'_>) {
        self.0.extend(path.iter());
    }

    /// Trim the path down to `len` nibbles.
    pub fn truncate(&mut self, len: usize) {
        self.0.truncate(len);
    }

    /// Encode nibbles with hex-prefix for RLP encoding.
    ///
    /// Per Ethereum Yellow Paper:
    /// - First nibble encodes flags: 0=extension even, 1=extension odd, 2=leaf even, 3=leaf odd
    /// - If odd number of nibbles, first nibble is part of path
    pub fn encode_hex_prefix(&self, is_leaf: bool) -> Vec<u8> {
        let odd = self.len() % 2 == 1;
        let prefix = if is_leaf { 2 } else { 0 } + if odd { 1 } else { 0 };

        let mut result = Vec::with_capacity(self.len() / 2 + 1);

        let rest = if odd {
            result.push((prefix << 4) | self.0[0]);
            &self.0[1..]
        } else {
            result.push(prefix << 4);
            &self.0[..]
        };

        for pair in rest.chunks(2) {
            result.push((pair[0] << 4) | pair[1]);
        }

        result
    }

    /// Decode hex-prefix encoded bytes back to nibbles.
    ///
    /// Returns the path and whether the flag marked a leaf.
    pub fn decode_hex_prefix(encoded: &[u8]) -> Result<(Self, bool), MerkleError> {
        let Some((&first, rest)) = encoded.split_first() else {
            return Err(MerkleError::malformed("empty hex-prefix path"));
        };

        let prefix = first >> 4;
        if prefix > 3 {
            return Err(MerkleError::malformed(format!(
                "hex-prefix flag {prefix} out of range"
            )));
        }
        let is_leaf = prefix >= 2;
        let odd = prefix % 2 == 1;

        let mut nibbles = Vec::with_capacity(rest.len() * 2 + 1);

        if odd {
            nibbles.push(first & 0x0F);
        } else if first & 0x0F != 0 {
            return Err(MerkleError::malformed("even hex-prefix with non-zero pad"));
        }

        for &byte in rest {
            nibbles.push(byte >> 4);
            nibbles.push(byte & 0x0F);
        }

        Ok((Nibbles(nibbles), is_leaf))
    }
}
