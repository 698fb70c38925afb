//! Byte stream to UTF-16 code unit stream, with encoding detection (§4.2).
//!
//! This is the bottom of the pipeline (`bytes -> character source ->
//! scanner -> ...`, §2): everything above [`CharSource`] only ever sees
//! `u16` code units (CIF's line/column accounting and surrogate-pair
//! handling are specified in those units) plus a single `EOF` sentinel.

/// Encodings the source can detect or be forced into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Utf16Le,
    Utf16Be,
    Utf32Le,
    Utf32Be,
}

/// A problem decoding a byte sequence: reported through the caller-supplied
/// callback, which decides whether to keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeProblem {
    /// Bytes that are not valid in the detected encoding.
    InvalidChar,
    /// Bytes that decode to a code point with no sensible mapping forward
    /// (e.g. an unpaired surrogate smuggled in through UTF-32).
    UnmappedChar,
}

/// What to do after reporting a [`DecodeProblem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnError {
    Continue,
    Abort,
}

/// Options steering encoding selection (§4.2, mirrors the `default_*`
/// options in §6).
#[derive(Debug, Clone, Default)]
pub struct EncodingOptions {
    pub force_default_encoding: bool,
    pub default_encoding: Option<Encoding>,
    pub default_to_cif2: bool,
}

const CIF2_MAGIC: &str = "#\\#CIF_2.0";

/// Select the encoding for `bytes` per the rule order in §4.2.
pub fn select_encoding(bytes: &[u8], opts: &EncodingOptions) -> (Encoding, usize) {
    if opts.force_default_encoding {
        if let Some(enc) = opts.default_encoding {
            return (enc, 0);
        }
    }
    if let Some((enc, bom_len)) = detect_bom(bytes) {
        return (enc, bom_len);
    }
    if starts_with_cif2_magic(bytes) {
        return (Encoding::Utf8, 0);
    }
    if opts.default_to_cif2 {
        return (Encoding::Utf8, 0);
    }
    if let Some(enc) = opts.default_encoding {
        return (enc, 0);
    }
    (Encoding::Utf8, 0)
}

fn detect_bom(bytes: &[u8]) -> Option<(Encoding, usize)> {
    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        return Some((Encoding::Utf8, 3));
    }
    if bytes.starts_with(&[0xFF, 0xFE, 0x00, 0x00]) {
        return Some((Encoding::Utf32Le, 4));
    }
    if bytes.starts_with(&[0x00, 0x00, 0xFE, 0xFF]) {
        return Some((Encoding::Utf32Be, 4));
    }
    if bytes.starts_with(&[0xFF, 0xFE]) {
        return Some((Encoding::Utf16Le, 2));
    }
    if bytes.starts_with(&[0xFE, 0xFF]) {
        return Some((Encoding::Utf16Be, 2));
    }
    None
}

fn starts_with_cif2_magic(bytes: &[u8]) -> bool {
    // The magic is pure ASCII, so a lossy/byte-wise prefix compare is
    // sufficient regardless of which 8-bit-compatible encoding this is.
    bytes.starts_with(CIF2_MAGIC.as_bytes())
}

/// The EOF sentinel, distinct from any valid UTF-16 code unit.
pub const EOF: u32 = u32::MAX;

/// A lazy, forward-only sequence of UTF-16 code units decoded from a byte
/// stream, with pushback within the already-decoded buffer (§4.2).
///
/// The substitution character on an undecodable byte is U+FFFD for CIF 2.0
/// input and the C0 SUB-like U+001A for CIF 1.x, matching which dialect
/// selected the encoding in the first place.
pub struct CharSource {
    units: Vec<u16>,
    pos: usize,
    /// `true` after `EOF` has been produced once (§4.2: produced exactly
    /// once).
    eof_emitted: bool,
}

impl CharSource {
    pub fn decode(
        bytes: &[u8],
        opts: &EncodingOptions,
        cif2_substitution: bool,
        mut on_error: impl FnMut(DecodeProblem) -> OnError,
    ) -> Self {
        let (encoding, bom_len) = select_encoding(bytes, opts);
        let body = &bytes[bom_len..];
        let substitute: u16 = if cif2_substitution { 0xFFFD } else { 0x001A };
        let units = decode_units(body, encoding, substitute, &mut on_error);
        Self { units, pos: 0, eof_emitted: false }
    }

    /// For tests and in-memory round-tripping: wrap already-decoded UTF-16.
    pub fn from_units(units: Vec<u16>) -> Self {
        Self { units, pos: 0, eof_emitted: false }
    }

    /// Consume and return the next code unit, or `EOF` (produced exactly
    /// once; further calls keep returning it, matching a sentinel stream).
    pub fn next(&mut self) -> u32 {
        if self.pos < self.units.len() {
            let u = self.units[self.pos];
            self.pos += 1;
            u as u32
        } else {
            self.eof_emitted = true;
            EOF
        }
    }

    /// Push back `n` code units within the current buffer extent.
    pub fn push_back(&mut self, n: usize) {
        self.pos = self.pos.saturating_sub(n);
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn eof_emitted(&self) -> bool {
        self.eof_emitted
    }

    /// Peek without consuming.
    pub fn peek(&self) -> u32 {
        self.units.get(self.pos).map(|&u| u as u32).unwrap_or(EOF)
    }
}

fn decode_units(
    body: &[u8],
    encoding: Encoding,
    substitute: u16,
    on_error: &mut impl FnMut(DecodeProblem) -> OnError,
) -> Vec<u16> {
    match encoding {
        Encoding::Utf8 => decode_utf8(body, substitute, on_error),
        Encoding::Utf16Le => decode_utf16(body, true, substitute, on_error),
        Encoding::Utf16Be => decode_utf16(body, false, substitute, on_error),
        Encoding::Utf32Le => decode_utf32(body, true, substitute, on_error),
        Encoding::Utf32Be => decode_utf32(body, false, substitute, on_error),
    }
}

fn decode_utf8(
    body: &[u8],
    substitute: u16,
    on_error: &mut impl FnMut(DecodeProblem) -> OnError,
) -> Vec<u16> {
    let mut out = Vec::with_capacity(body.len());
    let mut rest = body;
    loop {
        match std::str::from_utf8(rest) {
            Ok(s) => {
                out.extend(s.encode_utf16());
                return out;
            }
            Err(e) => {
                let valid_up_to = e.valid_up_to();
                out.extend(std::str::from_utf8(&rest[..valid_up_to]).unwrap().encode_utf16());
                let bad_len = e.error_len().unwrap_or(rest.len() - valid_up_to);
                if on_error(DecodeProblem::InvalidChar) == OnError::Abort {
                    out.push(substitute);
                    return out;
                }
                out.push(substitute);
                rest = &rest[valid_up_to + bad_len.max(1)..];
                if rest.is_empty() {
                    return out;
                }
            }
        }
    }
}

fn decode_utf16(
    body: &[u8],
    little_endian: bool,
    substitute: u16,
    on_error: &mut impl FnMut(DecodeProblem) -> OnError,
) -> Vec<u16> {
    let mut out = Vec::with_capacity(body.len() / 2);
    let mut chunks = body.chunks_exact(2);
    for chunk in &mut chunks {
        let u = if little_endian {
            u16::from_le_bytes([chunk[0], chunk[1]])
        } else {
            u16::from_be_bytes([chunk[0], chunk[1]])
        };
        out.push(u);
    }
    if !chunks.remainder().is_empty() {
        if on_error(DecodeProblem::InvalidChar) == OnError::Abort {
            return out;
        }
        out.push(substitute);
    }
    out
}

fn decode_utf32(
    body: &[u8],
    little_endian: bool,
    substitute: u16,
    on_error: &mut impl FnMut(DecodeProblem) -> OnError,
) -> Vec<u16> {
    let mut out = Vec::with_capacity(body.len() / 2);
    let mut chunks = body.chunks_exact(4);
    for chunk in &mut chunks {
        let cp = if little_endian {
            u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]])
        } else {
            u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]])
        };
        match char::from_u32(cp) {
            Some(c) => {
                let mut buf = [0u16; 2];
                out.extend(c.encode_utf16(&mut buf).iter().copied());
            }
            None => {
                if on_error(DecodeProblem::UnmappedChar) == OnError::Abort {
                    out.push(substitute);
                    return out;
                }
                out.push(substitute);
            }
        }
    }
    if !chunks.remainder().is_empty() {
        if on_error(DecodeProblem::InvalidChar) == OnError::Abort {
            return out;
        }
        out.push(substitute);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_utf8_bom() {
        let bytes = [0xEF, 0xBB, 0xBF, b'd', b'a', b't', b'a', b'_', b'a'];
        let (enc, len) = select_encoding(&bytes, &EncodingOptions::default());
        assert_eq!(enc, Encoding::Utf8);
        assert_eq!(len, 3);
    }

    #[test]
    fn detects_cif2_magic_as_utf8() {
        let bytes = "#\\#CIF_2.0\ndata_a\n".as_bytes();
        let (enc, len) = select_encoding(bytes, &EncodingOptions::default());
        assert_eq!(enc, Encoding::Utf8);
        assert_eq!(len, 0);
    }

    #[test]
    fn unidentified_input_defaults_when_requested() {
        let bytes = b"data_a\n_x 1\n";
        let opts = EncodingOptions { default_to_cif2: true, ..Default::default() };
        let (enc, _) = select_encoding(bytes, &opts);
        assert_eq!(enc, Encoding::Utf8);
    }

    #[test]
    fn force_default_wins_over_bom() {
        let bytes = [0xEF, 0xBB, 0xBF, b'x'];
        let opts = EncodingOptions {
            force_default_encoding: true,
            default_encoding: Some(Encoding::Utf16Le),
            ..Default::default()
        };
        let (enc, bom_len) = select_encoding(&bytes, &opts);
        assert_eq!(enc, Encoding::Utf16Le);
        assert_eq!(bom_len, 0);
    }

    #[test]
    fn eof_is_produced_exactly_once_as_sentinel() {
        let mut src = CharSource::from_units("ab".encode_utf16().collect());
        assert_eq!(src.next(), 'a' as u32);
        assert_eq!(src.next(), 'b' as u32);
        assert_eq!(src.next(), EOF);
        assert!(src.eof_emitted());
        assert_eq!(src.next(), EOF);
    }

    #[test]
    fn push_back_rewinds_within_buffer() {
        let mut src = CharSource::from_units("abc".encode_utf16().collect());
        src.next();
        src.next();
        src.push_back(1);
        assert_eq!(src.next(), 'b' as u32);
    }

    #[test]
    fn invalid_utf8_is_substituted_and_reported() {
        let mut problems = Vec::new();
        let bytes = [b'a', 0xFF, b'b'];
        let src = CharSource::decode(&bytes, &EncodingOptions::default(), true, |p| {
            problems.push(p);
            OnError::Continue
        });
        assert_eq!(problems, vec![DecodeProblem::InvalidChar]);
        assert_eq!(src.units, vec!['a' as u16, 0xFFFD, 'b' as u16]);
    }
}
