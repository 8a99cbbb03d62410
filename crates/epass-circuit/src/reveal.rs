//! # Selective Disclosure
//!
//! A [`RevealPolicy`] names the MRZ character positions a verifier is
//! allowed to see. It is turned into a fixed-length [`RevealBitmap`], one
//! flag per MRZ character, that the circuit multiplies into its public
//! output. Positions are indices into the canonical MRZ characters, not the
//! DG1 preimage.

use serde::{Deserialize, Serialize};

use epass_core::{MrzField, MrzFormat, PassportError};

/// Bitmap length of the reference TD3 circuit.
pub const REFERENCE_REVEAL_LENGTH: usize = 88;

/// Inclusive position range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealRange {
    /// First revealed position.
    pub start: usize,
    /// Last revealed position (inclusive).
    pub end: usize,
}

/// Which MRZ positions to disclose.
///
/// The union of `positions`, `ranges` and the ranges of `fields` is revealed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RevealPolicy {
    /// Individual positions.
    pub positions: Vec<usize>,
    /// Inclusive ranges.
    pub ranges: Vec<RevealRange>,
    /// Named fields, resolved against the document format.
    pub fields: Vec<MrzField>,
}

impl RevealPolicy {
    /// Reveal nothing.
    pub fn none() -> Self {
        Self::default()
    }

    /// The reference circuit's policy: positions 16 through 22.
    pub fn reference() -> Self {
        Self::none().with_range(16, 22)
    }

    /// Add one position.
    pub fn with_position(mut self, position: usize) -> Self {
        self.positions.push(position);
        self
    }

    /// Add an inclusive range.
    pub fn with_range(mut self, start: usize, end: usize) -> Self {
        self.ranges.push(RevealRange { start, end });
        self
    }

    /// Add a named field.
    pub fn with_field(mut self, field: MrzField) -> Self {
        self.fields.push(field);
        self
    }

    /// Resolve to a bitmap of `length` flags for an MRZ of `format`.
    ///
    /// # Errors
    ///
    /// [`PassportError::MalformedInput`] for a position at or past `length`,
    /// an inverted range, or a field the format does not have.
    pub fn bitmap(&self, format: MrzFormat, length: usize) -> Result<RevealBitmap, PassportError> {
        let outside = |p: usize| {
            PassportError::malformed(format!(
                "reveal position {p} outside bitmap of length {length}"
            ))
        };
        let mut flags = vec![false; length];

        for &p in &self.positions {
            *flags.get_mut(p).ok_or_else(|| outside(p))? = true;
        }
        for r in &self.ranges {
            if r.start > r.end {
                return Err(PassportError::malformed(format!(
                    "reveal range {}..={} is inverted",
                    r.start, r.end
                )));
            }
            if r.end >= length {
                return Err(outside(r.end));
            }
            flags[r.start..=r.end].fill(true);
        }
        for field in &self.fields {
            let range = field.range(format).ok_or_else(|| {
                PassportError::malformed(format!("{format} MRZ has no {field:?} field"))
            })?;
            if range.end > length {
                return Err(outside(range.end.saturating_sub(1)));
            }
            flags[range].fill(true);
        }

        Ok(RevealBitmap(flags))
    }
}

/// One disclosure flag per MRZ character. Immutable once built.
///
/// Serializes as `"0"`/`"1"` strings, the circuit's textual input form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealBitmap(Vec<bool>);

impl RevealBitmap {
    /// Number of flags.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for a zero-length bitmap.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `position` is disclosed. Out-of-range positions are not.
    pub fn is_revealed(&self, position: usize) -> bool {
        self.0.get(position).copied().unwrap_or(false)
    }

    /// Disclosed positions in ascending order.
    pub fn revealed_positions(&self) -> Vec<usize> {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.then_some(i))
            .collect()
    }

    /// `"0"`/`"1"` per flag.
    pub fn to_strings(&self) -> Vec<String> {
        self.0
            .iter()
            .map(|r| if *r { "1" } else { "0" }.to_string())
            .collect()
    }

    /// Parse `"0"`/`"1"` strings.
    pub fn from_strings<S: AsRef<str>>(flags: &[S]) -> Result<Self, PassportError> {
        flags
            .iter()
            .enumerate()
            .map(|(i, f)| match f.as_ref() {
                "0" => Ok(false),
                "1" => Ok(true),
                other => Err(PassportError::malformed(format!(
                    "reveal flag {i} is {other:?}, expected \"0\" or \"1\""
                ))),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

impl Serialize for RevealBitmap {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_strings().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RevealBitmap {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let flags = Vec::<String>::deserialize(deserializer)?;
        Self::from_strings(&flags).map_err(serde::de::Error::custom)
    }
}

/// Decode the revealed MRZ characters from a proof's public signals.
///
/// The first `length` signals are the masked MRZ: a character code where
/// revealed, `0` where hidden.
///
/// # Errors
///
/// [`PassportError::MalformedInput`] if there are fewer than `length`
/// signals, or a signal is not a decimal character code in the MRZ alphabet.
pub fn decode_revealed<S: AsRef<str>>(
    public_signals: &[S],
    length: usize,
) -> Result<Vec<Option<char>>, PassportError> {
    if public_signals.len() < length {
        return Err(PassportError::malformed(format!(
            "expected at least {length} public signals, got {}",
            public_signals.len()
        )));
    }
    public_signals[..length]
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let s = s.as_ref();
            let code: u8 = s.trim().parse().map_err(|_| {
                PassportError::malformed(format!("public signal {i} is not a character code: {s:?}"))
            })?;
            match code {
                0 => Ok(None),
                b'0'..=b'9' | b'A'..=b'Z' | b'<' => Ok(Some(char::from(code))),
                _ => Err(PassportError::malformed(format!(
                    "public signal {i} ({code}) is not an MRZ character"
                ))),
            }
        })
        .collect()
}

/// Render decoded characters, hidden positions as `*`.
pub fn render_revealed(chars: &[Option<char>]) -> String {
    chars.iter().map(|c| c.unwrap_or('*')).collect()
}
