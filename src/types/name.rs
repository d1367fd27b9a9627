use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::types::errors::NameParseError;

//------------ NameComponent -------------------------------------------------

/// One opaque byte-string component of a [`Name`].
///
/// Components order canonically: a shorter component sorts before a longer
/// one, components of equal length compare byte-wise. This is what keeps
/// all descendants of a prefix in one contiguous run of an ordered table.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct NameComponent(Vec<u8>);

impl NameComponent {
    pub fn new(value: impl Into<Vec<u8>>) -> Self {
        Self(value.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Decodes one URI segment, resolving `%XX` escapes.
    fn from_escaped(segment: &str) -> Result<Self, NameParseError> {
        let raw = segment.as_bytes();
        let mut bytes = Vec::with_capacity(raw.len());
        let mut i = 0;
        while i < raw.len() {
            if raw[i] == b'%' {
                let hi = raw.get(i + 1).copied().and_then(hex_value);
                let lo = raw.get(i + 2).copied().and_then(hex_value);
                match (hi, lo) {
                    (Some(hi), Some(lo)) => bytes.push(hi << 4 | lo),
                    _ => return Err(NameParseError::InvalidPercentEscape),
                }
                i += 3;
            } else {
                bytes.push(raw[i]);
                i += 1;
            }
        }
        Ok(Self(bytes))
    }
}

impl From<&str> for NameComponent {
    fn from(value: &str) -> Self {
        Self(value.as_bytes().to_vec())
    }
}

impl Ord for NameComponent {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for NameComponent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for NameComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if is_unescaped(b) {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "%{:02X}", b)?;
            }
        }
        Ok(())
    }
}

fn is_unescaped(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~')
}

fn hex_value(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|v| v as u8)
}

//------------ Name ----------------------------------------------------------

/// A hierarchical identifier: an ordered sequence of opaque components.
///
/// Names compare component-wise lexicographically, using the canonical
/// component order of [`NameComponent`]. A name is a prefix of another iff
/// it is no longer and all its components match position-wise. The empty
/// name (`/`) is a valid name and a prefix of every name.
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Name {
    components: Vec<NameComponent>,
}

impl Name {
    /// The zero-length name, written `/`.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_components(components: Vec<NameComponent>) -> Self {
        Self { components }
    }

    pub fn components(&self) -> &[NameComponent] {
        &self.components
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&NameComponent> {
        self.components.get(i)
    }

    /// Returns this name extended by one component.
    #[must_use]
    pub fn append(&self, component: impl Into<NameComponent>) -> Self {
        let mut components = self.components.clone();
        components.push(component.into());
        Self { components }
    }

    /// The first `n` components as a new name. `n` is clamped to the
    /// length of this name, so `get_prefix(len())` is the name itself.
    pub fn get_prefix(&self, n: usize) -> Self {
        Self {
            components: self.components[..n.min(self.components.len())]
                .to_vec(),
        }
    }

    pub fn is_prefix_of(&self, other: &Name) -> bool {
        self.components.len() <= other.components.len()
            && self
                .components
                .iter()
                .zip(&other.components)
                .all(|(a, b)| a == b)
    }
}

impl FromStr for Name {
    type Err = NameParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix('/')
            .ok_or(NameParseError::MissingLeadingSlash)?;
        if rest.is_empty() {
            return Ok(Self::root());
        }
        let mut components = Vec::new();
        for segment in rest.split('/') {
            if segment.is_empty() {
                return Err(NameParseError::EmptyComponent);
            }
            components.push(NameComponent::from_escaped(segment)?);
        }
        Ok(Self { components })
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components.is_empty() {
            return write!(f, "/");
        }
        for component in &self.components {
            write!(f, "/{}", component)?;
        }
        Ok(())
    }
}
