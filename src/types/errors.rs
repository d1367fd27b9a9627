use std::fmt;

//------------ FibUpdateError ------------------------------------------------

/// Rejection reported by the FIB updater for one update batch.
///
/// This is the only error that crosses the RIB boundary: it is handed to
/// the failure callback registered with the update, and the RIB itself
/// stays untouched. The numeric code is defined by the updater; the RIB
/// passes it through verbatim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FibUpdateError {
    pub code: u32,
    pub message: String,
}

impl FibUpdateError {
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for FibUpdateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Error: FIB update rejected with code {}: {}",
            self.code, self.message
        )
    }
}

impl std::error::Error for FibUpdateError {}

//------------ NameParseError ------------------------------------------------

/// Possible errors while parsing a name from its URI form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NameParseError {
    /// The URI does not start with `/`.
    MissingLeadingSlash,
    /// The URI contains an empty component, e.g. `/a//b` or `/a/`.
    EmptyComponent,
    /// A percent escape is truncated or contains non-hex digits.
    InvalidPercentEscape,
}

impl fmt::Display for NameParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            NameParseError::MissingLeadingSlash => {
                write!(f, "Error: A name URI must start with '/'.")
            }
            NameParseError::EmptyComponent => {
                write!(f, "Error: A name URI cannot hold empty components.")
            }
            NameParseError::InvalidPercentEscape => {
                write!(
                    f,
                    "Error: A percent escape must consist of '%' and two \
                    hex digits."
                )
            }
        }
    }
}

impl std::error::Error for NameParseError {}
