// ── Readings and their host encoding ──

use std::fmt;

use crate::error::ChannelError;

use super::ValueKind;

/// A value read from the appliance.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Flag(bool),
}

impl Value {
    /// Encode for the host according to the channel's kind.
    ///
    /// Numbers are rendered as decimals with at least one fractional digit
    /// (`20` becomes `"20.0"`), flags as `"On"`/`"Off"`, text verbatim.
    /// A value that does not match the kind, or a non-finite number, is a
    /// format failure.
    pub fn encode(&self, kind: ValueKind) -> Result<String, ChannelError> {
        match (kind, self) {
            (ValueKind::Numeric, Self::Number(n)) if n.is_finite() => Ok(format_decimal(*n)),
            (ValueKind::Text, Self::Text(s)) => Ok(s.clone()),
            (ValueKind::BooleanAsText, Self::Flag(on)) => {
                Ok(if *on { "On" } else { "Off" }.to_owned())
            }
            _ => Err(ChannelError::Format {
                kind,
                value: self.to_string(),
            }),
        }
    }
}

fn format_decimal(n: f64) -> String {
    // Debug formatting is shortest round-trip and always keeps a ".0" on
    // integral values; it only switches to exponent form far outside any
    // temperature range.
    let rendered = format!("{n:?}");
    if rendered.contains(['e', 'E']) {
        n.to_string()
    } else {
        rendered
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Flag(b) => write!(f, "{b}"),
        }
    }
}

/// Result of one attribute read for one cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    Present(Value),
    Absent,
}

impl Reading {
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }
}

impl From<Option<Value>> for Reading {
    fn from(value: Option<Value>) -> Self {
        value.map_or(Self::Absent, Self::Present)
    }
}
