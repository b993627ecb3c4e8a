use std::fmt;

/// Shape of a generated local-part, kept alongside each candidate so reports
/// can say which convention matched.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocalPattern {
    /// `first.last`
    FirstDotLast,
    /// `flast`
    InitialLast,
    /// `firstlast`
    FirstLast,
    /// `f.last`
    InitialDotLast,
    /// `first`
    First,
    /// `first_last`
    FirstUnderscoreLast,
    /// `last.first`
    LastDotFirst,
}

impl LocalPattern {
    pub(crate) fn render(self, first: &str, last: &str) -> String {
        let initial = first.chars().next().map(String::from).unwrap_or_default();
        match self {
            Self::FirstDotLast => format!("{first}.{last}"),
            Self::InitialLast => format!("{initial}{last}"),
            Self::FirstLast => format!("{first}{last}"),
            Self::InitialDotLast => format!("{initial}.{last}"),
            Self::First => first.to_string(),
            Self::FirstUnderscoreLast => format!("{first}_{last}"),
            Self::LastDotFirst => format!("{last}.{first}"),
        }
    }
}

/// A fully qualified address proposed for probing.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub local: String,
    pub domain: String,
    pub pattern: LocalPattern,
}

impl Candidate {
    pub fn address(&self) -> String {
        format!("{}@{}", self.local, self.domain)
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.local, self.domain)
    }
}
