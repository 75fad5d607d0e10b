use core::{fmt, str::FromStr};

use crate::{
    error::{Error, Result},
    range::ItemIdRange,
};

/// Smallest item id issued in the international namespace.
pub const MIN_INT_ITEM_ID: u64 = 100;
/// Largest item id issued in the international namespace (15 digits).
pub const MAX_INT_ITEM_ID: u64 = 999_999_999_999_999;
/// Smallest item id issued in an extension namespace.
pub const MIN_NAMESPACE_ITEM_ID: u64 = 1;
/// Largest item id issued in an extension namespace (8 digits, the namespace
/// itself takes another 7).
pub const MAX_NAMESPACE_ITEM_ID: u64 = 99_999_999;

/// Number of digits in an extension namespace identifier.
pub const NAMESPACE_LENGTH: usize = 7;

/// The authority issuing an identifier.
///
/// The international release owns [`Namespace::International`]; national and
/// vendor extensions each own a seven digit namespace identifier such as
/// `1000129`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub enum Namespace {
    #[default]
    International,
    Extension(String),
}

impl Namespace {
    /// Creates an extension namespace after validating its digits.
    ///
    /// # Errors
    /// Returns [`Error::InvalidNamespace`] unless `namespace` is exactly seven
    /// ASCII digits without a leading zero.
    pub fn extension(namespace: impl Into<String>) -> Result<Self> {
        let namespace = namespace.into();
        let reason = if namespace.len() != NAMESPACE_LENGTH {
            Some("must be exactly 7 digits")
        } else if !namespace.bytes().all(|b| b.is_ascii_digit()) {
            Some("must only contain digits")
        } else if namespace.starts_with('0') {
            Some("must not start with zero")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(Error::InvalidNamespace { namespace, reason }),
            None => Ok(Self::Extension(namespace)),
        }
    }

    /// Maps an optional namespace string to a [`Namespace`]. `None` and the
    /// empty string both denote the international namespace.
    pub fn from_option(namespace: Option<&str>) -> Result<Self> {
        match namespace {
            None | Some("") => Ok(Self::International),
            Some(namespace) => Self::extension(namespace),
        }
    }

    pub fn is_international(&self) -> bool {
        matches!(self, Self::International)
    }

    /// The extension namespace digits, or `None` for the international
    /// namespace.
    pub fn as_extension(&self) -> Option<&str> {
        match self {
            Self::International => None,
            Self::Extension(namespace) => Some(namespace),
        }
    }

    /// The closed range of item ids this namespace class may hand out.
    pub fn allowed_range(&self) -> ItemIdRange {
        match self {
            Self::International => ItemIdRange::new(MIN_INT_ITEM_ID, MAX_INT_ITEM_ID),
            Self::Extension(_) => ItemIdRange::new(MIN_NAMESPACE_ITEM_ID, MAX_NAMESPACE_ITEM_ID),
        }
    }

    /// First partition digit: `0` for international, `1` for extensions.
    pub fn partition_digit(&self) -> u8 {
        match self {
            Self::International => 0,
            Self::Extension(_) => 1,
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::International => f.write_str("INT"),
            Self::Extension(namespace) => f.write_str(namespace),
        }
    }
}

impl FromStr for Namespace {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::try_from(s.to_owned())
    }
}

impl TryFrom<String> for Namespace {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        match s.as_str() {
            "" | "INT" => Ok(Self::International),
            _ => Self::extension(s),
        }
    }
}

impl From<Namespace> for String {
    fn from(namespace: Namespace) -> Self {
        match namespace {
            Namespace::International => "INT".to_owned(),
            Namespace::Extension(namespace) => namespace,
        }
    }
}

/// The kind of terminology component an identifier denotes.
///
/// The discriminant is the second partition digit of the encoded identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[repr(u8)]
pub enum Category {
    Concept = 0,
    Description = 1,
    Relationship = 2,
}

impl Category {
    pub const ALL: [Self; 3] = [Self::Concept, Self::Description, Self::Relationship];

    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        Self::ALL.get(usize::from(ordinal)).copied()
    }

    /// The two digit partition identifier for this category in `namespace`,
    /// e.g. `"00"` for international concepts and `"12"` for extension
    /// relationships.
    pub fn partition_id(self, namespace: &Namespace) -> String {
        format!("{}{}", namespace.partition_digit(), self.ordinal())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Concept => "CONCEPT",
            Self::Description => "DESCRIPTION",
            Self::Relationship => "RELATIONSHIP",
        })
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "concept" => Ok(Self::Concept),
            "description" => Ok(Self::Description),
            "relationship" => Ok(Self::Relationship),
            _ => Err(Error::InvalidCategory {
                category: s.to_owned(),
            }),
        }
    }
}
