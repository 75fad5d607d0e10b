use core::{fmt, str::FromStr};

use super::verhoeff;
use crate::{
    error::{Error, Result},
    namespace::{Category, NAMESPACE_LENGTH, Namespace},
};

/// Shortest valid identifier: three item id digits, partition and check digit.
pub const MIN_SCTID_LENGTH: usize = 6;
/// Longest valid identifier.
pub const MAX_SCTID_LENGTH: usize = 18;

/// Partition digits plus check digit.
const SUFFIX_LENGTH: usize = 3;

/// The decoded components of a SNOMED CT identifier.
///
/// The textual form is `item id ‖ [namespace] ‖ partition ‖ check digit`, with
/// the namespace digits present only for extension identifiers. Formatting
/// with [`Display`](fmt::Display) appends the Verhoeff check digit, and
/// [`FromStr`] validates length, digits, partition and check digit.
///
/// # Example
/// ```
/// use sctid::{Category, Namespace, SctId};
///
/// let id = SctId::new(Namespace::International, Category::Concept, 100);
/// assert_eq!(id.to_string(), "100005");
///
/// let parsed: SctId = "11000129102".parse().unwrap();
/// assert_eq!(parsed.item_id(), 1);
/// assert_eq!(parsed.namespace().as_extension(), Some("1000129"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SctId {
    namespace: Namespace,
    category: Category,
    item_id: u64,
}

impl SctId {
    pub fn new(namespace: Namespace, category: Category, item_id: u64) -> Self {
        Self {
            namespace,
            category,
            item_id,
        }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn item_id(&self) -> u64 {
        self.item_id
    }

    /// Two digit partition identifier, see [`Category::partition_id`].
    pub fn partition_id(&self) -> String {
        self.category.partition_id(&self.namespace)
    }

    /// The identifier without its check digit.
    fn body(&self) -> String {
        match self.namespace.as_extension() {
            None => format!("{}{}", self.item_id, self.partition_id()),
            Some(namespace) => format!("{}{namespace}{}", self.item_id, self.partition_id()),
        }
    }
}

impl fmt::Display for SctId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = self.body();
        let check = verhoeff::check_digit(body.as_bytes());
        write!(f, "{body}{check}")
    }
}

impl FromStr for SctId {
    type Err = Error;

    fn from_str(id: &str) -> Result<Self> {
        let bytes = id.as_bytes();

        if !(MIN_SCTID_LENGTH..=MAX_SCTID_LENGTH).contains(&bytes.len()) {
            return Err(Error::invalid_identifier(id, "length must be between 6 and 18 digits"));
        }
        if !bytes.iter().all(u8::is_ascii_digit) {
            return Err(Error::invalid_identifier(id, "must only contain digits"));
        }
        if bytes[0] == b'0' {
            return Err(Error::invalid_identifier(id, "must not start with zero"));
        }
        if !verhoeff::is_valid(bytes) {
            return Err(Error::invalid_identifier(id, "check digit mismatch"));
        }

        let partition = &bytes[bytes.len() - SUFFIX_LENGTH..bytes.len() - 1];
        let category = Category::from_ordinal(partition[1] - b'0')
            .ok_or_else(|| Error::invalid_identifier(id, "unknown partition"))?;

        let (namespace, item_digits) = match partition[0] {
            b'0' => (Namespace::International, &id[..id.len() - SUFFIX_LENGTH]),
            b'1' => {
                let namespace_start = id
                    .len()
                    .checked_sub(SUFFIX_LENGTH + NAMESPACE_LENGTH + 1)
                    .ok_or_else(|| Error::invalid_identifier(id, "too short for an extension identifier"))?
                    + 1;
                let namespace_end = id.len() - SUFFIX_LENGTH;
                let namespace = Namespace::extension(&id[namespace_start..namespace_end])
                    .map_err(|_| Error::invalid_identifier(id, "malformed namespace"))?;
                (namespace, &id[..namespace_start])
            }
            _ => return Err(Error::invalid_identifier(id, "unknown partition")),
        };

        let item_id = item_digits
            .parse::<u64>()
            .map_err(|_| Error::invalid_identifier(id, "malformed item identifier"))?;

        Ok(Self::new(namespace, category, item_id))
    }
}
