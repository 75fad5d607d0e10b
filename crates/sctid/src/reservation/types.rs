use core::{
    fmt,
    ops::{Bound, RangeBounds},
};
use std::collections::BTreeSet;

use crate::{
    encoding::SctId,
    error::{Error, Result},
    namespace::{Category, Namespace},
    range::ItemIdRange,
};

/// An administrator-defined block of item ids that must never be allocated.
///
/// A reservation *affects* a `(namespace, category)` key when its namespace
/// filter is absent or equal to the key's namespace, and the category is in
/// its category set.
///
/// Bounds are stored as given. Open or unbounded reservations can be created
/// and queried with [`Reservation::includes`], but a sequential counter
/// refuses to start for any key they affect; see
/// [`Reservation::item_id_range`].
///
/// # Example
/// ```
/// use sctid::{Category, Namespace, Reservation};
///
/// let reservation = Reservation::range(200, 299, None, [Category::Concept]);
/// assert!(reservation.affects(&Namespace::International, Category::Concept));
/// assert!(!reservation.affects(&Namespace::International, Category::Description));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reservation {
    lower: Bound<u64>,
    upper: Bound<u64>,
    #[cfg_attr(feature = "serde", serde(default))]
    namespace: Option<Namespace>,
    categories: BTreeSet<Category>,
}

impl Reservation {
    /// A reservation of the closed range `[lower, upper]`.
    pub fn range(
        lower: u64,
        upper: u64,
        namespace: Option<Namespace>,
        categories: impl IntoIterator<Item = Category>,
    ) -> Self {
        Self::from_bounds(lower..=upper, namespace, categories)
    }

    /// A reservation over arbitrary bounds, e.g. `200..` or `..=500`.
    pub fn from_bounds(
        range: impl RangeBounds<u64>,
        namespace: Option<Namespace>,
        categories: impl IntoIterator<Item = Category>,
    ) -> Self {
        Self {
            lower: range.start_bound().cloned(),
            upper: range.end_bound().cloned(),
            namespace,
            categories: categories.into_iter().collect(),
        }
    }

    pub fn namespace(&self) -> Option<&Namespace> {
        self.namespace.as_ref()
    }

    pub fn categories(&self) -> &BTreeSet<Category> {
        &self.categories
    }

    pub fn affects(&self, namespace: &Namespace, category: Category) -> bool {
        self.namespace.as_ref().is_none_or(|filter| filter == namespace)
            && self.categories.contains(&category)
    }

    /// `true` if `id` lies inside this reservation for its own key.
    pub fn includes(&self, id: &SctId) -> bool {
        self.affects(id.namespace(), id.category()) && self.contains(&id.item_id())
    }

    /// The reserved block as a closed range.
    ///
    /// # Errors
    /// Returns [`Error::InvalidReservation`] if either bound is open or
    /// unbounded, or if the range is empty.
    pub fn item_id_range(&self, name: &str) -> Result<ItemIdRange> {
        let invalid = || Error::InvalidReservation {
            name: name.to_owned(),
            range: self.to_string(),
        };

        match (self.lower, self.upper) {
            (Bound::Included(lower), Bound::Included(upper)) => {
                ItemIdRange::try_new(lower, upper).ok_or_else(invalid)
            }
            _ => Err(invalid()),
        }
    }
}

impl RangeBounds<u64> for Reservation {
    fn start_bound(&self) -> Bound<&u64> {
        self.lower.as_ref()
    }

    fn end_bound(&self) -> Bound<&u64> {
        self.upper.as_ref()
    }
}

impl fmt::Display for Reservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.lower {
            Bound::Included(lower) => write!(f, "[{lower}..")?,
            Bound::Excluded(lower) => write!(f, "({lower}..")?,
            Bound::Unbounded => f.write_str("(-∞..")?,
        }
        match self.upper {
            Bound::Included(upper) => write!(f, "{upper}]"),
            Bound::Excluded(upper) => write!(f, "{upper})"),
            Bound::Unbounded => f.write_str("+∞)"),
        }
    }
}
