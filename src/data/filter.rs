use chrono::NaiveDate;

use super::model::{BookingRecord, DATE_FORMAT, Dataset};

// ---------------------------------------------------------------------------
// Filter predicate: optional constraint per dimension
// ---------------------------------------------------------------------------

/// User-chosen constraints. `None` means "no constraint on that dimension".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl FilterCriteria {
    pub fn is_unconstrained(&self) -> bool {
        *self == FilterCriteria::default()
    }

    /// Whether `booking` satisfies every supplied constraint.
    ///
    /// * origin / destination: exact, case-sensitive equality
    /// * date window: `date_from <= departure_date <= date_to`, both inclusive
    pub fn matches(&self, booking: &BookingRecord) -> bool {
        if let Some(origin) = &self.origin {
            if booking.origin != *origin {
                return false;
            }
        }
        if let Some(destination) = &self.destination {
            if booking.destination != *destination {
                return false;
            }
        }
        if let Some(from) = self.date_from {
            if booking.departure_date < from {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if booking.departure_date > to {
                return false;
            }
        }
        true
    }

    /// Short human-readable summary, e.g. for the status line.
    pub fn describe(&self) -> String {
        if self.is_unconstrained() {
            return "all bookings".to_string();
        }
        let mut parts = Vec::new();
        if let Some(origin) = &self.origin {
            parts.push(format!("from {origin}"));
        }
        if let Some(destination) = &self.destination {
            parts.push(format!("to {destination}"));
        }
        match (self.date_from, self.date_to) {
            (Some(from), Some(to)) => parts.push(format!(
                "departing {} – {}",
                from.format(DATE_FORMAT),
                to.format(DATE_FORMAT)
            )),
            (Some(from), None) => parts.push(format!("departing on/after {}", from.format(DATE_FORMAT))),
            (None, Some(to)) => parts.push(format!("departing on/before {}", to.format(DATE_FORMAT))),
            (None, None) => {}
        }
        parts.join(", ")
    }
}

// ---------------------------------------------------------------------------
// FilteredView: dataset reference + surviving row indices
// ---------------------------------------------------------------------------

/// An ordered subset of a dataset. Indices ascend, so the original relative
/// order of the bookings is preserved.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    dataset: &'a Dataset,
    indices: Vec<usize>,
}

impl<'a> FilteredView<'a> {
    /// Narrow this view further; the result is again a stable subset.
    pub fn refine(&self, criteria: &FilterCriteria) -> FilteredView<'a> {
        FilteredView {
            dataset: self.dataset,
            indices: select(self.dataset, self.indices.iter().copied(), criteria),
        }
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// The `n`-th booking of the view, in dataset order.
    pub fn get(&self, n: usize) -> Option<&'a BookingRecord> {
        self.indices.get(n).map(|&i| &self.dataset.bookings[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a BookingRecord> + '_ {
        let bookings = &self.dataset.bookings;
        self.indices.iter().map(move |&i| &bookings[i])
    }
}

/// Apply `criteria` to the whole dataset.
pub fn filter<'a>(dataset: &'a Dataset, criteria: &FilterCriteria) -> FilteredView<'a> {
    FilteredView {
        dataset,
        indices: select(dataset, 0..dataset.len(), criteria),
    }
}

fn select(dataset: &Dataset, candidates: impl Iterator<Item = usize>, criteria: &FilterCriteria) -> Vec<usize> {
    // An inverted window can never match.
    if let (Some(from), Some(to)) = (criteria.date_from, criteria.date_to) {
        if from > to {
            return Vec::new();
        }
    }
    candidates
        .filter(|&i| criteria.matches(&dataset.bookings[i]))
        .collect()
}
