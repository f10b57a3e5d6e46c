// SPDX-License-Identifier: GPL-3.0-only

//! Location labels for order metadata
//!
//! Location is best effort. When a provider has nothing to offer the order
//! records [`UNKNOWN_LOCATION`].

pub use crate::constants::UNKNOWN_LOCATION;

/// Supplies a human readable location for the station
pub trait LocationProvider: Send {
    /// Current location label, or None when unknown
    fn current_label(&self) -> Option<String>;

    /// Current label with the unknown fallback applied
    fn label_or_unknown(&self) -> String {
        self.current_label()
            .map(|label| label.trim().to_string())
            .filter(|label| !label.is_empty())
            .unwrap_or_else(|| UNKNOWN_LOCATION.to_string())
    }
}

/// A label configured once for the station (e.g. "Warehouse 2, bench 4")
#[derive(Debug, Clone, Default)]
pub struct FixedLocation {
    label: Option<String>,
}

impl FixedLocation {
    pub fn new(label: Option<String>) -> Self {
        Self { label }
    }
}

impl LocationProvider for FixedLocation {
    fn current_label(&self) -> Option<String> {
        self.label.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_label_is_unknown() {
        assert_eq!(FixedLocation::default().label_or_unknown(), UNKNOWN_LOCATION);
    }

    #[test]
    fn test_blank_label_is_unknown() {
        let location = FixedLocation::new(Some("   ".to_string()));
        assert_eq!(location.label_or_unknown(), UNKNOWN_LOCATION);
    }

    #[test]
    fn test_configured_label_is_used() {
        let location = FixedLocation::new(Some("Bench 4".to_string()));
        assert_eq!(location.label_or_unknown(), "Bench 4");
    }
}
