//! Free-text aircraft type → class label mapping

use crate::config::ClassRule;

/// Label assigned to 737 MAX family variants
pub const MAX_LABEL: &str = "B737 MAX";

/// Label assigned to 737 Next Generation variants
pub const NG_LABEL: &str = "B737 NG";

/// Variant strings that always denote the MAX family
const MAX_VARIANTS: [&str; 2] = ["737-8 MAX", "737-9 MAX"];

/// Result of mapping an aircraft type string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Coarse class label, e.g. "B737 NG"
    pub label: String,

    /// The full type text that was classified; subclass matching runs against it
    pub raw_type: String,
}

/// Ordered substring table mapping aircraft type text to class labels
#[derive(Debug, Clone)]
pub struct ClassTable {
    rules: Vec<ClassRule>,
}

impl ClassTable {
    /// Creates a table from rules in match order
    pub fn new(rules: Vec<ClassRule>) -> Self {
        Self { rules }
    }

    /// Returns the distinct class labels, in first-appearance order
    pub fn labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = Vec::new();
        for rule in &self.rules {
            if !labels.contains(&rule.label.as_str()) {
                labels.push(&rule.label);
            }
        }
        labels
    }

    /// Maps a free-text aircraft type to a class label
    ///
    /// MAX variants are resolved before the table is consulted: "737-8" and
    /// "737-9" are substrings of their MAX counterparts, so a plain table scan
    /// would file every MAX under the NG family. A bare "737-9" without "MAX"
    /// is pinned to the NG family for the same reason.
    ///
    /// Returns `None` when nothing matches; callers skip such entries.
    ///
    /// # Example
    ///
    /// ```
    /// use plane_harvest::classify::ClassTable;
    /// use plane_harvest::config::default_class_rules;
    ///
    /// let table = ClassTable::new(default_class_rules());
    /// let class = table.map_aircraft_type("Boeing 737-8 MAX").unwrap();
    /// assert_eq!(class.label, "B737 MAX");
    /// ```
    pub fn map_aircraft_type(&self, text: &str) -> Option<Classification> {
        let label = if MAX_VARIANTS.iter().any(|variant| text.contains(variant)) {
            MAX_LABEL
        } else if text.contains("737-9") && !text.contains("MAX") {
            NG_LABEL
        } else {
            self.rules
                .iter()
                .find(|rule| text.contains(rule.pattern.as_str()))
                .map(|rule| rule.label.as_str())?
        };

        Some(Classification {
            label: label.to_string(),
            raw_type: text.to_string(),
        })
    }
}
