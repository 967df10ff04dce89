//! Subclass lookup for balanced sampling within a class

use crate::config::SubclassGroup;

/// The first subclass found in a type string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubclassMatch {
    pub group: String,
    pub subclass: String,
}

impl SubclassMatch {
    /// Composite counter key, `"<group>:<subclass>"`
    pub fn key(&self) -> String {
        format!("{}:{}", self.group, self.subclass)
    }
}

/// Ordered subclass groups
#[derive(Debug, Clone)]
pub struct SubclassTable {
    groups: Vec<SubclassGroup>,
}

impl SubclassTable {
    pub fn new(groups: Vec<SubclassGroup>) -> Self {
        Self { groups }
    }

    pub fn groups(&self) -> &[SubclassGroup] {
        &self.groups
    }

    /// Finds the first subclass contained in `text`
    ///
    /// Groups are scanned in order, and subclasses in order within each group;
    /// the first hit ends the search even if a later group would also match.
    /// With the default tables, "737-8 MAX" therefore resolves to the NG group's
    /// "737-8" subclass.
    pub fn find_subclass(&self, text: &str) -> Option<SubclassMatch> {
        self.groups.iter().find_map(|group| {
            group
                .subclasses
                .iter()
                .find(|subclass| text.contains(subclass.as_str()))
                .map(|subclass| SubclassMatch {
                    group: group.group.clone(),
                    subclass: subclass.clone(),
                })
        })
    }

    /// Per-subclass quota for a group: the class limit split evenly, rounded down
    ///
    /// Returns `None` for unknown groups.
    pub fn target(&self, group: &str, limit_per_class: u32) -> Option<u32> {
        self.groups
            .iter()
            .find(|g| g.group == group)
            .map(|g| limit_per_class / g.subclasses.len().max(1) as u32)
    }
}
