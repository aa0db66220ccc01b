/// The attribute groups a mutation touched. Returned by every mutator and
/// accumulated by the sync layer, so what changed is a value rather than a
/// flag hidden on the node.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Changes {
    groups: Vec<u8>,
}

impl Changes {
    /// Nothing changed
    pub fn none() -> Self {
        Self::default()
    }

    /// A single group changed
    pub fn group(group: u8) -> Self {
        Self::none().with(group)
    }

    pub fn with(mut self, group: u8) -> Self {
        self.add(group);
        self
    }

    pub fn add(&mut self, group: u8) {
        if !self.groups.contains(&group) {
            self.groups.push(group);
        }
    }

    pub fn merge(&mut self, other: &Changes) {
        for group in &other.groups {
            self.add(*group);
        }
    }

    pub fn groups(&self) -> &[u8] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
