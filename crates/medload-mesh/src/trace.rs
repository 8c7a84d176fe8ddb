//! Element path tracking for the streaming vocabulary parsers.

/// Stack of open element names, rendered as a dot-joined path for matching
/// against the handful of locations the parsers care about.
#[derive(Default)]
pub(crate) struct Trace {
    tags: Vec<String>,
}

impl Trace {
    pub fn push(&mut self, tag: String) {
        self.tags.push(tag);
    }

    pub fn pop(&mut self) {
        self.tags.pop();
    }

    pub fn path(&self) -> String {
        self.tags.join(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_joins_open_tags() {
        let mut trace = Trace::default();
        trace.push("A".into());
        trace.push("B".into());
        assert_eq!(trace.path(), "A.B");
        trace.pop();
        assert_eq!(trace.path(), "A");
    }
}
