/// The outcome of one named assertion against one response.
///
/// A failed check is data, not an error. It is reported and the run carries on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
}

impl CheckResult {
    pub fn new(name: impl Into<String>, passed: bool) -> Self {
        Self {
            name: name.into(),
            passed,
        }
    }

    pub fn pass(name: impl Into<String>) -> Self {
        Self::new(name, true)
    }

    pub fn fail(name: impl Into<String>) -> Self {
        Self::new(name, false)
    }
}
