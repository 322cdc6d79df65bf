/// Return this error from a virtual user's behaviour to stop that virtual user.
///
/// Use it for conditions the virtual user cannot recover from by simply trying the next
/// iteration. Ordinary request failures should be recorded as failed checks instead, so that the
/// virtual user keeps generating load. Other virtual users are not affected.
#[derive(derive_more::Error, derive_more::Display, Debug)]
#[display("Virtual user is bailing: {reason}")]
pub struct VuBailError {
    reason: String,
}

impl VuBailError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Default for VuBailError {
    fn default() -> Self {
        Self::new("no reason given")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bail_error_is_detectable_through_anyhow() {
        let err: anyhow::Error = VuBailError::new("target gone").into();
        assert!(err.is::<VuBailError>());
        assert_eq!("Virtual user is bailing: target gone", err.to_string());
    }
}
