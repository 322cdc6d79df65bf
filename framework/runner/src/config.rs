use std::time::Duration;

use anyhow::bail;

/// The resolved shape of a run: how many virtual users, and for how long.
///
/// Built once before any virtual user starts and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunConfig {
    virtual_users: usize,
    duration: Option<Duration>,
}

impl RunConfig {
    /// A `duration` of `None` runs until the run is stopped, as a soak test.
    pub fn new(virtual_users: usize, duration: Option<Duration>) -> anyhow::Result<Self> {
        if virtual_users == 0 {
            bail!("At least one virtual user is required");
        }

        if duration == Some(Duration::ZERO) {
            bail!("Run duration must be greater than zero");
        }

        Ok(Self {
            virtual_users,
            duration,
        })
    }

    pub fn virtual_users(&self) -> usize {
        self.virtual_users
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    pub fn is_soak(&self) -> bool {
        self.duration.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reject_zero_virtual_users() {
        assert!(RunConfig::new(0, Some(Duration::from_secs(10))).is_err());
    }

    #[test]
    fn reject_zero_duration() {
        assert!(RunConfig::new(1, Some(Duration::ZERO)).is_err());
    }

    #[test]
    fn soak_has_no_duration() {
        let config = RunConfig::new(3, None).unwrap();
        assert!(config.is_soak());
        assert_eq!(3, config.virtual_users());
    }
}
