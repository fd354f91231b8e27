use std::{fmt::Display, ops::Deref};

use chrono::Duration;

/// Share of a whole, in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Percentage(f64);

impl Display for Percentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.0}%", self.0)
    }
}

impl Percentage {
    pub const ZERO: Percentage = Percentage(0.);
}

impl Deref for Percentage {
    type Target = f64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// How much of `whole` was active. Active time is clamped into `[0, whole]` and an empty whole
/// gives zero.
pub fn activity_percentage(active: Duration, whole: Duration) -> Percentage {
    if whole <= Duration::zero() {
        return Percentage::ZERO;
    }
    let active = active.clamp(Duration::zero(), whole);
    let ratio = active.num_milliseconds() as f64 / whole.num_milliseconds().max(1) as f64;
    Percentage(ratio.clamp(0., 1.) * 100.)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::{activity_percentage, Percentage};

    #[test]
    fn activity_percentage_clamps() {
        assert_eq!(
            *activity_percentage(Duration::seconds(30), Duration::seconds(60)),
            50.
        );
        assert_eq!(
            *activity_percentage(Duration::seconds(90), Duration::seconds(60)),
            100.
        );
        assert_eq!(
            activity_percentage(Duration::seconds(5), Duration::zero()),
            Percentage::ZERO
        );
        assert_eq!(
            activity_percentage(Duration::seconds(1), Duration::seconds(3)).to_string(),
            "33%"
        );
    }
}
