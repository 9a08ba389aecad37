use std::{
    fmt,
    ops::{Add, AddAssign},
};

/// How many more values a subscriber is willing to accept.
///
/// Demand returned from [`Subscriber::receive`](crate::Subscriber::receive)
/// is *added* to whatever the subscriber already granted, it never replaces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Demand {
    Unbounded,
    Bounded(usize),
}

impl Demand {
    /// Request nothing (yet). This is not a cancellation.
    pub const NONE: Demand = Demand::Bounded(0);

    pub const fn bounded(count: usize) -> Self {
        Demand::Bounded(count)
    }

    pub const fn unbounded() -> Self {
        Demand::Unbounded
    }

    /// True when no further value may be delivered.
    pub const fn is_satisfied(&self) -> bool {
        matches!(self, Demand::Bounded(0))
    }

    /// Demand left after one value has been delivered.
    ///
    /// Delivering against satisfied demand is a publisher bug.
    pub(crate) fn consume_one(self) -> Self {
        match self {
            Demand::Unbounded => Demand::Unbounded,
            Demand::Bounded(count) => {
                debug_assert!(count > 0, "value delivered without outstanding demand");

                Demand::Bounded(count.saturating_sub(1))
            }
        }
    }
}

impl Default for Demand {
    fn default() -> Self {
        Demand::NONE
    }
}

impl Add for Demand {
    type Output = Demand;

    fn add(self, rhs: Demand) -> Demand {
        match (self, rhs) {
            (Demand::Bounded(lhs), Demand::Bounded(rhs)) => {
                Demand::Bounded(lhs.saturating_add(rhs))
            }
            _ => Demand::Unbounded,
        }
    }
}

impl AddAssign for Demand {
    fn add_assign(&mut self, rhs: Demand) {
        *self = *self + rhs;
    }
}

impl fmt::Display for Demand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Demand::Unbounded => write!(f, "unbounded"),
            Demand::Bounded(count) => write!(f, "max({})", count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_saturates_to_unbounded() {
        assert_eq!(Demand::bounded(2) + Demand::bounded(3), Demand::bounded(5));
        assert_eq!(Demand::bounded(2) + Demand::unbounded(), Demand::Unbounded);
        assert_eq!(Demand::unbounded() + Demand::NONE, Demand::Unbounded);
        assert_eq!(
            Demand::bounded(usize::MAX) + Demand::bounded(1),
            Demand::bounded(usize::MAX)
        );
    }

    #[test]
    fn test_none_is_satisfied_but_not_unbounded() {
        assert!(Demand::NONE.is_satisfied());
        assert!(Demand::bounded(0).is_satisfied());
        assert!(!Demand::bounded(1).is_satisfied());
        assert!(!Demand::unbounded().is_satisfied());
    }

    #[test]
    fn test_consume_one() {
        let mut demand = Demand::bounded(2);

        demand = demand.consume_one();
        assert_eq!(demand, Demand::bounded(1));

        demand = demand.consume_one();
        assert!(demand.is_satisfied());

        assert_eq!(Demand::Unbounded.consume_one(), Demand::Unbounded);
    }

    #[test]
    fn test_display() {
        assert_eq!(Demand::bounded(3).to_string(), "max(3)");
        assert_eq!(Demand::unbounded().to_string(), "unbounded");
    }
}
