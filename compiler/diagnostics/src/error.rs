//! Error handling mechanisms.

pub type Result<T = (), E = ErasedReportedError> = std::result::Result<T, E>;

/// A witness to / token for a reported error.
///
/// A value of this type is a proof that an error was reported (neglecting buffering
/// and silent reporters). Using this as an error type instead of `()` makes it a bit
/// harder to accidentally return an error without reporting anything.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ErasedReportedError(());

impl ErasedReportedError {
    pub(crate) const fn new() -> Self {
        Self(())
    }

    pub const fn new_unchecked() -> Self {
        Self::new()
    }
}

/// A value accompanied by a [`Health`].
#[derive(Debug)]
#[must_use]
pub struct Outcome<T> {
    pub bare: T,
    pub health: Health,
}

impl<T> Outcome<T> {
    pub const fn new(bare: T, health: Health) -> Self {
        Self { bare, health }
    }

    pub const fn untainted(bare: T) -> Self {
        Self::new(bare, Health::Untainted)
    }

    pub const fn tainted(bare: T, error: ErasedReportedError) -> Self {
        Self::new(bare, Health::Tainted(error))
    }
}

impl<T> From<Outcome<T>> for Result<T> {
    fn from(outcome: Outcome<T>) -> Self {
        match outcome.health {
            Health::Untainted => Ok(outcome.bare),
            Health::Tainted(error) => Err(error),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[must_use]
pub enum Health {
    #[default]
    Untainted,
    Tainted(ErasedReportedError),
}

impl Health {
    pub fn taint(&mut self, error: ErasedReportedError) {
        if let Self::Untainted = self {
            *self = Self::Tainted(error);
        }
    }

    pub const fn is_untainted(self) -> bool {
        matches!(self, Self::Untainted)
    }
}

impl From<Result> for Health {
    fn from(result: Result) -> Self {
        match result {
            Ok(()) => Self::Untainted,
            Err(error) => Self::Tainted(error),
        }
    }
}

impl From<Health> for Result {
    fn from(health: Health) -> Self {
        match health {
            Health::Untainted => Ok(()),
            Health::Tainted(error) => Err(error),
        }
    }
}

/// Incorporate an erroneous result into a health value and keep going.
pub trait Stain<T> {
    fn stain(self, health: &mut Health) -> T;
}

impl<T: PossiblyErroneous> Stain<T> for Result<T> {
    fn stain(self, health: &mut Health) -> T {
        match self {
            Ok(value) => value,
            Err(error) => {
                health.taint(error);
                T::error(error)
            }
        }
    }
}

impl Stain<()> for Result {
    fn stain(self, health: &mut Health) {
        if let Err(error) = self {
            health.taint(error);
        }
    }
}

pub trait PossiblyErroneous {
    fn error(error: ErasedReportedError) -> Self;
}

impl PossiblyErroneous for ErasedReportedError {
    fn error(error: ErasedReportedError) -> Self {
        error
    }
}
