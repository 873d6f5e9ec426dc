//! First-class invariants for the tile registry.
//!
//! Invariants are logical properties that must hold after every mutation.
//! They are testable independently and serve as documentation of what the
//! registry guarantees.

/// A logical property that must hold for a given state.
pub trait Invariant<S> {
    /// Checks if the invariant holds for the given state.
    fn holds(state: &S) -> bool;

    /// Human-readable description of the invariant.
    fn description() -> &'static str;
}

/// Violation of an invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub description: String,
}

impl InvariantViolation {
    /// Creates a new invariant violation.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// A set of invariants that can be checked together.
///
/// Implemented for tuples so sets compose without boxing.
pub trait InvariantSet<S> {
    /// Checks all invariants in the set.
    ///
    /// Returns every violation rather than stopping at the first.
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>>;
}

/// The violation reported by `I` for `state`, if any.
fn violation_of<S, I: Invariant<S>>(state: &S) -> Option<InvariantViolation> {
    (!I::holds(state)).then(|| InvariantViolation::new(I::description()))
}

fn collect_violations(
    checks: impl IntoIterator<Item = Option<InvariantViolation>>,
) -> Result<(), Vec<InvariantViolation>> {
    let violations: Vec<_> = checks.into_iter().flatten().collect();
    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

impl<S, I1, I2, I3> InvariantSet<S> for (I1, I2, I3)
where
    I1: Invariant<S>,
    I2: Invariant<S>,
    I3: Invariant<S>,
{
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
        collect_violations([
            violation_of::<S, I1>(state),
            violation_of::<S, I2>(state),
            violation_of::<S, I3>(state),
        ])
    }
}

impl<S, I1, I2> InvariantSet<S> for (I1, I2)
where
    I1: Invariant<S>,
    I2: Invariant<S>,
{
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
        collect_violations([violation_of::<S, I1>(state), violation_of::<S, I2>(state)])
    }
}

pub mod correct_slots;
pub mod current_slots;
pub mod slot_index;

pub use correct_slots::CorrectSlotsPermutation;
pub use current_slots::CurrentSlotsPermutation;
pub use slot_index::SlotIndexConsistent;

/// All registry invariants as a composable set.
pub type RegistryInvariants = (
    CurrentSlotsPermutation,
    CorrectSlotsPermutation,
    SlotIndexConsistent,
);

/// True when `values` holds every integer in `[0, values.len())` once.
pub(crate) fn is_permutation(values: impl ExactSizeIterator<Item = usize>) -> bool {
    let mut seen = vec![false; values.len()];
    for value in values {
        match seen.get_mut(value) {
            Some(flag) if !*flag => *flag = true,
            _ => return false,
        }
    }
    true
}
