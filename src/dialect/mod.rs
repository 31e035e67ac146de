//! The two NIPL script dialects: the one-shot "v1" form and the full
//! imperative "v2" form with conditionals. See spec.md §4.5 and the v2
//! grammar in §6.

pub mod v1;
pub mod v2;

use crate::descriptor::ResolvedDescriptor;

/// What running a phase's script body resulted in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialectOutcome {
    /// `play` (or v1's no-regex terminal line): the session is done.
    Play(ResolvedDescriptor),
    /// `report`: re-query the processor for the next phase.
    Advance,
}
