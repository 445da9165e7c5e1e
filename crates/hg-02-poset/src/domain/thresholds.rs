//! Byzantine agreement thresholds.

/// ⌊2n/3⌋ + 1.
pub fn super_majority(participants: usize) -> usize {
    2 * participants / 3 + 1
}

/// ⌈n/3⌉.
pub fn trust_count(participants: usize) -> usize {
    participants.div_ceil(3)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Thresholds {
    pub participants: usize,
    pub super_majority: usize,
    pub trust_count: usize,
}

impl Thresholds {
    pub fn for_participants(participants: usize) -> Self {
        Self {
            participants,
            super_majority: super_majority(participants),
            trust_count: trust_count(participants),
        }
    }
}
