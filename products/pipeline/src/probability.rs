//! Win probability derived from a stage name.

pub const LEAD: &str = "Lead";
pub const QUALIFIED: &str = "Qualified";
pub const PROPOSAL: &str = "Proposal";
pub const NEGOTIATION: &str = "Negotiation";
pub const CLOSED_WON: &str = "Closed Won";
pub const CLOSED_LOST: &str = "Closed Lost";

/// Probability used for stages outside the canonical set.
pub const CUSTOM_STAGE_PROBABILITY: u8 = 50;

/// Canonical stages in funnel order with their probabilities.
pub const CANONICAL_STAGES: [(&str, u8); 6] = [
    (LEAD, 20),
    (QUALIFIED, 40),
    (PROPOSAL, 60),
    (NEGOTIATION, 80),
    (CLOSED_WON, 100),
    (CLOSED_LOST, 0),
];

/// Exact, case-sensitive lookup; any other name is a custom stage.
pub fn probability_for_stage(stage_name: &str) -> u8 {
    match stage_name {
        LEAD => 20,
        QUALIFIED => 40,
        PROPOSAL => 60,
        NEGOTIATION => 80,
        CLOSED_WON => 100,
        CLOSED_LOST => 0,
        _ => CUSTOM_STAGE_PROBABILITY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_stages_map_to_fixed_values() {
        for (name, expected) in CANONICAL_STAGES {
            assert_eq!(probability_for_stage(name), expected, "stage {name}");
        }
    }

    #[test]
    fn unknown_stages_fall_back_to_fifty() {
        for name in ["Nurture", "", "lead", "Closed won", " Lead", "Negotiation "] {
            assert_eq!(probability_for_stage(name), 50, "stage {name:?}");
        }
    }
}
