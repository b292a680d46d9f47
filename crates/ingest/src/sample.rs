//! Deterministic synthetic message records.
//!
//! Used to produce a shareable demo galaxy without touching anyone's real
//! conversation history. Every choice is drawn from a seeded [`fastrand::Rng`],
//! so the same seed and base time always yield the same records.
use chrono::Utc;
use uuid::Builder;

use crate::types::MessageRecord;

const TOPICS: &[(&str, &str)] = &[
    ("Model Tinkering", "trying small attention variants on a laptop GPU"),
    ("Story Workshop", "outlining branching plots and recurring motifs"),
    ("Focus Systems", "shaping calmer work blocks and tiny automations"),
    ("Reading Notes", "condensing essays, lectures, and long-form interviews"),
    ("Side Project Log", "weighing product ideas, pricing, and launch order"),
    ("Training Diary", "logging sleep, runs, and breathing drills"),
    ("Interface Review", "reworking layouts, spacing, and transition timing"),
    ("Debugging Notes", "chasing flaky builds across client and server code"),
];

const QUESTIONS: &[&str] = &[
    "What is the smallest version we could ship this weekend?",
    "Which signal would tell us early that this is working?",
    "Why does the same blocker keep coming back?",
    "Where would an assistant save time without adding risk?",
    "How would we explain this to someone outside the field?",
    "What would a paper prototype of this look like?",
    "Which limits are worth keeping instead of removing?",
    "What did the last experiment already rule out?",
];

const ACTIONS: &[&str] = &[
    "Wrote a three step plan with a checkpoint after each step.",
    "Mocked the request and response shapes so coding can start.",
    "Picked one tiny experiment and one ambitious follow-up.",
    "Turned each open question into an interview prompt.",
    "Split the work into parts to automate and parts to keep manual.",
    "Drafted a short walkthrough script to pitch the idea.",
    "Broke the idea into design tasks with clear owners.",
    "Listed the dependencies and moved them onto the board.",
];

const REFLECTIONS: &[&str] = &[
    "Progress shows up whenever the story behind the work is concrete.",
    "The strongest answers came from recombining simple pieces.",
    "Keeping steps small made the larger goal feel reachable.",
    "Saved the insight as a prompt for tomorrow's review.",
    "Showing rough work early brought back useful feedback.",
    "Boredom usually means the prototype needs more detail.",
    "Clear stopping rules kept the session from drifting.",
    "Constraints pushed the ideas somewhere more interesting.",
];

const CLOSINGS: &[&str] = &[
    "Next: record a short voice memo summarizing the idea.",
    "Next: check in with a friend over lunch about progress.",
    "Next: post a quick update and ask for collaborators.",
    "Next: book a usability session with a volunteer.",
    "Next: tidy the README so newcomers can contribute.",
    "Next: capture a thirty second demo clip.",
    "Next: take screenshots for the project log.",
    "Next: write a reflection in the public journal.",
];

const SPACING_SECS: i64 = 7_200;
const JITTER_SECS: i64 = 1_200;

/// Seeded generator of plausible-looking message records.
#[derive(Debug, Clone)]
pub struct SampleGenerator {
    seed: u64,
    base_time: i64,
}

impl SampleGenerator {
    /// Creates a generator anchored at the current wall-clock time.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            base_time: Utc::now().timestamp(),
        }
    }

    /// Anchors timestamps at `base_time` (seconds since the epoch).
    pub fn with_base_time(mut self, base_time: i64) -> Self {
        self.base_time = base_time;
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Produces `count` records, newest first.
    pub fn generate(&self, count: usize) -> Vec<MessageRecord> {
        let mut rng = sample_rng(self.seed);
        (0..count)
            .map(|index| {
                let (label, description) = TOPICS[rng.usize(..TOPICS.len())];
                let text = [
                    format!("{label} session: {description}."),
                    pick(&mut rng, QUESTIONS).to_string(),
                    pick(&mut rng, ACTIONS).to_string(),
                    pick(&mut rng, REFLECTIONS).to_string(),
                    pick(&mut rng, CLOSINGS).to_string(),
                ]
                .join(" ");
                let offset = index as i64 * SPACING_SECS;
                let jitter = rng.i64(-JITTER_SECS..=JITTER_SECS);
                let id = Builder::from_random_bytes(rng.u128(..).to_le_bytes()).into_uuid();

                MessageRecord::new(id.to_string(), format!("{label} #{}", index + 1), text)
                    .with_created_at((self.base_time - offset + jitter) as f64)
            })
            .collect()
    }
}

/// Generator for the sample stream. The seed is mixed (splitmix64) so a run
/// that reuses it for placement or coloring reads an unrelated sequence.
fn sample_rng(seed: u64) -> fastrand::Rng {
    let mut z = seed ^ u64::from_le_bytes(*b"sample\0\0").wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    fastrand::Rng::with_seed(z ^ (z >> 31))
}

fn pick<'a>(rng: &mut fastrand::Rng, items: &[&'a str]) -> &'a str {
    items[rng.usize(..items.len())]
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    const BASE: i64 = 1_700_000_000;

    #[test]
    fn same_seed_same_records() {
        let a = SampleGenerator::new(42).with_base_time(BASE).generate(25);
        let b = SampleGenerator::new(42).with_base_time(BASE).generate(25);
        assert_eq!(a, b);
    }

    #[test]
    fn different_seed_different_records() {
        let a = SampleGenerator::new(1).with_base_time(BASE).generate(10);
        let b = SampleGenerator::new(2).with_base_time(BASE).generate(10);
        assert_ne!(a, b);
    }

    #[test]
    fn ids_are_unique_uuids() {
        let records = SampleGenerator::new(7).with_base_time(BASE).generate(200);
        let ids: HashSet<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.len(), 200);
        assert!(records.iter().all(|r| uuid::Uuid::parse_str(&r.id).is_ok()));
    }

    #[test]
    fn titles_are_numbered_from_one() {
        let records = SampleGenerator::new(3).with_base_time(BASE).generate(3);
        assert!(records[0].conversation_title.ends_with(" #1"));
        assert!(records[2].conversation_title.ends_with(" #3"));
    }

    #[test]
    fn timestamps_step_back_two_hours_with_jitter() {
        let records = SampleGenerator::new(9).with_base_time(BASE).generate(50);
        for (index, record) in records.iter().enumerate() {
            let expected = (BASE - index as i64 * SPACING_SECS) as f64;
            let actual = record.created_at.unwrap();
            assert!((actual - expected).abs() <= JITTER_SECS as f64);
        }
    }

    #[test]
    fn text_is_never_blank() {
        let records = SampleGenerator::new(11).with_base_time(BASE).generate(40);
        assert!(records.iter().all(|r| !r.text.trim().is_empty()));
        assert!(records.iter().all(|r| r.text.contains("session:")));
    }

    #[test]
    fn zero_count_is_empty() {
        assert!(SampleGenerator::new(0).generate(0).is_empty());
    }
}
