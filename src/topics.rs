//! Random conversation topic generation.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::config::TopicsConfig;

static DEFAULT_SUBJECTS: &[&str] = &[
    "deep sea creatures",
    "forgotten inventions",
    "the first programming languages",
    "urban beekeeping",
    "time zones",
    "lighthouses",
    "the history of maps",
    "fermentation",
    "chess openings",
    "volcanic islands",
    "vintage synthesizers",
    "migratory birds",
    "space elevators",
    "ancient libraries",
    "sourdough",
    "tiny houses",
    "the color blue",
    "board game design",
    "glaciers",
    "public transit",
];

static DEFAULT_FRAMINGS: &[&str] = &[
    "The hidden economics of",
    "A brief history of",
    "Unexpected lessons from",
    "The future of",
    "Common myths about",
    "The ethics of",
    "Why people love",
    "What aliens would think of",
];

/// Picks topics as `"<framing> <subject>"`.
#[derive(Debug, Clone)]
pub struct TopicGenerator {
    subjects: Vec<String>,
    framings: Vec<String>,
}

impl Default for TopicGenerator {
    fn default() -> Self {
        Self::new(
            DEFAULT_SUBJECTS.iter().map(ToString::to_string).collect(),
            DEFAULT_FRAMINGS.iter().map(ToString::to_string).collect(),
        )
    }
}

impl TopicGenerator {
    pub fn new(subjects: Vec<String>, framings: Vec<String>) -> Self {
        let clean = |items: Vec<String>| -> Vec<String> {
            items
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        };
        Self {
            subjects: clean(subjects),
            framings: clean(framings),
        }
    }

    /// Configured lists, falling back to the built-in ones when both are empty.
    pub fn from_config(config: &TopicsConfig) -> Self {
        if config.subjects.is_empty() && config.framings.is_empty() {
            Self::default()
        } else {
            Self::new(config.subjects.clone(), config.framings.clone())
        }
    }

    /// A topic, or `None` when no subjects are available.
    pub fn generate(&self) -> Option<String> {
        self.generate_with(&mut rand::thread_rng())
    }

    pub fn generate_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<String> {
        let subject = self.subjects.choose(rng)?;
        Some(match self.framings.choose(rng) {
            Some(framing) => format!("{framing} {subject}"),
            None => capitalize(subject),
        })
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_default_topics_combine_framing_and_subject() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        let generator = TopicGenerator::default();
        for _ in 0..20 {
            let topic = generator.generate_with(&mut rng).unwrap();
            assert!(DEFAULT_FRAMINGS.iter().any(|f| topic.starts_with(f)));
            assert!(DEFAULT_SUBJECTS.iter().any(|s| topic.ends_with(s)));
        }
    }

    #[test]
    fn test_subjects_without_framings() {
        let generator = TopicGenerator::new(vec!["tea".into()], vec![]);
        assert_eq!(generator.generate().as_deref(), Some("Tea"));
    }

    #[test]
    fn test_no_subjects_yields_none() {
        let generator = TopicGenerator::new(vec!["  ".into()], vec!["The future of".into()]);
        assert!(generator.generate().is_none());
    }
}
