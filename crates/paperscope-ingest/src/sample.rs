//! Synthetic conference papers for when no real dataset is available.

use paperscope_core::Paper;

pub const DEFAULT_SAMPLE_COUNT: usize = 86;

const INSTITUTIONS: &[&str] = &[
    "Facility for Rare Isotope Beams, Michigan State University",
    "CERN, Geneva, Switzerland",
    "Fermilab, Batavia, IL, USA",
    "Lawrence Berkeley National Laboratory",
    "INFN - Laboratori Nazionali di Legnaro",
];

const TOPICS: &[&str] = &[
    "FRIB Operations",
    "Accelerator Improvements",
    "Superconducting Technology",
    "Beam Dynamics",
    "Target Technology",
    "Ion Sources",
    "RF Systems",
    "Cryogenics",
    "Beam Diagnostics",
    "Machine Learning Applications",
];

const FIRST_NAMES: &[&str] = &[
    "John", "Mary", "David", "Sarah", "Michael", "Lisa", "Robert", "Jennifer",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Brown", "Davis", "Wilson", "Miller", "Taylor", "Anderson",
];

const BASE_KEYWORDS: &[&str] = &["accelerator", "beam", "physics", "technology"];

const MAX_KEYWORDS: usize = 5;

#[derive(Debug, Clone)]
pub struct SampleOptions {
    pub count: usize,
    /// Fixed seed for reproducible output; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self {
            count: DEFAULT_SAMPLE_COUNT,
            seed: None,
        }
    }
}

pub fn generate(opts: &SampleOptions) -> Vec<Paper> {
    let mut rng = match opts.seed {
        Some(seed) => fastrand::Rng::with_seed(seed),
        None => fastrand::Rng::new(),
    };

    (1..=opts.count)
        .map(|i| {
            let topic = pick(&mut rng, TOPICS);
            let institution = pick(&mut rng, INSTITUTIONS);
            Paper {
                number: i as u64,
                filename: sample_filename(i, topic),
                title: format!("{topic}: Advanced Research and Development"),
                authors: random_authors(&mut rng),
                affiliations: vec![institution.to_string()],
                abstract_text: format!(
                    "This paper presents comprehensive research on {}. The study investigates \
                     advanced methodologies and presents significant findings that contribute to \
                     the field of heavy ion accelerator technology. Our findings demonstrate \
                     improved performance and novel approaches to solving critical challenges in \
                     the field.",
                    topic.to_lowercase()
                ),
                keywords: topic_keywords(topic),
                page_count: rng.u64(2..10),
                file_size_kb: rng.u32(500..5500) as f64,
                figures: rng.usize(1..16),
                tables: rng.usize(0..5),
                references: rng.usize(5..25),
            }
        })
        .collect()
}

fn pick<'a>(rng: &mut fastrand::Rng, items: &[&'a str]) -> &'a str {
    items[rng.usize(..items.len())]
}

fn random_authors(rng: &mut fastrand::Rng) -> Vec<String> {
    let count = rng.usize(1..5);
    (0..count)
        .map(|_| format!("{} {}", pick(rng, FIRST_NAMES), pick(rng, LAST_NAMES)))
        .collect()
}

/// Base keywords followed by the topic's lower-cased words, five at most.
fn topic_keywords(topic: &str) -> Vec<String> {
    let lowered = topic.to_lowercase();
    BASE_KEYWORDS
        .iter()
        .map(|s| s.to_string())
        .chain(lowered.split_whitespace().map(String::from))
        .take(MAX_KEYWORDS)
        .collect()
}

fn sample_filename(number: usize, topic: &str) -> String {
    let stem = topic
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_uppercase();
    format!("{number:03}_{stem}.pdf")
}
