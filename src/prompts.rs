use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder substituted with the review text
const REVIEW_SLOT: &str = "{review}";

const PROMPT_ZERO_SHOT: &str = r#"Analyze this restaurant review and predict a star rating from 1 to 5.

Review: "{review}"

Respond with ONLY valid JSON in this exact format:
{"predicted_stars": <number>, "explanation": "<brief reason>"}

Rules:
- 5 stars: Exceptional, highly positive
- 4 stars: Good, mostly positive
- 3 stars: Average, mixed feelings
- 2 stars: Below average, mostly negative
- 1 star: Very poor, extremely negative"#;

const PROMPT_FEW_SHOT: &str = r#"Analyze restaurant reviews and predict star ratings (1-5).

Examples:
Review: "Amazing food! Best pizza I've ever had. Service was outstanding too."
{"predicted_stars": 5, "explanation": "Highly enthusiastic language and multiple positive aspects"}

Review: "Food was okay but nothing special. Service was slow."
{"predicted_stars": 3, "explanation": "Mixed sentiment with average food and service issues"}

Review: "Terrible experience. Food was cold and tasted awful. Never coming back."
{"predicted_stars": 1, "explanation": "Extremely negative language and multiple complaints"}

Now rate this review:
Review: "{review}"

Respond with ONLY valid JSON:
{"predicted_stars": <number>, "explanation": "<brief reason>"}"#;

const PROMPT_CHAIN_OF_THOUGHT: &str = r#"Analyze this restaurant review step-by-step and predict a star rating.

Review: "{review}"

Think through:
1. What specific positive aspects are mentioned?
2. What specific negative aspects are mentioned?
3. What is the overall emotional tone?
4. How strong are the sentiments expressed?

Based on this analysis, provide a rating from 1-5 where:
- 5 = Exceptional (enthusiastic, multiple positives, no negatives)
- 4 = Good (mostly positive, minor issues okay)
- 3 = Average (balanced or lukewarm)
- 2 = Below average (mostly negative)
- 1 = Very poor (strongly negative, multiple complaints)

Respond with ONLY valid JSON:
{"predicted_stars": <number>, "explanation": "<your reasoning summary>"}"#;

const PROMPT_HYBRID: &str = r#"You are an expert at analyzing restaurant reviews. Rate this review from 1-5 stars.

Example 1:
Review: "Absolutely incredible! The pasta was perfection and staff treated us like family."
Analysis: Superlative language ("incredible", "perfection"), multiple positive aspects, emotional connection
Rating: {"predicted_stars": 5, "explanation": "Highly positive language across food and service"}

Example 2:
Review: "It's fine. Nothing to write home about."
Analysis: Lukewarm language, no strong positives or negatives, underwhelming
Rating: {"predicted_stars": 3, "explanation": "Neutral tone suggesting average experience"}

Now analyze this review:
Review: "{review}"

Scoring criteria:
- Language intensity (superlatives, emotional words)
- Number of positive vs negative aspects
- Specific details vs vague statements
- Would they recommend it? Would they return?

Respond with ONLY valid JSON:
{"predicted_stars": <number>, "explanation": "<specific reasoning>"}"#;

/// Prompting approach, each backed by one fixed template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Approach {
    ZeroShot,
    FewShot,
    ChainOfThought,
    Hybrid,
}

impl Approach {
    /// Every approach, in the order they are compared
    pub const ALL: [Approach; 4] = [
        Approach::ZeroShot,
        Approach::FewShot,
        Approach::ChainOfThought,
        Approach::Hybrid,
    ];

    /// Human-readable name used in reports
    pub fn display_name(self) -> &'static str {
        match self {
            Approach::ZeroShot => "Zero-Shot Direct",
            Approach::FewShot => "Few-Shot with Examples",
            Approach::ChainOfThought => "Chain-of-Thought",
            Approach::Hybrid => "Hybrid (Few-Shot + CoT)",
        }
    }

    pub fn template(self) -> &'static str {
        match self {
            Approach::ZeroShot => PROMPT_ZERO_SHOT,
            Approach::FewShot => PROMPT_FEW_SHOT,
            Approach::ChainOfThought => PROMPT_CHAIN_OF_THOUGHT,
            Approach::Hybrid => PROMPT_HYBRID,
        }
    }

    /// Substitute the review into this approach's template.
    ///
    /// The review is inserted verbatim; braces inside it are not interpreted.
    pub fn render(self, review: &str) -> String {
        self.template().replacen(REVIEW_SLOT, review, 1)
    }
}

impl fmt::Display for Approach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
