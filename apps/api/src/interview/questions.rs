use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::interview::prompts::{QUESTION_PROMPT_TEMPLATE, QUESTION_SYSTEM};
use crate::llm_client::prompts::{fill, truncate_chars, PLAIN_TEXT_INSTRUCTION};
use crate::llm_client::{generate_text, RetryPolicy, TextGenerator};

const MAX_PROMPT_SKILLS: usize = 15;
const SECTION_CHARS: usize = 600;
const SUMMARY_CHARS: usize = 300;

const PROJECT_KEYWORDS: [&str; 3] = ["project", "portfolio", "work"];
const EXPERIENCE_KEYWORDS: [&str; 3] = ["experience", "employment", "work history"];
const SUMMARY_KEYWORDS: [&str; 3] = ["summary", "objective", "about"];

/// Maps a candidate level to the difficulty wording used in prompts.
pub fn difficulty_for(level: &str) -> &'static str {
    match level {
        "Fresher" => "entry-level",
        "Experienced" => "advanced-level",
        _ => "intermediate-level",
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Request / response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct QuestionRequest {
    #[serde(default)]
    pub name: String,
    pub field: String,
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub resume_text: String,
}

fn default_level() -> String {
    "Intermediate".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionSource {
    Llm,
    /// LLM questions topped up from the fallback list.
    Mixed,
    Fallback,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionSet {
    pub questions: Vec<String>,
    pub source: QuestionSource,
    pub difficulty: &'static str,
}

// ────────────────────────────────────────────────────────────────────────────
// Resume sections
// ────────────────────────────────────────────────────────────────────────────

/// Resume excerpts that give the question prompt something concrete to point at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResumeSections {
    pub projects: String,
    pub experience: String,
    pub summary: String,
}

/// Each section starts at the first keyword found (first keyword in list order wins)
/// and runs for a fixed number of characters.
pub fn extract_resume_sections(resume_text: &str) -> ResumeSections {
    let lower = resume_text.to_ascii_lowercase();
    ResumeSections {
        projects: excerpt(resume_text, &lower, &PROJECT_KEYWORDS, SECTION_CHARS),
        experience: excerpt(resume_text, &lower, &EXPERIENCE_KEYWORDS, SECTION_CHARS),
        summary: excerpt(resume_text, &lower, &SUMMARY_KEYWORDS, SUMMARY_CHARS),
    }
}

/// `lower` is the ASCII-lowercased `text`, so byte offsets line up.
fn excerpt(text: &str, lower: &str, keywords: &[&str], max_chars: usize) -> String {
    keywords
        .iter()
        .find_map(|&keyword| lower.find(keyword))
        .map(|start| truncate_chars(&text[start..], max_chars).to_string())
        .unwrap_or_default()
}

// ────────────────────────────────────────────────────────────────────────────
// Prompt and reply handling
// ────────────────────────────────────────────────────────────────────────────

pub fn build_question_prompt(request: &QuestionRequest, count: usize) -> String {
    let difficulty = difficulty_for(&request.level);
    let skills = if request.skills.is_empty() {
        "general technical skills".to_string()
    } else {
        request
            .skills
            .iter()
            .take(MAX_PROMPT_SKILLS)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    };
    let first_skill = request.skills.first().map_or("Python", String::as_str);
    let sections = extract_resume_sections(&request.resume_text);
    let count = count.to_string();

    fill(
        QUESTION_PROMPT_TEMPLATE,
        &[
            ("count", &count),
            ("name", &request.name),
            ("field", &request.field),
            ("level", &request.level),
            ("difficulty", difficulty),
            ("skills", &skills),
            ("projects", &sections.projects),
            ("experience", &sections.experience),
            ("summary", &sections.summary),
            ("first_skill", first_skill),
            ("plain_text_instruction", PLAIN_TEXT_INSTRUCTION),
        ],
    )
}

/// Numbered or bulleted lines of the reply, with their markers stripped.
pub fn parse_questions(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| {
            line.starts_with(|c: char| c.is_ascii_digit())
                || line.starts_with('-')
                || line.starts_with('•')
        })
        .map(|line| {
            line.trim_start_matches(|c: char| {
                c.is_ascii_digit() || matches!(c, '-' | '•' | '.' | ')') || c.is_whitespace()
            })
            .trim()
            .to_string()
        })
        .filter(|question| !question.is_empty())
        .collect()
}

/// The deterministic question list used when the LLM gives too few questions.
pub fn fallback_questions(field: &str, skills: &[String]) -> Vec<String> {
    let skill = |idx: usize, otherwise: &str| {
        skills
            .get(idx)
            .map_or_else(|| otherwise.to_string(), Clone::clone)
    };

    vec![
        format!("Tell me about your background in {field}"),
        format!(
            "I noticed you have experience with {} - can you elaborate on a project where you used it?",
            skill(0, "various technologies")
        ),
        format!("What's the most challenging problem you've solved in your {field} work?"),
        format!(
            "Walk me through your experience with {}",
            skill(1, "your technical stack")
        ),
        "Describe a time when you had to learn a new technology quickly".to_string(),
        format!(
            "How do you approach debugging and troubleshooting in {}?",
            skill(2, "your projects")
        ),
        "Tell me about a project you're particularly proud of".to_string(),
        format!("Where do you see yourself growing in the {field} space?"),
    ]
}

/// Asks the LLM for `count` personalized questions; anything it cannot provide comes
/// from [`fallback_questions`]. Never fails.
pub async fn generate_questions(
    llm: &dyn TextGenerator,
    policy: &RetryPolicy,
    request: &QuestionRequest,
    count: usize,
) -> QuestionSet {
    let prompt = build_question_prompt(request, count);

    let mut questions = match generate_text(llm, policy, &prompt, QUESTION_SYSTEM).await {
        Ok(text) => parse_questions(&text),
        Err(e) => {
            warn!("Question generation failed, using fallback questions: {e}");
            Vec::new()
        }
    };
    questions.truncate(count);

    let source = if questions.len() == count {
        QuestionSource::Llm
    } else if questions.is_empty() {
        QuestionSource::Fallback
    } else {
        QuestionSource::Mixed
    };

    let missing = count - questions.len();
    questions.extend(
        fallback_questions(&request.field, &request.skills)
            .into_iter()
            .take(missing),
    );

    info!(
        "Generated {} questions for {} ({:?})",
        questions.len(),
        request.field,
        source
    );

    QuestionSet {
        questions,
        source,
        difficulty: difficulty_for(&request.level),
    }
}
