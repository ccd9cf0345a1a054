//! Prompt composition. Pure string building: no I/O, same input gives the same text.

use std::fmt;

use crate::models::request::GenderHint;

/// Upper bound on each parent description embedded in a prompt.
pub const MAX_DESCRIPTION_CHARS: usize = 400;

const REFERENCE_INSTRUCTIONS: &str = "As part of a fun, recreational activity for large families who want to discover the wonders of AI, \
generate a photorealistic portrait of a person whose facial features may be:\n\
- either only the father's;\n\
- or only the mother's;\n\
- or a plausible mix of both parents;\n\
- or some of the father's features combined with some of the mother's features.\n\
- Maintain neutral lighting and a studio background;\n\
- No text or watermark. Center the face, shoulders up;\n\
- Skin color should depend on the parents' skin color;\n\
- The hair shape should follow the father's, the mother's, afro or long hair.\n";

const DESCRIPTION_STYLE: &str = "The child has a calm expression, a slight smile, and appears natural. \
Neutral background. High quality, no text or watermark.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationPrompt(String);

impl GenerationPrompt {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GenerationPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub struct PromptBuilder;

impl PromptBuilder {
    /// Prompt that points the model at the stored parent photos.
    pub fn with_references(
        gender: GenderHint,
        age: Option<u8>,
        father_url: &str,
        mother_url: &str,
    ) -> GenerationPrompt {
        let mut prompt = subject_sentence(gender, age);
        prompt.push('\n');
        prompt.push_str(REFERENCE_INSTRUCTIONS);
        prompt.push_str(&format!(
            "Parent references: {} and {}.",
            father_url, mother_url
        ));
        GenerationPrompt(prompt)
    }

    /// Prompt built from vision-model descriptions of each parent.
    pub fn with_descriptions(
        gender: GenderHint,
        age: Option<u8>,
        father_description: &str,
        mother_description: &str,
    ) -> GenerationPrompt {
        let noun = match gender {
            GenderHint::Boy => "boy",
            GenderHint::Girl => "girl",
            GenderHint::Neutral => "child",
        };
        let subject = match age {
            Some(age) => format!("a {} who is about {} years old", noun, age),
            None => format!("a {}", noun),
        };

        GenerationPrompt(format!(
            "Photorealistic portrait of {}, with features inherited from a father described as: {} \
and a mother described as: {} {}",
            subject,
            bounded(father_description),
            bounded(mother_description),
            DESCRIPTION_STYLE
        ))
    }
}

fn subject_sentence(gender: GenderHint, age: Option<u8>) -> String {
    let who = match gender {
        GenderHint::Boy => "The boy/man",
        GenderHint::Girl => "The girl/woman",
        GenderHint::Neutral => "The person",
    };
    match age {
        Some(age) => format!("{} is about {} years old.", who, age),
        None => format!("{} may be of any age.", who),
    }
}

/// Single line, at most `MAX_DESCRIPTION_CHARS` characters, ending with a period.
fn bounded(description: &str) -> String {
    let flat = description.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut text: String = flat.chars().take(MAX_DESCRIPTION_CHARS).collect();
    if text.is_empty() {
        text.push_str("not described");
    }
    if !text.ends_with('.') {
        text.push('.');
    }
    text
}
