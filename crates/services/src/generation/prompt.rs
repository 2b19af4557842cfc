use crate::extract::truncate_text;

/// Character cap applied to material before it is sent for generation.
pub const GENERATION_CHAR_CAP: usize = 15_000;
/// Marker appended when material is cut at `GENERATION_CHAR_CAP`.
pub const GENERATION_TRUNCATION_MARKER: &str = "\n\n[Content truncated...]";

/// Apply the generation truncation policy to material text.
#[must_use]
pub fn prepare_content(content: &str) -> String {
    truncate_text(content, GENERATION_CHAR_CAP, GENERATION_TRUNCATION_MARKER)
}

#[must_use]
pub fn plan_prompt(content: &str, days: u32) -> String {
    let material = prepare_content(content);
    format!(
        r#"You are an expert study planner. Based on the following study material, create a detailed study plan for {days} days.

STUDY MATERIAL:
{material}

Please create a study plan in the following JSON format:
{{
  "title": "Study Plan Title",
  "overview": "Brief overview of what will be covered",
  "days": [
    {{
      "day": 1,
      "title": "Day 1 Title",
      "topics": ["Topic 1", "Topic 2"],
      "objectives": ["Objective 1", "Objective 2"],
      "activities": ["Activity 1", "Activity 2"],
      "duration": "2-3 hours"
    }}
  ],
  "tips": ["Study tip 1", "Study tip 2"]
}}

Make the plan realistic and balanced. Include breaks and revision days if the duration allows.
Return ONLY valid JSON, no markdown or extra text.
"#
    )
}

#[must_use]
pub fn quiz_prompt(content: &str, num_questions: u32) -> String {
    let material = prepare_content(content);
    format!(
        r#"You are an expert quiz creator. Based on the following study material, create a quiz with {num_questions} questions.

STUDY MATERIAL:
{material}

Create a mix of question types:
- Multiple Choice (mcq)
- True/False (true-false)
- Short Answer (short-answer)

Return the quiz in the following JSON format:
{{
  "title": "Quiz Title",
  "questions": [
    {{
      "id": 1,
      "type": "mcq",
      "question": "Question text?",
      "options": ["A", "B", "C", "D"],
      "correctAnswer": "A",
      "explanation": "Why this is correct"
    }},
    {{
      "id": 2,
      "type": "true-false",
      "question": "Statement to evaluate",
      "correctAnswer": true,
      "explanation": "Why this is true/false"
    }},
    {{
      "id": 3,
      "type": "short-answer",
      "question": "Question requiring a short answer?",
      "correctAnswer": "Expected answer keywords",
      "explanation": "Full explanation"
    }}
  ]
}}

The correctAnswer of a multiple choice question must be copied exactly from its options.
Make questions progressively harder. Test understanding, not just memorization.
Return ONLY valid JSON, no markdown or extra text.
"#
    )
}
