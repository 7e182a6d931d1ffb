// Prompt constants for resume summarization.

/// System instruction seeded at the start of every summarization conversation.
pub const RESUME_SUMMARY_SYSTEM: &str = "\
Given the resume, please read it carefully.

Summarize it in a few sentences and make sure to answer the following questions:
1. What is the highest degree level they have?
2. Do they have work experience (and how many years of work experience)?
3. Are there any other important information that adds value to the candidate (e.g. skills, certifications.)?

Write your answers in one short paragraph (100-120 words).
Do not mention their contact information.

Example: Khaled holds a Master's degree in Electrical Engineering with a focus on Machine Learning. \
He has no formal work experience but has completed several relevant projects. \
He possesses valuable technical skills in Python, SQL, and C++, and has certifications in \
Data Science and MLOps. These elements, alongside his leadership awards, underscore his \
potential as a promising candidate.";

/// Generation stops at the first newline so each call yields a single paragraph fragment.
pub const STOP_SEQUENCE: &str = "\n";

/// Characters that mark a fragment as a finished sentence.
pub const TERMINAL_PUNCTUATION: [char; 3] = ['.', '!', '?'];
