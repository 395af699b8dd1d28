//! 提示词工程
//! 出题、趣味知识、表情和答案解析的提示词，以及难度档位对应的出题风格与人设

use rand::seq::SliceRandom;

use crate::models::{Difficulty, GenerationRequest, Language};

const BEGINNER_PERSONAS: &[&str] = &[
    "You are a cheerful guide who makes every topic feel welcoming. You lean on vivid analogies and playful examples, keep questions simple and visual, and assume the player knows nothing yet.",
    "You are a curious newcomer exploring the topic together with the player. Your questions are light, friendly and framed as small everyday situations, never as exams.",
    "You are a storyteller who turns a quiz into a short adventure. Each question opens a little scene or character that makes the fact easy to remember.",
    "You are an encouraging explorer who walks the player through the basics, celebrates effort and keeps every idea small enough to grasp at once.",
];

const INTERMEDIATE_PERSONAS: &[&str] = &[
    "You are a thoughtful instructor who expects some prior exposure to the topic and rewards reasoning, comparison and curiosity.",
    "You are an enthusiast who digs one layer deeper than the headlines. Your questions point at causes, patterns and relationships.",
    "You are a friendly classmate who likes to talk things through. Your questions need understanding rather than rote memory.",
    "You are an analyst who loves the why behind things. You frame questions as short scenarios and use plain technical terms where they help.",
];

const ADVANCED_PERSONAS: &[&str] = &[
    "You are a domain expert who assumes strong prior knowledge and asks for precision and synthesis.",
    "You are a mentor who frames questions with depth and context, drawing on theory, uncommon facts and recent developments.",
    "You are a researcher who enjoys nuance. Your questions hinge on subtle distinctions and edge cases.",
    "You are a rigorous challenger. Your questions are dense and may ask the player to weigh competing explanations.",
];

/// 出题提示词
pub struct QuizPrompt;

impl QuizPrompt {
    /// 难度档位对应的出题风格
    pub fn difficulty_directive(difficulty: Difficulty) -> &'static str {
        match difficulty {
            Difficulty::Beginner => {
                "Beginner - for casual players with little or no background.
- Stick to basic facts, definitions and big-picture ideas.
- Use simple, friendly language without jargon.
- Questions should feel fun, visual or curiosity-driven.
- Avoid rare names, exact dates and specialised terms."
            }
            Difficulty::Intermediate => {
                "Intermediate - for players with solid general knowledge.
- Ask about concepts that need basic reasoning or familiarity with key ideas.
- Questions may explore causes, relationships or comparisons.
- Skip trivial facts but do not assume deep expertise.
- Keep the language clear; occasional technical terms are fine."
            }
            Difficulty::Advanced => {
                "Advanced - for players with deep knowledge of the topic.
- Assume familiarity with domain terminology and advanced concepts.
- Ask analytical questions built on subtle distinctions or uncommon facts.
- Niche references, historical context and multi-step reasoning are welcome.
- Use a precise tone but keep every question under 60 characters."
            }
        }
    }

    /// 某一难度下可选的人设
    pub fn personas(difficulty: Difficulty) -> &'static [&'static str] {
        match difficulty {
            Difficulty::Beginner => BEGINNER_PERSONAS,
            Difficulty::Intermediate => INTERMEDIATE_PERSONAS,
            Difficulty::Advanced => ADVANCED_PERSONAS,
        }
    }

    /// 随机挑选一个人设
    pub fn random_persona(difficulty: Difficulty) -> &'static str {
        let pool = Self::personas(difficulty);
        pool.choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(BEGINNER_PERSONAS[0])
    }

    /// 构建出题提示词
    pub fn quiz(request: &GenerationRequest, persona: &str, question_count: usize) -> String {
        let language = request.language().name();

        format!(
            r#"{persona}

Topic: {topic}
Difficulty: {directive}
Seed: {seed}
Language: {language}

{avoid}

IMPORTANT: The player's language is {language}. Write every question and answer in {language} only.

Verified background information about the topic. Use it to build the quiz:
### START OF INFORMATION ###
{reference}
### END OF INFORMATION ###

## Requirements:
1. Generate exactly {count} multiple-choice questions.
2. Every question covers a different fact, subtopic or angle of the topic.
3. Mix styles: plain facts, pop-culture tie-ins, short hypotheticals, odd-but-true.
4. Every question has exactly 4 answers and exactly one of them is correct.
5. Distractors must be plausible, on topic and clearly wrong.
6. Vary the position of the correct answer between questions.
7. Keep questions short (under 60 characters) and never reveal the answer in the question.
8. Do not repeat facts or phrasing between questions.

## Output format (JSON):
[
  {{
    "question": "...?",
    "answers": [
      {{"text": "Option A", "correct": false}},
      {{"text": "Option B", "correct": true}},
      {{"text": "Option C", "correct": false}},
      {{"text": "Option D", "correct": false}}
    ]
  }}
]

Output only the JSON array, no markdown, no commentary. Every fact must be correct."#,
            persona = persona,
            topic = request.topic,
            directive = Self::difficulty_directive(request.difficulty),
            seed = request.variety_seed,
            language = language,
            avoid = request.avoid_directive,
            reference = request.reference_text,
            count = question_count,
        )
    }

    /// 趣味知识
    pub fn fun_facts(topic: &str, language: Language, reference: &str, seed: i64) -> String {
        let language = language.name();

        format!(
            r#"You are a pop-culture-savvy trivia writer collecting 10 fun and surprising facts.

Topic: {topic}
Seed: {seed}
Language: {language}

IMPORTANT: Reply in {language} only.

Verified background information about the topic:
### START OF INFORMATION ###
{reference}
### END OF INFORMATION ###

## Guidelines:
1. Every fact is accurate, concise and phrased in an engaging way.
2. Cover different angles: history, science, records, pop culture, unexpected uses.
3. Informal pub-quiz tone, no textbook phrasing.
4. Statements only, no questions or opinions.

## Output format (JSON):
["Fun fact 1", "Fun fact 2", "..."]

Output only the JSON array of 10 strings, no markdown, no commentary."#,
        )
    }

    /// 主题表情
    pub fn emoji(topic: &str) -> String {
        format!(
            r#"You receive a single topic and answer with the one emoji that represents it best.
Pick a widely recognised emoji, never an obscure one.

Examples:
Input: Fire
Output: 🔥

Input: Space
Output: 🚀

Input: Love
Output: ❤️

Input: {}
Output:

Reply with the emoji only, no text, no markdown."#,
            topic
        )
    }

    /// 答案解析
    pub fn explanation(question: &str, answer: &str, user_answer: &str, language: Language) -> String {
        let language = language.name();

        format!(
            r#"You are an educator who makes complex ideas easy to grasp.
Explain briefly why the answer below is correct. Use an example, an analogy or a short chain of reasoning where it helps.

Question: {question}
Answer: {answer}
Player's answer: {user_answer}
Language: {language}

## Guidelines:
1. Keep it short.
2. Plain text only, no markdown.
3. Every statement must be correct.
4. Reply with the explanation only, written in {language}."#,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> GenerationRequest {
        GenerationRequest {
            topic: "Volcanoes".to_string(),
            difficulty: Difficulty::Intermediate,
            language_code: "de".to_string(),
            avoid_directive: "Avoid: Is Etna active?".to_string(),
            reference_text: "Etna is on Sicily.".to_string(),
            variety_seed: 1234,
        }
    }

    #[test]
    fn test_difficulty_directive_per_tier() {
        assert!(QuizPrompt::difficulty_directive(Difficulty::Beginner).starts_with("Beginner"));
        assert!(QuizPrompt::difficulty_directive(Difficulty::Intermediate).starts_with("Intermediate"));
        assert!(QuizPrompt::difficulty_directive(Difficulty::Advanced).starts_with("Advanced"));
        assert!(QuizPrompt::difficulty_directive(Difficulty::from_tier(7)).starts_with("Beginner"));
    }

    #[test]
    fn test_random_persona_comes_from_tier_pool() {
        for _ in 0..20 {
            let persona = QuizPrompt::random_persona(Difficulty::Advanced);
            assert!(ADVANCED_PERSONAS.contains(&persona));
        }
    }

    #[test]
    fn test_quiz_prompt_contains_request_parts() {
        let prompt = QuizPrompt::quiz(&request(), "PERSONA", 10);

        assert!(prompt.starts_with("PERSONA"));
        assert!(prompt.contains("Topic: Volcanoes"));
        assert!(prompt.contains("Language: German"));
        assert!(prompt.contains("Seed: 1234"));
        assert!(prompt.contains("Avoid: Is Etna active?"));
        assert!(prompt.contains("Etna is on Sicily."));
        assert!(prompt.contains("exactly 10 multiple-choice"));
    }

    #[test]
    fn test_emoji_prompt_mentions_topic() {
        assert!(QuizPrompt::emoji("Coffee").contains("Input: Coffee"));
    }
}
