//! 选项编解码
//! 题目的选项列表 <-> quizzes 表的四个选项列加一个正确项下标

use crate::error::{QuizError, Result};
use crate::models::{Answer, Question, StorageAnswerFields, StoredQuestionRow};

/// 每道题固定四个选项
pub const ANSWER_COUNT: usize = 4;

/// 题目 -> 存储列
///
/// 取第一个标记为正确的选项下标；一个都没有时记为 0。
pub fn to_storage_row(question: &Question) -> Result<StorageAnswerFields> {
    if question.answers.len() != ANSWER_COUNT {
        return Err(QuizError::MalformedQuestion(format!(
            "expected {} answers, got {} for '{}'",
            ANSWER_COUNT,
            question.answers.len(),
            question.text
        )));
    }

    let correct_index = question
        .answers
        .iter()
        .position(|a| a.correct)
        .unwrap_or(0) as i64;

    let [a0, a1, a2, a3] = [0, 1, 2, 3].map(|i| question.answers[i].text.clone());

    Ok(StorageAnswerFields {
        text: question.text.clone(),
        answer_0: a0,
        answer_1: a1,
        answer_2: a2,
        answer_3: a3,
        correct_index,
    })
}

/// 存储列 -> 题目（不带 id）
///
/// 越界下标夹到 [0, 3]，保证输出恰好一个正确选项。
pub fn from_storage_fields(fields: &StorageAnswerFields) -> Question {
    let correct = clamp_index(fields.correct_index);
    let texts = [
        &fields.answer_0,
        &fields.answer_1,
        &fields.answer_2,
        &fields.answer_3,
    ];

    let answers = texts
        .iter()
        .enumerate()
        .map(|(position, text)| Answer::new(text.as_str(), position == correct))
        .collect();

    Question::new(fields.text.clone(), answers)
}

/// 数据库行 -> 题目，附带行 id
pub fn from_storage_row(row: &StoredQuestionRow) -> Question {
    let fields = StorageAnswerFields {
        text: row.text.clone(),
        answer_0: row.answer_0.clone(),
        answer_1: row.answer_1.clone(),
        answer_2: row.answer_2.clone(),
        answer_3: row.answer_3.clone(),
        correct_index: row.correct_index,
    };
    from_storage_fields(&fields).with_id(row.id)
}

/// 按存储语义重写正确标记，返回的题目与入库内容一致
pub fn normalize(question: &Question) -> Result<Question> {
    let mut normalized = from_storage_fields(&to_storage_row(question)?);
    normalized.id = question.id;
    Ok(normalized)
}

fn clamp_index(index: i64) -> usize {
    index.clamp(0, ANSWER_COUNT as i64 - 1) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn question(correct: &[bool]) -> Question {
        let answers = correct
            .iter()
            .enumerate()
            .map(|(i, c)| Answer::new(format!("option {}", i), *c))
            .collect();
        Question::new("Which one?", answers)
    }

    fn row(correct_index: i64) -> StoredQuestionRow {
        StoredQuestionRow {
            id: 42,
            text: "Which one?".to_string(),
            answer_0: "option 0".to_string(),
            answer_1: "option 1".to_string(),
            answer_2: "option 2".to_string(),
            answer_3: "option 3".to_string(),
            correct_index,
            topic_id: 1,
            difficulty: 0,
            language: "en".to_string(),
            likes: 0,
            dislikes: 0,
        }
    }

    #[rstest]
    #[case([true, false, false, false])]
    #[case([false, true, false, false])]
    #[case([false, false, true, false])]
    #[case([false, false, false, true])]
    fn test_round_trip_preserves_text_and_correctness(#[case] correct: [bool; 4]) {
        let q = question(&correct);
        let fields = to_storage_row(&q).unwrap();
        assert_eq!(from_storage_fields(&fields), q);
    }

    #[test]
    fn test_no_correct_answer_falls_back_to_index_zero() {
        let fields = to_storage_row(&question(&[false, false, false, false])).unwrap();
        assert_eq!(fields.correct_index, 0);
    }

    #[test]
    fn test_first_correct_answer_wins() {
        let fields = to_storage_row(&question(&[false, true, false, true])).unwrap();
        assert_eq!(fields.correct_index, 1);
    }

    #[test]
    fn test_storage_columns_follow_answer_order() {
        let fields = to_storage_row(&question(&[false, false, true, false])).unwrap();
        assert_eq!(fields.text, "Which one?");
        assert_eq!(fields.answer_0, "option 0");
        assert_eq!(fields.answer_3, "option 3");
        assert_eq!(fields.correct_index, 2);
    }

    #[rstest]
    #[case(3)]
    #[case(5)]
    fn test_wrong_answer_count_is_malformed(#[case] count: usize) {
        let q = question(&vec![false; count]);
        let err = to_storage_row(&q).unwrap_err();
        assert!(matches!(err, QuizError::MalformedQuestion(_)));
    }

    #[rstest]
    #[case(-3, 0)]
    #[case(0, 0)]
    #[case(2, 2)]
    #[case(3, 3)]
    #[case(4, 3)]
    #[case(99, 3)]
    fn test_out_of_range_index_is_clamped(#[case] index: i64, #[case] expected: usize) {
        let q = from_storage_row(&row(index));

        assert_eq!(q.correct_count(), 1);
        assert!(q.answers[expected].correct);
    }

    #[test]
    fn test_from_storage_row_carries_id() {
        let q = from_storage_row(&row(1));
        assert_eq!(q.id, Some(42));
        assert_eq!(q.answers.len(), ANSWER_COUNT);
    }

    #[test]
    fn test_normalize_keeps_id_and_repairs_correctness() {
        let q = question(&[false, true, true, false]).with_id(9);
        let normalized = normalize(&q).unwrap();

        assert_eq!(normalized.id, Some(9));
        assert_eq!(normalized.correct_count(), 1);
        assert!(normalized.answers[1].correct);
    }
}
