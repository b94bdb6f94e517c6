use lingodeck_api::models::attempt::Answer;
use lingodeck_api::models::quiz::{total_points, AnswerOption, Question};
use lingodeck_api::services::attempt_service::{
    average_percentage, earned_score, score_distribution, score_percentage,
};

fn question(points: u32, correct_option: usize) -> Question {
    Question {
        text: format!("worth {} points", points),
        options: (0..4)
            .map(|i| AnswerOption {
                text: format!("option {}", i),
                is_correct: i == correct_option,
            })
            .collect(),
        explanation: None,
        points,
    }
}

/// Walks a five-question quiz the way the answer/completion flow does:
/// grade each selection against the quiz, then score the recorded answers.
#[test]
fn grading_five_equal_questions_with_three_correct() {
    let questions: Vec<Question> = (0..5).map(|_| question(1, 0)).collect();
    // Selections for questions 0..5; options 0 are correct
    let selections = [0usize, 0, 0, 1, 2];

    let answers: Vec<Answer> = selections
        .iter()
        .enumerate()
        .map(|(index, &selected)| {
            let q = &questions[index];
            let is_correct = q.options[selected].is_correct;
            Answer {
                question_index: index as u32,
                selected_option: selected as u32,
                is_correct,
                points: if is_correct { q.points } else { 0 },
            }
        })
        .collect();

    let score = earned_score(&answers);
    let total = total_points(&questions);

    assert_eq!(score, 3);
    assert_eq!(total, 5);
    assert_eq!(score_percentage(score, total), 60);
}

#[test]
fn weighted_questions_score_by_points_not_count() {
    let questions = vec![question(5, 0), question(1, 0), question(1, 0)];
    // Only the heavy question answered correctly
    let answers = vec![
        Answer {
            question_index: 0,
            selected_option: 0,
            is_correct: true,
            points: 5,
        },
        Answer {
            question_index: 1,
            selected_option: 2,
            is_correct: false,
            points: 0,
        },
        Answer {
            question_index: 2,
            selected_option: 3,
            is_correct: false,
            points: 0,
        },
    ];

    assert_eq!(earned_score(&answers), 5);
    assert_eq!(total_points(&questions), 7);
    assert_eq!(score_percentage(5, 7), 71);
}

#[test]
fn unanswered_questions_simply_earn_nothing() {
    // Two of five questions answered; the rest contribute no entries
    let answers = vec![
        Answer {
            question_index: 1,
            selected_option: 0,
            is_correct: true,
            points: 1,
        },
        Answer {
            question_index: 4,
            selected_option: 0,
            is_correct: true,
            points: 1,
        },
    ];

    assert_eq!(earned_score(&answers), 2);
    assert_eq!(score_percentage(2, 5), 40);
}

#[test]
fn quiz_with_no_questions_completes_at_zero_percent() {
    let questions: Vec<Question> = Vec::new();
    assert_eq!(total_points(&questions), 0);
    assert_eq!(score_percentage(earned_score(&[]), total_points(&questions)), 0);
}

#[test]
fn statistics_over_a_mixed_cohort() {
    let percentages = [95u32, 82, 71, 65, 40];

    let distribution = score_distribution(percentages.iter().copied());
    let serialized = serde_json::to_value(&distribution).unwrap();

    // Bucket labels are part of the wire format
    assert_eq!(serialized["A (90-100%)"], 1);
    assert_eq!(serialized["B (80-89%)"], 1);
    assert_eq!(serialized["C (70-79%)"], 1);
    assert_eq!(serialized["D (60-69%)"], 1);
    assert_eq!(serialized["F (Below 60%)"], 1);

    assert_eq!(average_percentage(percentages.iter().copied()), 71);
}

#[test]
fn average_rounds_to_nearest_integer() {
    assert_eq!(average_percentage([50u32, 51].into_iter()), 51);
    assert_eq!(average_percentage([50u32, 50, 51].into_iter()), 50);
}
