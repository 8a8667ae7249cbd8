//! Shared test fixtures.

use crate::model::*;

pub fn exercise(kind: ExerciseType, questions: Vec<Question>) -> Exercise {
    Exercise {
        id: "ex-1".into(),
        title: "Fixture".into(),
        description: String::new(),
        kind,
        subject: "sub-1".into(),
        class: "cls-1".into(),
        school: None,
        created_by: None,
        difficulty: Difficulty::Medium,
        total_points: questions.iter().map(Question::points).sum(),
        questions,
        metadata: ExerciseMetadata::default(),
        due_date: None,
        created_at: None,
    }
}

pub fn qcm(question: &str, options: &[(&str, bool)]) -> Question {
    Question::Qcm(QcmQuestion {
        question: question.into(),
        options: options
            .iter()
            .map(|(id, correct)| QcmOption {
                id: (*id).into(),
                text: format!("option {id}"),
                is_correct: Some(*correct),
            })
            .collect(),
        points: 1,
    })
}

pub fn fill_blank(sentence: &str, answers: &[&str]) -> Question {
    Question::FillBlank(FillBlankQuestion {
        sentence: sentence.into(),
        blanks: answers
            .iter()
            .map(|a| BlankDefinition {
                correct_answer: (*a).into(),
                alternatives: vec![],
            })
            .collect(),
        points: 2,
    })
}

pub fn three_question_qcm() -> Exercise {
    exercise(
        ExerciseType::Qcm,
        vec![
            qcm("Q1", &[("optA", true), ("optB", false)]),
            qcm("Q2", &[("optC", false), ("optD", true)]),
            qcm("Q3", &[("optE", true), ("optF", false)]),
        ],
    )
}

pub fn cat_sentence() -> Exercise {
    exercise(
        ExerciseType::FillBlanks,
        vec![fill_blank("Le ___ est ___.", &["chat", "noir"])],
    )
}

pub fn attempt(number: u32, accuracy: f64) -> StudentProgress {
    StudentProgress {
        id: format!("prog-{number}"),
        student: "stu-1".into(),
        exercise: "ex-1".into(),
        subject: None,
        class: None,
        qcm_answers: vec![],
        fill_blank_answers: vec![],
        total_points: accuracy / 10.0,
        max_points: 10.0,
        accuracy,
        started_at: None,
        completed_at: None,
        time_spent: 60,
        attempt_number: number,
    }
}
