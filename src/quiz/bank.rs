use std::collections::HashSet;
use std::io::Read;

use thiserror::Error;

use crate::quiz::{Question, MAX_OPTIONS};

#[derive(Debug, Error)]
pub enum BankError {
    #[error("unable to read question file: {0}")]
    Io(#[from] std::io::Error),

    #[error("unable to parse question file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("question {0} has no options")]
    NoOptions(u32),

    #[error("question {id} has {options} options, at most {max} are allowed", max = MAX_OPTIONS)]
    TooManyOptions { id: u32, options: usize },

    #[error("question {id} marks option {correct_answer} as correct but has only {options} options")]
    CorrectAnswerOutOfRange {
        id: u32,
        correct_answer: usize,
        options: usize,
    },

    #[error("question id {0} appears more than once")]
    DuplicateId(u32),
}

/// The pool quizzes are sampled from.
#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
    pub questions: Vec<Question>,
}

impl QuestionBank {
    pub fn new(questions: Vec<Question>) -> Result<Self, BankError> {
        let mut ids = HashSet::new();
        for q in &questions {
            if q.options.is_empty() {
                return Err(BankError::NoOptions(q.id));
            }
            if q.options.len() > MAX_OPTIONS {
                return Err(BankError::TooManyOptions {
                    id: q.id,
                    options: q.options.len(),
                });
            }
            if q.correct_answer >= q.options.len() {
                return Err(BankError::CorrectAnswerOutOfRange {
                    id: q.id,
                    correct_answer: q.correct_answer,
                    options: q.options.len(),
                });
            }
            if !ids.insert(q.id) {
                return Err(BankError::DuplicateId(q.id));
            }
        }
        Ok(Self { questions })
    }

    /// Reads a JSON array of questions.
    pub fn from_reader(reader: impl Read) -> Result<Self, BankError> {
        let questions: Vec<Question> = serde_json::from_reader(reader)?;
        Self::new(questions)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// The general-knowledge set the quiz ships with.
    pub fn builtin() -> Self {
        let questions = vec![
            Question::new(1, "What is the capital of France?", &["London", "Berlin", "Paris", "Madrid"], 2),
            Question::new(2, "Which planet is known as the Red Planet?", &["Venus", "Mars", "Jupiter", "Saturn"], 1),
            Question::new(3, "What is the largest mammal in the world?", &["African Elephant", "Blue Whale", "Giraffe", "Polar Bear"], 1),
            Question::new(4, "In which year did World War II end?", &["1944", "1945", "1946", "1947"], 1),
            Question::new(5, "What is the chemical symbol for gold?", &["Go", "Au", "Ag", "Gd"], 1),
            Question::new(6, "Which programming language was created by Brendan Eich?", &["Python", "Java", "JavaScript", "C++"], 2),
            Question::new(7, "What is the smallest country in the world?", &["Monaco", "Vatican City", "San Marino", "Liechtenstein"], 1),
            Question::new(8, "Who painted the Mona Lisa?", &["Vincent van Gogh", "Pablo Picasso", "Leonardo da Vinci", "Michelangelo"], 2),
            Question::new(9, "What is the longest river in the world?", &["Amazon River", "Nile River", "Yangtze River", "Mississippi River"], 1),
            Question::new(10, "Which element has the atomic number 1?", &["Helium", "Hydrogen", "Lithium", "Carbon"], 1),
            Question::new(11, "What is the speed of light in a vacuum?", &["299,792,458 m/s", "300,000,000 m/s", "186,000 miles/s", "299,792,458 km/s"], 0),
            Question::new(12, "Which Shakespeare play features the characters Romeo and Juliet?", &["Hamlet", "Macbeth", "Romeo and Juliet", "Othello"], 2),
            Question::new(13, "What is the largest ocean on Earth?", &["Atlantic Ocean", "Indian Ocean", "Arctic Ocean", "Pacific Ocean"], 3),
            Question::new(14, "In what year was the first iPhone released?", &["2006", "2007", "2008", "2009"], 1),
            Question::new(15, "What is the hardest natural substance on Earth?", &["Gold", "Iron", "Diamond", "Quartz"], 2),
        ];
        Self { questions }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_bank_is_valid() {
        let bank = QuestionBank::builtin();
        assert_eq!(bank.len(), 15);
        assert!(QuestionBank::new(bank.questions).is_ok());
    }

    #[test]
    fn loads_json_array() {
        let json = r#"[
            {"id": 1, "question": "2 + 2?", "options": ["3", "4"], "correct_answer": 1},
            {"id": 2, "question": "Sky?", "options": ["Blue", "Green"], "correctAnswer": 0}
        ]"#;
        let bank = QuestionBank::from_reader(json.as_bytes()).unwrap();
        assert_eq!(bank.len(), 2);
        assert_eq!(bank.questions[1].correct_option(), Some("Blue"));
    }

    #[test]
    fn rejects_out_of_range_answer() {
        let json = r#"[{"id": 3, "question": "?", "options": ["A", "B"], "correct_answer": 2}]"#;
        assert!(matches!(
            QuestionBank::from_reader(json.as_bytes()),
            Err(BankError::CorrectAnswerOutOfRange { id: 3, correct_answer: 2, options: 2 })
        ));
    }

    #[test]
    fn rejects_duplicate_ids_and_empty_options() {
        let dup = vec![
            Question::new(1, "A", &["x"], 0),
            Question::new(1, "B", &["y"], 0),
        ];
        assert!(matches!(QuestionBank::new(dup), Err(BankError::DuplicateId(1))));

        let empty = vec![Question::new(5, "A", &[], 0)];
        assert!(matches!(QuestionBank::new(empty), Err(BankError::NoOptions(5))));
    }

    #[test]
    fn caps_options_at_one_letter_each() {
        let letters = ('a'..='z').map(|c| c.to_string()).collect::<Vec<_>>();
        let mut refs = letters.iter().map(String::as_str).collect::<Vec<_>>();
        assert!(QuestionBank::new(vec![Question::new(1, "A-Z", &refs, 25)]).is_ok());

        refs.push("extra");
        assert!(matches!(
            QuestionBank::new(vec![Question::new(2, "Too many", &refs, 0)]),
            Err(BankError::TooManyOptions { id: 2, options: 27 })
        ));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            QuestionBank::from_reader("{not json".as_bytes()),
            Err(BankError::Parse(_))
        ));
    }
}
