//! Question bank: an ordered, immutable collection of validated questions.

use std::collections::HashSet;

use crate::model::{Category, Difficulty, Question, QuestionDraft, QuestionError};

/// Ordered, read-only set of questions with unique ids.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// # Errors
    ///
    /// Returns `QuestionError::DuplicateId` if two questions share an id.
    pub fn new(questions: Vec<Question>) -> Result<Self, QuestionError> {
        let mut seen = HashSet::with_capacity(questions.len());
        for question in &questions {
            if !seen.insert(question.id()) {
                return Err(QuestionError::DuplicateId(question.id().to_owned()));
            }
        }
        Ok(Self { questions })
    }

    /// Validates every draft, then builds the bank.
    ///
    /// # Errors
    ///
    /// Returns the first `QuestionError` raised by a draft or by the id uniqueness check.
    pub fn from_drafts(drafts: impl IntoIterator<Item = QuestionDraft>) -> Result<Self, QuestionError> {
        let questions = drafts
            .into_iter()
            .map(QuestionDraft::validate)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(questions)
    }

    /// The bundled question set: five questions per difficulty tier.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the bundled content fails validation.
    pub fn builtin() -> Result<Self, QuestionError> {
        Self::from_drafts(BUILTIN.iter().map(BuiltinQuestion::to_draft))
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }
}

//
// ─── BUNDLED CONTENT ──────────────────────────────────────────────────────────
//

struct BuiltinQuestion {
    id: &'static str,
    prompt: &'static str,
    options: [&'static str; 4],
    correct_answer: usize,
    explanation: &'static str,
    difficulty: Difficulty,
    category: Category,
}

impl BuiltinQuestion {
    fn to_draft(&self) -> QuestionDraft {
        QuestionDraft {
            id: self.id.to_owned(),
            prompt: self.prompt.to_owned(),
            options: self.options.iter().map(|o| (*o).to_owned()).collect(),
            correct_answer: self.correct_answer,
            explanation: self.explanation.to_owned(),
            difficulty: self.difficulty,
            category: self.category,
        }
    }
}

const BUILTIN: &[BuiltinQuestion] = &[
    BuiltinQuestion {
        id: "q1",
        prompt: "What is decimal 5 in binary?",
        options: ["100", "101", "110", "111"],
        correct_answer: 1,
        explanation: "5÷2=2 r1, 2÷2=1 r0, 1÷2=0 r1. Reading the remainders from the last one up gives 101.",
        difficulty: Difficulty::Beginner,
        category: Category::Conversion,
    },
    BuiltinQuestion {
        id: "q2",
        prompt: "What is binary 1010 in decimal?",
        options: ["8", "9", "10", "11"],
        correct_answer: 2,
        explanation: "1×2³ + 0×2² + 1×2¹ + 0×2⁰ = 8 + 0 + 2 + 0 = 10",
        difficulty: Difficulty::Beginner,
        category: Category::Conversion,
    },
    BuiltinQuestion {
        id: "q3",
        prompt: "What is hexadecimal A in decimal?",
        options: ["9", "10", "11", "12"],
        correct_answer: 1,
        explanation: "Hexadecimal uses A=10, B=11, C=12, D=13, E=14 and F=15.",
        difficulty: Difficulty::Beginner,
        category: Category::Concept,
    },
    BuiltinQuestion {
        id: "q4",
        prompt: "What is octal 12 in decimal?",
        options: ["8", "9", "10", "12"],
        correct_answer: 2,
        explanation: "1×8¹ + 2×8⁰ = 8 + 2 = 10",
        difficulty: Difficulty::Beginner,
        category: Category::Conversion,
    },
    BuiltinQuestion {
        id: "q5",
        prompt: "What is decimal 15 in hexadecimal?",
        options: ["E", "F", "10", "15"],
        correct_answer: 1,
        explanation: "15 is written F in hexadecimal. 16 rolls over to 10.",
        difficulty: Difficulty::Beginner,
        category: Category::Conversion,
    },
    BuiltinQuestion {
        id: "q6",
        prompt: "What is binary 11011 in octal?",
        options: ["31", "32", "33", "34"],
        correct_answer: 2,
        explanation: "Split 11011 into groups of three from the right: 011 011. Each 011₂ is 3₈, so the answer is 33₈.",
        difficulty: Difficulty::Intermediate,
        category: Category::Conversion,
    },
    BuiltinQuestion {
        id: "q7",
        prompt: "What is hexadecimal 2F in binary?",
        options: ["101111", "100111", "110111", "111111"],
        correct_answer: 0,
        explanation: "2₁₆=0010₂ and F₁₆=1111₂, so 2F₁₆=00101111₂=101111₂",
        difficulty: Difficulty::Intermediate,
        category: Category::Conversion,
    },
    BuiltinQuestion {
        id: "q8",
        prompt: "What is decimal 100 in binary?",
        options: ["1100100", "1100101", "1100110", "1100111"],
        correct_answer: 0,
        explanation: "100÷2=50 r0, 50÷2=25 r0, 25÷2=12 r1, 12÷2=6 r0, 6÷2=3 r0, 3÷2=1 r1, 1÷2=0 r1. Reading upwards gives 1100100.",
        difficulty: Difficulty::Intermediate,
        category: Category::Conversion,
    },
    BuiltinQuestion {
        id: "q9",
        prompt: "What is octal 77 in hexadecimal?",
        options: ["3D", "3E", "3F", "40"],
        correct_answer: 2,
        explanation: "77₈ = 7×8¹ + 7×8⁰ = 56 + 7 = 63₁₀ = 3F₁₆",
        difficulty: Difficulty::Intermediate,
        category: Category::Conversion,
    },
    BuiltinQuestion {
        id: "q10",
        prompt: "What is the largest decimal value one byte (8 bits) can hold?",
        options: ["127", "128", "255", "256"],
        correct_answer: 2,
        explanation: "With all eight bits set, 11111111₂ = 255₁₀.",
        difficulty: Difficulty::Intermediate,
        category: Category::Concept,
    },
    BuiltinQuestion {
        id: "q11",
        prompt: "In the IP address 192.168.1.1, what is the third octet (1) in 8-bit binary?",
        options: ["00000001", "00000010", "00000100", "00001000"],
        correct_answer: 0,
        explanation: "1₁₀ = 00000001₂ when written with 8 bits.",
        difficulty: Difficulty::Advanced,
        category: Category::Conversion,
    },
    BuiltinQuestion {
        id: "q12",
        prompt: "In the color code #FF00FF, what is the decimal value of the green (G) channel?",
        options: ["0", "15", "240", "255"],
        correct_answer: 0,
        explanation: "#FF00FF means R=FF₁₆=255₁₀, G=00₁₆=0₁₀ and B=FF₁₆=255₁₀.",
        difficulty: Difficulty::Advanced,
        category: Category::Conversion,
    },
    BuiltinQuestion {
        id: "q13",
        prompt: "For the Unix permission 755, what is the owner digit in binary?",
        options: ["101", "110", "111", "1000"],
        correct_answer: 2,
        explanation: "7₈ = 111₂ (read + write + execute).",
        difficulty: Difficulty::Advanced,
        category: Category::Conversion,
    },
    BuiltinQuestion {
        id: "q14",
        prompt: "In 8-bit two's complement, what decimal value does 10000001 represent?",
        options: ["-1", "-127", "-128", "129"],
        correct_answer: 1,
        explanation: "The top bit is set, so the value is negative. Invert to 01111110 and add 1 to get 01111111 = 127, so the value is -127.",
        difficulty: Difficulty::Advanced,
        category: Category::Calculation,
    },
    BuiltinQuestion {
        id: "q15",
        prompt: "How many bits are needed to write hexadecimal ABCD in binary?",
        options: ["12", "14", "16", "20"],
        correct_answer: 2,
        explanation: "Each hexadecimal digit is 4 bits. ABCD has 4 digits, so 4×4 = 16 bits.",
        difficulty: Difficulty::Advanced,
        category: Category::Concept,
    },
];
