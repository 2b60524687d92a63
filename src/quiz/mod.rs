pub mod bank;
pub mod chat_lock;
pub mod countdown;
pub mod sampler;
pub mod scoring;
pub mod session;

/// One letter per option, `a` to `z`.
pub const MAX_OPTIONS: usize = 26;

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Question {
    pub id: u32,
    pub question: String,
    pub options: Vec<String>,
    #[serde(alias = "correctAnswer")]
    pub correct_answer: usize,
}

impl Question {
    pub fn new(id: u32, question: &str, options: &[&str], correct_answer: usize) -> Self {
        Self {
            id,
            question: question.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            correct_answer,
        }
    }

    pub fn is_correct(&self, option: usize) -> bool {
        option == self.correct_answer
    }

    /// Text of the correct option, `None` if the index points outside the options.
    pub fn correct_option(&self) -> Option<&str> {
        self.options.get(self.correct_answer).map(String::as_str)
    }

    /// Keyboard labels in display order: `a) London`, `b) Berlin`, ...
    /// Options past [`MAX_OPTIONS`] fall back to their 1-based number.
    pub fn option_labels(&self) -> Vec<String> {
        self.options
            .iter()
            .enumerate()
            .map(|(i, option)| format!("{}) {}", option_letter(i), option))
            .collect()
    }

    /// Maps a reply back to an option index.
    /// Accepts the full keyboard label, a bare letter (`b`, `B)`) or the option text itself.
    pub fn parse_reply(&self, reply: &str) -> Option<usize> {
        let reply = reply.trim();
        if let Some(i) = self.option_labels().iter().position(|l| l == reply) {
            return Some(i);
        }
        if let Some(i) = self.options.iter().position(|o| o.eq_ignore_ascii_case(reply)) {
            return Some(i);
        }

        let letter = reply.trim_end_matches(')');
        let mut chars = letter.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphabetic() => {
                let i = (c.to_ascii_lowercase() as u8 - b'a') as usize;
                (i < self.options.len()).then_some(i)
            }
            _ => None,
        }
    }
}

fn option_letter(index: usize) -> String {
    if index < MAX_OPTIONS {
        char::from(b'a' + index as u8).to_string()
    } else {
        (index + 1).to_string()
    }
}
