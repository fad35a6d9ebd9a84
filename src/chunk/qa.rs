//! Parser for "Question ... / Answer ..." formatted FAQ documents.
//!
//! A three-state machine over input lines:
//!
//! ```text
//! SeekQuestion --question header--> InQuestion --answer header--> InAnswer
//!      ^                                 |  ^                        |
//!      |                (new question header: orphan discarded)      |
//!      +--------------- (new question header: emit pair) ------------+
//! ```
//!
//! Lines are classified by tolerant regex patterns (`Q:` / `Ques. 1:` /
//! `Question 2 -` and `A:` / `Ans:` / `Answer -`), and the state
//! machine is an explicit [`State`] enum with one transition per
//! `(state, line class)` combination so each transition is testable on
//! its own. A question that never receives an answer is discarded, not
//! emitted with an empty answer.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Matches a question header line, e.g. `Ques. 1: What is ...`,
/// `Question 2 - ...`, `Q: What is ...`, or `Q: 2: What is ...`.
static Q_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*q(?:ues(?:tion)?)?\.?\s*(?:no\.|#)?\s*(?:[:\-–]\s*)?(?P<num>\d+)?\s*[:\-–]\s*(?P<q>.+?)\s*$",
    )
    .unwrap_or_else(|_| unreachable!())
});

/// Matches an answer header line, e.g. `Ans: It is ...`,
/// `Answer - It is ...`, or `A: It is ...`.
static A_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*a(?:ns(?:wer)?)?\.?\s*[:\-–]\s*(?P<a>.*?)\s*$")
        .unwrap_or_else(|_| unreachable!())
});

/// Runs of horizontal whitespace, collapsed to a single space.
static HORIZONTAL_WS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+").unwrap_or_else(|_| unreachable!()));

/// One parsed question/answer pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaPair {
    /// Sequential id, starting at 1, independent of the optional
    /// question-number text in the source document.
    pub id: u64,
    /// The number text captured from the question header, if any.
    pub question_number: Option<String>,
    /// Normalized question text.
    pub question: String,
    /// Normalized answer text.
    pub answer: String,
}

impl QaPair {
    /// Combined text used for embedding and display.
    #[must_use]
    pub fn chunk_text(&self) -> String {
        format!("Q: {}\nA: {}", self.question, self.answer)
    }
}

/// Classification of a single input line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LineClass {
    /// A question header with an optional number and initial text.
    Question {
        number: Option<String>,
        text: String,
    },
    /// An answer header with optional initial text.
    Answer { text: String },
    /// Anything else.
    Plain,
}

/// Classifies one line against the header patterns.
fn classify(line: &str) -> LineClass {
    if let Some(caps) = Q_HEADER.captures(line) {
        return LineClass::Question {
            number: caps.name("num").map(|m| m.as_str().to_string()),
            text: caps
                .name("q")
                .map_or_else(String::new, |m| m.as_str().trim().to_string()),
        };
    }
    if let Some(caps) = A_HEADER.captures(line) {
        return LineClass::Answer {
            text: caps
                .name("a")
                .map_or_else(String::new, |m| m.as_str().trim().to_string()),
        };
    }
    LineClass::Plain
}

/// Parser state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Discarding lines until a question header appears.
    SeekQuestion,
    /// Accumulating question body lines.
    InQuestion,
    /// Accumulating answer body lines.
    InAnswer,
}

/// The question/answer being accumulated.
#[derive(Debug, Default)]
struct Pending {
    number: Option<String>,
    question: Vec<String>,
    answer: Vec<String>,
}

impl Pending {
    fn start_question(&mut self, number: Option<String>, first: &str) {
        self.number = number;
        self.question.clear();
        self.answer.clear();
        if !first.is_empty() {
            self.question.push(first.to_string());
        }
    }

    fn start_answer(&mut self, first: &str) {
        self.answer.clear();
        if !first.is_empty() {
            self.answer.push(first.to_string());
        }
    }
}

/// Incremental QA parser; feed lines, then [`finish`](QaParser::finish).
#[derive(Debug)]
pub struct QaParser {
    state: State,
    pending: Pending,
    pairs: Vec<QaPair>,
    next_id: u64,
}

impl Default for QaParser {
    fn default() -> Self {
        Self::new()
    }
}

impl QaParser {
    /// Creates a parser in the `SeekQuestion` state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: State::SeekQuestion,
            pending: Pending::default(),
            pairs: Vec::new(),
            next_id: 1,
        }
    }

    /// Processes one input line.
    pub fn feed_line(&mut self, line: &str) {
        self.state = match (self.state, classify(line)) {
            (State::SeekQuestion, LineClass::Question { number, text }) => {
                self.pending.start_question(number, &text);
                State::InQuestion
            }
            // Non-question lines before the first header are discarded.
            (State::SeekQuestion, _) => State::SeekQuestion,

            (State::InQuestion, LineClass::Answer { text }) => {
                self.pending.start_answer(&text);
                State::InAnswer
            }
            // A second question header before any answer: the orphaned
            // question is discarded and capture restarts.
            (State::InQuestion, LineClass::Question { number, text }) => {
                self.pending.start_question(number, &text);
                State::InQuestion
            }
            (State::InQuestion, LineClass::Plain) => {
                self.pending.question.push(line.trim().to_string());
                State::InQuestion
            }

            (State::InAnswer, LineClass::Question { number, text }) => {
                self.flush();
                self.pending.start_question(number, &text);
                State::InQuestion
            }
            // An answer header split across lines: seed only while the
            // answer body is still empty.
            (State::InAnswer, LineClass::Answer { text })
                if self.pending.answer.is_empty() =>
            {
                if !text.is_empty() {
                    self.pending.answer.push(text);
                }
                State::InAnswer
            }
            (State::InAnswer, _) => {
                self.pending.answer.push(line.trim().to_string());
                State::InAnswer
            }
        };
    }

    /// Finalizes parsing, emitting a trailing pair if the input ended
    /// inside an answer body.
    #[must_use]
    pub fn finish(mut self) -> Vec<QaPair> {
        if self.state == State::InAnswer {
            self.flush();
        }
        self.pairs
    }

    /// Emits the pending pair if both sides are non-empty after
    /// normalization, then resets the accumulator.
    fn flush(&mut self) {
        let question = normalize(&self.pending.question.join("\n"));
        let answer = normalize(&self.pending.answer.join("\n"));
        if !question.is_empty() && !answer.is_empty() {
            self.pairs.push(QaPair {
                id: self.next_id,
                question_number: self.pending.number.take(),
                question,
                answer,
            });
            self.next_id += 1;
        }
        self.pending = Pending::default();
    }
}

/// Parses a FAQ document into question/answer pairs.
#[must_use]
pub fn parse_qa_pairs(text: &str) -> Vec<QaPair> {
    let mut parser = QaParser::new();
    for line in text.lines() {
        parser.feed_line(line);
    }
    parser.finish()
}

/// Trims outer blank lines and collapses horizontal whitespace runs on
/// each line, preserving internal line breaks.
fn normalize(text: &str) -> String {
    let mut lines: Vec<String> = text
        .trim()
        .lines()
        .map(|ln| HORIZONTAL_WS.replace_all(ln.trim(), " ").into_owned())
        .collect();
    while lines.first().is_some_and(|l| l.is_empty()) {
        lines.remove(0);
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}
