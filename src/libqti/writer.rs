use crate::libqti::error::{Error, Result};
use crate::libqti::question::{Question, QuestionType, QuizMetadata};
use log::{debug, info};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static QUESTION_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\.\s").unwrap());

/// `<title>.txt`, with anything that would not survive as a file name replaced.
/// `None` when no usable name is left.
pub fn quiz_file_name(meta: &QuizMetadata) -> Option<String> {
    let stem = sanitize_filename::sanitize(meta.title.as_deref()?);
    if stem.trim().is_empty() {
        return None;
    }
    Some(format!("{stem}.txt"))
}

/// Renders the quiz in the plain-text layout `text2qti` reads.
///
/// Every question is numbered `1.`; run [`renumber_text`] over the result for a
/// proper sequence.
pub fn render_quiz(meta: &QuizMetadata, questions: &[Question]) -> String {
    let mut out = String::new();
    out.push_str(&format!("Quiz title: {}\n", meta.title.as_deref().unwrap_or_default()));
    out.push_str(&format!("Quiz description: {}\n", meta.description));
    out.push_str(&format!("shuffle answers: {}\n", meta.shuffle_answers));
    out.push_str(&format!("show correct answers: {}\n", meta.show_correct_answers));

    for question in questions {
        out.push_str(&format!("\n1. {}\n", question.question_text));
        match question.question_type {
            QuestionType::TrueFalse | QuestionType::MultipleChoice => {
                for (idx, choice) in question.choices.iter().enumerate() {
                    let marker = if question.is_correct(choice) { "*" } else { "" };
                    out.push_str(&format!("{}{}) {}\n", marker, choice_letter(idx), choice.text));
                }
            }
            QuestionType::MultipleAnswers => {
                for choice in &question.choices {
                    let mark = if question.is_correct(choice) { "[*]" } else { "[]" };
                    out.push_str(&format!("{} {}\n", mark, choice.text));
                }
            }
            QuestionType::Other(ref kind) => {
                debug!("[Writer] No choice layout for {kind:?}, writing the prompt only");
            }
        }
    }
    out
}

fn choice_letter(idx: usize) -> char {
    char::from_u32('a' as u32 + idx as u32).unwrap_or('?')
}

/// Writes the rendered quiz to `<out_dir>/<title>.txt`. A header without a title
/// produces no file.
pub fn write_quiz(meta: &QuizMetadata, questions: &[Question], out_dir: &Path) -> Result<PathBuf> {
    let file_name = quiz_file_name(meta).ok_or(Error::MissingTitle)?;
    let path = out_dir.join(file_name);
    fs::write(&path, render_quiz(meta, questions))?;
    info!("[Writer] Wrote {} questions to {:?}", questions.len(), path);
    Ok(path)
}

/// Rewrites every `<digits>. ` line prefix into 1, 2, 3, … in file order.
pub fn renumber_text(text: &str) -> String {
    let mut number = 0;
    let mut out = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        let (body, ending) = match line.strip_suffix('\n') {
            Some(body) => (body, "\n"),
            None => (line, ""),
        };
        if QUESTION_NUMBER.is_match(body) {
            number += 1;
            out.push_str(&QUESTION_NUMBER.replace(body, format!("{number}. ")));
        } else {
            out.push_str(body);
        }
        out.push_str(ending);
    }
    out
}

pub fn renumber_file(path: &Path) -> Result<usize> {
    let text = fs::read_to_string(path)?;
    let renumbered = renumber_text(&text);
    let count = renumbered
        .lines()
        .filter(|line| QUESTION_NUMBER.is_match(line))
        .count();
    fs::write(path, renumbered)?;
    info!("[Writer] Renumbered {count} questions in {:?}", path);
    Ok(count)
}
