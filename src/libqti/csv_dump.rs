use crate::libqti::error::Result;
use crate::libqti::question::Question;
use log::{info, warn};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
struct QuestionRow<'a> {
    question_type: &'a str,
    points_possible: &'a str,
    question_text: &'a str,
    choices: String,
    correct_choices: String,
}

impl<'a> QuestionRow<'a> {
    fn new(question: &'a Question) -> Result<Self> {
        Ok(QuestionRow {
            question_type: question.question_type.as_str(),
            points_possible: &question.points_possible,
            question_text: &question.question_text,
            choices: serde_json::to_string(&question.choices)?,
            correct_choices: serde_json::to_string(&question.correct_choices)?,
        })
    }
}

/// Dumps the extracted questions, one row each. Returns `false` without touching
/// the file system when there is nothing to write.
pub fn write_csv(path: &Path, questions: &[Question]) -> Result<bool> {
    if questions.is_empty() {
        warn!("[CSV] No questions, skipping {:?}", path);
        return Ok(false);
    }
    let mut writer = csv::Writer::from_path(path)?;
    for question in questions {
        writer.serialize(QuestionRow::new(question)?)?;
    }
    writer.flush()?;
    info!("[CSV] Question details saved to {:?}", path);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libqti::question::{Choice, QuestionType};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn writes_header_and_rows() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("question_details.csv");
        let question = Question {
            question_type: QuestionType::TrueFalse,
            points_possible: "1.0".into(),
            question_text: "Is it, really?".into(),
            choices: vec![
                Choice { text: "True".into(), ident: "7459".into() },
                Choice { text: "False".into(), ident: "6392".into() },
            ],
            correct_choices: ["7459".to_string()].into_iter().collect(),
        };

        assert!(write_csv(&path, &[question]).unwrap());

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(
            headers,
            vec!["question_type", "points_possible", "question_text", "choices", "correct_choices"]
        );
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][0], "true_false_question");
        assert_eq!(&rows[0][2], "Is it, really?");
        assert_eq!(
            &rows[0][3],
            r#"[{"text":"True","ident":"7459"},{"text":"False","ident":"6392"}]"#
        );
        assert_eq!(&rows[0][4], r#"["7459"]"#);
    }

    #[test]
    fn empty_input_writes_no_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("question_details.csv");
        assert!(!write_csv(&path, &[]).unwrap());
        assert!(!path.exists());
        assert!(fs::read_dir(tmp.path()).unwrap().next().is_none());
    }
}
