use crate::libqti::cleaner::html_to_clean_text;
use crate::libqti::dom::Element;
use crate::libqti::error::Result;
use log::{debug, warn};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

const HEADER_TAGS: [&str; 4] = ["title", "description", "shuffle_answers", "show_correct_answers"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuizMetadata {
    pub title: Option<String>,
    pub description: String,
    pub shuffle_answers: String,
    pub show_correct_answers: String,
}

impl QuizMetadata {
    /// Scans a stripped `assessment_meta` document for the header tags. When a tag
    /// shows up more than once the last occurrence wins.
    pub fn from_header(root: &Element) -> QuizMetadata {
        let mut meta = QuizMetadata::default();
        for elem in root.iter().filter(|e| HEADER_TAGS.contains(&e.name.as_str())) {
            let value = elem.text().unwrap_or_default().to_string();
            match elem.name.as_str() {
                "title" => meta.title = Some(value).filter(|t| !t.trim().is_empty()),
                "description" => meta.description = html_to_clean_text(Some(value.as_str())),
                "shuffle_answers" => meta.shuffle_answers = value,
                "show_correct_answers" => meta.show_correct_answers = value,
                _ => {}
            }
        }
        debug!("[Header] {:?}", meta);
        meta
    }

    pub fn read(path: &Path) -> Result<QuizMetadata> {
        Ok(Self::from_header(&Element::parse_file(path)?))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionType {
    TrueFalse,
    MultipleChoice,
    MultipleAnswers,
    Other(String),
}

impl QuestionType {
    pub fn from_field(value: &str) -> QuestionType {
        match value {
            "true_false_question" => QuestionType::TrueFalse,
            "multiple_choice_question" => QuestionType::MultipleChoice,
            "multiple_answers_question" => QuestionType::MultipleAnswers,
            other => QuestionType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            QuestionType::TrueFalse => "true_false_question",
            QuestionType::MultipleChoice => "multiple_choice_question",
            QuestionType::MultipleAnswers => "multiple_answers_question",
            QuestionType::Other(other) => other,
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub text: String,
    pub ident: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub question_type: QuestionType,
    pub points_possible: String,
    pub question_text: String,
    pub choices: Vec<Choice>,
    pub correct_choices: BTreeSet<String>,
}

impl Question {
    pub fn from_item(item: &Element) -> Question {
        let question_type = metadata_field(item, "question_type")
            .map(QuestionType::from_field)
            .unwrap_or_else(|| QuestionType::Other(String::new()));
        let points_possible = metadata_field(item, "points_possible")
            .unwrap_or_default()
            .to_string();

        let question_text = item
            .find("material")
            .and_then(|m| m.child("mattext"))
            .map(|t| html_to_clean_text(t.text()))
            .unwrap_or_default();

        let choices: Vec<Choice> = item
            .find_all("response_label")
            .map(|label| Choice {
                text: html_to_clean_text(label.find("mattext").and_then(Element::text)),
                ident: label.attr("ident").unwrap_or_default().to_string(),
            })
            .collect();

        let correct_choices = correct_choices(item);
        for ident in &correct_choices {
            if !choices.iter().any(|c| &c.ident == ident) {
                warn!("[Extract] Correct answer {ident:?} matches none of the choices");
            }
        }

        Question {
            question_type,
            points_possible,
            question_text,
            choices,
            correct_choices,
        }
    }

    pub fn is_correct(&self, choice: &Choice) -> bool {
        self.correct_choices.contains(&choice.ident)
    }
}

/// Works out which response identifiers are correct for an `item`.
///
/// A single `varequal` names the correct choice outright (true/false and
/// single-answer questions). With several, the item lists every choice and wraps
/// the wrong ones in `not`, so the answer is everything minus the negated values.
pub fn correct_choices(item: &Element) -> BTreeSet<String> {
    let all: Vec<String> = item.find_all("varequal").map(varequal_value).collect();

    match all.len() {
        0 => BTreeSet::new(),
        1 => all.into_iter().collect(),
        _ => {
            let excluded: BTreeSet<String> = item
                .find_all("not")
                .flat_map(|not| not.find_all("varequal"))
                .map(varequal_value)
                .collect();
            all.into_iter().filter(|v| !excluded.contains(v)).collect()
        }
    }
}

fn varequal_value(node: &Element) -> String {
    node.text().unwrap_or_default().trim().to_string()
}

/// Value of the `qtimetadatafield` labelled `label`, if the item carries one.
fn metadata_field<'a>(item: &'a Element, label: &str) -> Option<&'a str> {
    item.find_all("qtimetadatafield")
        .find(|field| field.child("fieldlabel").and_then(Element::text) == Some(label))
        .and_then(|field| field.child("fieldentry"))
        .map(|entry| entry.text().unwrap_or_default())
}

/// One record per `<item title="Question">`, in document order.
pub fn extract_questions(root: &Element) -> Vec<Question> {
    let questions: Vec<Question> = root
        .find_all("item")
        .filter(|item| item.attr("title") == Some("Question"))
        .map(Question::from_item)
        .collect();
    debug!("[Extract] Found {} questions", questions.len());
    questions
}

pub fn read_questions(path: &Path) -> Result<Vec<Question>> {
    Ok(extract_questions(&Element::parse_file(path)?))
}

#[cfg(test)]
pub(crate) mod fixtures {
    pub const HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<quiz identifier="q1">
  <title>Quiz A</title>
  <description>&lt;p&gt;Hi&lt;/p&gt;</description>
  <shuffle_answers>true</shuffle_answers>
  <show_correct_answers>false</show_correct_answers>
  <points_possible>3.0</points_possible>
</quiz>"#;

    pub const TRUE_FALSE_ITEM: &str = r#"<item ident="i1" title="Question">
  <itemmetadata><qtimetadata>
    <qtimetadatafield><fieldlabel>question_type</fieldlabel><fieldentry>true_false_question</fieldentry></qtimetadatafield>
    <qtimetadatafield><fieldlabel>points_possible</fieldlabel><fieldentry>1.0</fieldentry></qtimetadatafield>
  </qtimetadata></itemmetadata>
  <presentation>
    <material><mattext texttype="text/html">&lt;p&gt;The sky is blue.&lt;/p&gt;</mattext></material>
    <response_lid ident="response1" rcardinality="Single">
      <render_choice>
        <response_label ident="7459"><material><mattext texttype="text/plain">True</mattext></material></response_label>
        <response_label ident="6392"><material><mattext texttype="text/plain">False</mattext></material></response_label>
      </render_choice>
    </response_lid>
  </presentation>
  <resprocessing>
    <respcondition continue="No">
      <conditionvar><varequal respident="response1">7459</varequal></conditionvar>
      <setvar action="Set" varname="SCORE">100</setvar>
    </respcondition>
  </resprocessing>
</item>"#;

    pub const MULTI_ANSWER_ITEM: &str = r#"<item ident="i2" title="Question">
  <itemmetadata><qtimetadata>
    <qtimetadatafield><fieldlabel>question_type</fieldlabel><fieldentry>multiple_answers_question</fieldentry></qtimetadatafield>
    <qtimetadatafield><fieldlabel>points_possible</fieldlabel><fieldentry>2.0</fieldentry></qtimetadatafield>
  </qtimetadata></itemmetadata>
  <presentation>
    <material><mattext texttype="text/html">&lt;p&gt;Pick the odd numbers&lt;/p&gt;</mattext></material>
    <response_lid ident="response1" rcardinality="Multiple">
      <render_choice>
        <response_label ident="1"><material><mattext texttype="text/plain">One</mattext></material></response_label>
        <response_label ident="2"><material><mattext texttype="text/plain">Two</mattext></material></response_label>
        <response_label ident="3"><material><mattext texttype="text/plain">Three</mattext></material></response_label>
      </render_choice>
    </response_lid>
  </presentation>
  <resprocessing>
    <respcondition continue="No">
      <conditionvar>
        <and>
          <varequal respident="response1">1</varequal>
          <not><varequal respident="response1">2</varequal></not>
          <varequal respident="response1">3</varequal>
        </and>
      </conditionvar>
      <setvar action="Set" varname="SCORE">100</setvar>
    </respcondition>
  </resprocessing>
</item>"#;

    pub fn questions_doc(items: &[&str]) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<questestinterop><assessment ident=\"a1\" title=\"Quiz A\"><section ident=\"root_section\">{}</section></assessment></questestinterop>",
            items.concat()
        )
    }
}
