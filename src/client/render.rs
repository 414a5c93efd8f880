//! Plain-text presentation of quizzes for the terminal.

use super::store::{QuizStore, Status};
use crate::models::Quiz;
use std::fmt::Write as _;

pub fn render_quiz(quiz: &Quiz) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}. {}", quiz.id, quiz.question);
    if let Some(description) = quiz.description.as_deref().filter(|d| !d.is_empty()) {
        let _ = writeln!(out, "   {}", description);
    }
    for (label, text) in &quiz.options {
        let marker = if *label == quiz.answer { '*' } else { ' ' };
        let _ = writeln!(out, "  {} {}) {}", marker, label, text);
    }
    for resource in quiz.resources.iter().flatten() {
        let _ = writeln!(out, "   - {} <{}>", resource.title, resource.link);
    }
    out
}

pub fn render_quizzes(quizzes: &[Quiz]) -> String {
    quizzes
        .iter()
        .map(render_quiz)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Summary line for the store: the error message when idle after a failure.
pub fn render_status(store: &QuizStore) -> String {
    match (store.status(), store.error_message()) {
        (Status::Done(quizzes), _) => format!("Generated {} quizzes", quizzes.len()),
        (Status::Streaming, _) => format!("Generating... ({} bytes received)", store.text().len()),
        (Status::Idle, Some(message)) => message.to_string(),
        (Status::Idle, None) => "Ready".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Resource;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn quiz() -> Quiz {
        Quiz {
            id: 2,
            question: "Largest planet?".to_string(),
            description: Some("Astronomy".to_string()),
            options: BTreeMap::from([
                ("a".to_string(), "Mars".to_string()),
                ("b".to_string(), "Jupiter".to_string()),
            ]),
            answer: "b".to_string(),
            resources: Some(vec![Resource {
                title: "Jupiter".to_string(),
                link: "https://en.wikipedia.org/wiki/Jupiter".to_string(),
            }]),
        }
    }

    #[test]
    fn test_render_quiz_marks_answer() {
        assert_eq!(
            render_quiz(&quiz()),
            "2. Largest planet?\n   Astronomy\n    a) Mars\n  * b) Jupiter\n   - Jupiter <https://en.wikipedia.org/wiki/Jupiter>\n"
        );
    }

    #[test]
    fn test_render_status() {
        let mut store = QuizStore::new();
        assert_eq!(render_status(&store), "Ready");

        store.submit();
        store.chunk_received("[]").unwrap();
        assert_eq!(render_status(&store), "Generating... (2 bytes received)");

        store.stream_closed_failure("timeout").unwrap();
        assert_eq!(render_status(&store), "Error generating quizzes: timeout");
    }
}
