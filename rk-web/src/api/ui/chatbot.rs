//! Chatbot page

use axum::{extract::State, response::Response, Form};
use serde::Deserialize;

use super::flash::IncomingFlash;
use super::html::{escape_html, layout};
use crate::chat;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AskForm {
    #[serde(default)]
    pub question: String,
}

fn render(question: &str, answer: Option<&str>, error: Option<&str>) -> String {
    let answer_html = match (answer, error) {
        (Some(answer), _) => format!(
            r#"<h3>Answer</h3><div class="answer">{}</div>"#,
            escape_html(answer)
        ),
        (None, Some(error)) => format!(r#"<div class="flash error">{}</div>"#, escape_html(error)),
        (None, None) => String::new(),
    };

    format!(
        r#"<h2>Chatbot</h2>
        <form class="ask" method="post" action="/chatbot/ask">
            <textarea name="question" rows="4" placeholder="Ask anything...">{question}</textarea>
            <button type="submit">Ask</button>
        </form>
        {answer_html}"#,
        question = escape_html(question),
        answer_html = answer_html,
    )
}

/// GET /chatbot
pub async fn chatbot_page(flash: IncomingFlash) -> Response {
    flash.render(layout("Chatbot", flash.current(), &render("", None, None)))
}

/// POST /chatbot/ask
///
/// Renders the answer in place; there is nothing to redirect to.
pub async fn ask_page(
    State(state): State<AppState>,
    flash: IncomingFlash,
    Form(form): Form<AskForm>,
) -> Response {
    let content = match chat::ask(state.chat.as_ref(), &form.question).await {
        Ok(answer) => render(&form.question, Some(&answer), None),
        Err(err) => render(&form.question, None, Some(&err.user_message())),
    };
    flash.render(layout("Chatbot", flash.current(), &content))
}
