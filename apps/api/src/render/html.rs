//! HTML and plain-text email bodies for a shared report.

use std::fmt::Write;

use html_escape::encode_text;

use crate::render::layout::REPORT_TITLE;
use crate::scoring::compose::ScoredQuestion;
use crate::scoring::ReportDocument;

/// Personalisation shown above the report.
#[derive(Debug, Clone, Default)]
pub struct EmailIntro<'a> {
    pub sender_name: &'a str,
    pub message: Option<&'a str>,
}

pub fn render_html(doc: &ReportDocument, intro: &EmailIntro<'_>) -> String {
    let mut html = String::with_capacity(4096);
    html.push_str("<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\">");
    let _ = write!(html, "<title>{}</title>", encode_text(REPORT_TITLE));
    html.push_str(
        "</head><body style=\"font-family:Helvetica,Arial,sans-serif;color:#1a1a1a;max-width:640px;margin:0 auto\">",
    );

    let _ = write!(
        html,
        "<p>{} has shared a financial health assessment report with you.</p>",
        encode_text(intro.sender_name)
    );
    if let Some(message) = intro.message.filter(|m| !m.trim().is_empty()) {
        let _ = write!(
            html,
            "<blockquote style=\"border-left:3px solid #229ace;margin:0;padding-left:12px\">{}</blockquote>",
            encode_text(message.trim())
        );
    }

    let _ = write!(html, "<h1 style=\"color:#229ace\">{}</h1>", encode_text(REPORT_TITLE));
    if let Some(profile) = &doc.profile {
        if let Some(org) = &profile.organization_name {
            let _ = write!(html, "<p><strong>Organisation:</strong> {}</p>", encode_text(org));
        }
        if let Some(name) = &profile.prepared_for {
            let _ = write!(html, "<p><strong>Prepared for:</strong> {}</p>", encode_text(name));
        }
    }

    html.push_str("<h2 style=\"color:#229ace\">Summary</h2>");
    let _ = write!(
        html,
        "<p><strong>Overall score:</strong> {}{}</p><p>{}</p>",
        doc.overall_score_label(),
        if doc.overall_score.is_some() { " / 10" } else { "" },
        encode_text(&doc.overall_feedback)
    );

    if !doc.pillars.is_empty() {
        html.push_str("<h2 style=\"color:#229ace\">Pillar Breakdown</h2>");
        for pillar in &doc.pillars {
            let _ = write!(
                html,
                "<h3>{} ({:.1} / 10, {})</h3><p>{}</p>",
                encode_text(&pillar.name),
                pillar.average_score,
                pillar.tier.label(),
                encode_text(&pillar.feedback)
            );
            push_html_highlights(&mut html, "Strengths", &pillar.strengths);
            push_html_highlights(&mut html, "Areas for improvement", &pillar.improvements);
        }
    }

    if !doc.recommendations.is_empty() {
        html.push_str("<h2 style=\"color:#229ace\">Recommendations</h2><ul>");
        for rec in &doc.recommendations {
            let _ = write!(
                html,
                "<li><strong>{}</strong> ({:.1} / 10): {}</li>",
                encode_text(&rec.pillar),
                rec.average_score,
                encode_text(&rec.advice_text)
            );
        }
        html.push_str("</ul>");
    }

    html.push_str("</body></html>");
    html
}

fn push_html_highlights(html: &mut String, heading: &str, questions: &[ScoredQuestion]) {
    if questions.is_empty() {
        return;
    }
    let _ = write!(html, "<p style=\"color:#6b6b6b;margin-bottom:0\">{heading}</p><ul>");
    for q in questions {
        let _ = write!(html, "<li>{} ({})</li>", encode_text(&q.question_text), q.score);
    }
    html.push_str("</ul>");
}

fn push_text_highlights(text: &mut String, heading: &str, questions: &[ScoredQuestion]) {
    if questions.is_empty() {
        return;
    }
    let _ = writeln!(text, "  {heading}:");
    for q in questions {
        let _ = writeln!(text, "    * {} ({})", q.question_text, q.score);
    }
}

/// Plain-text alternative for clients that do not render HTML.
pub fn render_text(doc: &ReportDocument, intro: &EmailIntro<'_>) -> String {
    let mut text = format!(
        "{} has shared a financial health assessment report with you.\n\n",
        intro.sender_name
    );
    if let Some(message) = intro.message.filter(|m| !m.trim().is_empty()) {
        let _ = writeln!(text, "\"{}\"\n", message.trim());
    }
    let _ = writeln!(text, "{REPORT_TITLE}\n");
    let _ = writeln!(text, "Overall score: {}", doc.overall_score_label());
    let _ = writeln!(text, "{}\n", doc.overall_feedback);
    for pillar in &doc.pillars {
        let _ = writeln!(
            text,
            "- {}: {:.1} ({})",
            pillar.name,
            pillar.average_score,
            pillar.tier.label()
        );
        let _ = writeln!(text, "  {}", pillar.feedback);
        push_text_highlights(&mut text, "Strengths", &pillar.strengths);
        push_text_highlights(&mut text, "Areas for improvement", &pillar.improvements);
    }
    if !doc.recommendations.is_empty() {
        text.push_str("\nRecommendations:\n");
        for rec in &doc.recommendations {
            let _ = writeln!(text, "- {}: {}", rec.pillar, rec.advice_text);
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Question, QuestionCatalog, QuestionId};
    use crate::scoring::{compose, AnswerSet};

    fn report_with_pillar(pillar: &str) -> ReportDocument {
        let catalog = QuestionCatalog::new(vec![Question::new("1", "Q <1>", pillar)]);
        let mut answers = AnswerSet::new();
        answers.insert(QuestionId::from("1"), 3.0);
        compose(&catalog, &answers, None, 2)
    }

    #[test]
    fn test_html_escapes_user_text() {
        let doc = report_with_pillar("R&D <Ops>");
        let intro = EmailIntro {
            sender_name: "<script>alert(1)</script>",
            message: Some("See <b>this</b>"),
        };
        let html = render_html(&doc, &intro);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("R&amp;D &lt;Ops&gt;"));
        assert!(html.contains("See &lt;b&gt;this&lt;/b&gt;"));
    }

    #[test]
    fn test_html_lists_scores_and_recommendations() {
        let html = render_html(
            &report_with_pillar("Compliance"),
            &EmailIntro {
                sender_name: "Jo",
                message: None,
            },
        );
        assert!(html.contains("<strong>Overall score:</strong> 3.0 / 10"));
        assert!(html.contains("<h3>Compliance (3.0 / 10, "));
        assert!(html.contains("Recommendations"));
        assert!(!html.contains("<blockquote"));
    }

    #[test]
    fn test_empty_report_text_shows_sentinel() {
        let doc = compose(&QuestionCatalog::built_in(), &AnswerSet::new(), None, 2);
        let text = render_text(
            &doc,
            &EmailIntro {
                sender_name: "Jo",
                message: Some("   "),
            },
        );
        assert!(text.contains("Overall score: N/A"));
        assert!(!text.contains("Recommendations"));
        assert!(!text.contains('"'));
    }

    #[test]
    fn test_bodies_carry_pillar_feedback_and_highlights() {
        let catalog = QuestionCatalog::new(vec![
            Question::new("1", "Plan written?", "Business Plan"),
            Question::new("2", "Plan <reviewed>?", "Business Plan"),
            Question::new("3", "Forecast updated?", "Business Plan"),
        ]);
        let answers = AnswerSet::from([
            (QuestionId::from("1"), 9.0),
            (QuestionId::from("2"), 2.0),
            (QuestionId::from("3"), 5.0),
        ]);
        let doc = compose(&catalog, &answers, None, 1);
        let pillar = &doc.pillars[0];
        let intro = EmailIntro {
            sender_name: "Jo",
            message: None,
        };

        let html = render_html(&doc, &intro);
        assert!(html.contains(&*encode_text(&pillar.feedback)));
        assert!(html.contains("Strengths</p><ul><li>Plan written? (9)</li><li>Forecast updated? (5)</li></ul>"));
        assert!(html.contains("Areas for improvement</p><ul><li>Plan &lt;reviewed&gt;? (2)</li>"));

        let text = render_text(&doc, &intro);
        assert!(text.contains(&format!("  {}\n", pillar.feedback)));
        assert!(text.contains("  Strengths:\n    * Plan written? (9)\n    * Forecast updated? (5)\n"));
        assert!(text.contains("  Areas for improvement:\n    * Plan <reviewed>? (2)\n"));
    }
}
