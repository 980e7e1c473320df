//! Question Catalog: the ordered, immutable list of survey questions.
//!
//! A catalog is a value: handlers load a snapshot per request (database rows when an
//! administrator has configured any, the built-in list otherwise) and pass it down to
//! scoring. Nothing mutates a catalog after construction.

pub mod handlers;
pub mod store;

use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Question identity
// ────────────────────────────────────────────────────────────────────────────

/// Question identifier. Clients send either strings (`"1-3"`) or integers (`3`);
/// both normalise to the string form so answer maps and catalogs always agree.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct QuestionId(String);

impl QuestionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric value of the id, if it is a plain integer.
    pub fn as_number(&self) -> Option<i64> {
        self.0.parse().ok()
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QuestionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<i64> for QuestionId {
    fn from(n: i64) -> Self {
        Self(n.to_string())
    }
}

struct QuestionIdVisitor;

impl<'de> Visitor<'de> for QuestionIdVisitor {
    type Value = QuestionId;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a string or integer question id")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<QuestionId, E> {
        Ok(QuestionId(v.trim().to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<QuestionId, E> {
        Ok(QuestionId(v.trim().to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<QuestionId, E> {
        Ok(QuestionId(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<QuestionId, E> {
        Ok(QuestionId(v.to_string()))
    }
}

impl<'de> Deserialize<'de> for QuestionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(QuestionIdVisitor)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Question + catalog
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    #[serde(alias = "copy")]
    pub text: String,
    pub pillar: String,
}

impl Question {
    pub fn new(id: impl Into<String>, text: impl Into<String>, pillar: impl Into<String>) -> Self {
        Self {
            id: QuestionId::new(id),
            text: text.into(),
            pillar: pillar.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionCatalog {
    questions: Vec<Question>,
}

impl QuestionCatalog {
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    /// The built-in six-pillar financial health questionnaire.
    pub fn built_in() -> Self {
        Self::new(
            BUILT_IN_QUESTIONS
                .iter()
                .map(|(id, text, pillar)| Question::new(*id, *text, *pillar))
                .collect(),
        )
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| &q.id == id)
    }

    /// Distinct pillar names in order of first appearance.
    pub fn pillars(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for q in &self.questions {
            if !seen.contains(&q.pillar.as_str()) {
                seen.push(q.pillar.as_str());
            }
        }
        seen
    }

    /// A randomly ordered copy for presentation. Scoring always uses the original order.
    pub fn shuffled<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        let mut questions = self.questions.clone();
        questions.shuffle(rng);
        Self { questions }
    }

    pub fn into_questions(self) -> Vec<Question> {
        self.questions
    }
}

#[rustfmt::skip]
const BUILT_IN_QUESTIONS: &[(&str, &str, &str)] = &[
    ("1-1", "How clearly defined are your mission and vision?", "Business Plan"),
    ("1-2", "How well-documented are your products and services?", "Business Plan"),
    ("1-3", "How accurate are your 3-year sales and profit forecasts?", "Business Plan"),
    ("1-4", "How adequate is your capital investment planning?", "Business Plan"),
    ("1-5", "How effective is your strategy for managing debtors, stock, and creditors?", "Business Plan"),
    ("1-6", "How detailed is your cashflow forecast?", "Business Plan"),
    ("1-7", "How secure is your business funding?", "Business Plan"),

    ("2-1", "How diverse is your product range?", "Break Even and Margin"),
    ("2-2", "How detailed is your sales plan by product group?", "Break Even and Margin"),
    ("2-3", "How accurate is your product costing and mark-up methodology?", "Break Even and Margin"),
    ("2-4", "How well do you track direct expenses?", "Break Even and Margin"),
    ("2-5", "How efficiently do you manage your overheads?", "Break Even and Margin"),
    ("2-6", "How well do you understand the volume needed to cover overheads?", "Break Even and Margin"),
    ("2-7", "How often do you perform \"what if\" analysis?", "Break Even and Margin"),

    ("3-1", "How well-established are your flow charts for business processes?", "Blueprint"),
    ("3-2", "How complete are your written procedures for business processes?", "Blueprint"),
    ("3-3", "How effectively have you adopted electronic systems to manage finances?", "Blueprint"),
    ("3-4", "How appropriate is your ERP system for your business needs?", "Blueprint"),
    ("3-5", "How robust are your checks and balances for internal controls?", "Blueprint"),
    ("3-6", "How extensively do you use technology to reduce manual data capture?", "Blueprint"),
    ("3-7", "How well integrated are your systems to avoid duplication of data entry?", "Blueprint"),

    ("4-1", "How timely and accurate are your daily, weekly, and monthly results?", "Actual Results"),
    ("4-2", "How quickly can you produce results with at least 95% accuracy?", "Actual Results"),
    ("4-3", "How comprehensive is your reporting of KPIs alongside financials?", "Actual Results"),
    ("4-4", "How effectively do you use graphics to illustrate performance trends?", "Actual Results"),
    ("4-5", "How regular are your budget comparisons?", "Actual Results"),
    ("4-6", "How promptly do you reforecast when necessary?", "Actual Results"),
    ("4-7", "How aligned are your management reporting and financials?", "Actual Results"),

    ("5-1", "How frequently do you update your cashflow (at least weekly)?", "Bank/Cashflow"),
    ("5-2", "How accurately do you reconcile bank balances?", "Bank/Cashflow"),
    ("5-3", "How consistently do you compare actuals to previous forecasts?", "Bank/Cashflow"),
    ("5-4", "How promptly do you update forecasts based on previous results?", "Bank/Cashflow"),
    ("5-5", "How closely do you monitor customer and supplier balances?", "Bank/Cashflow"),
    ("5-6", "How effectively do you monitor stock balances?", "Bank/Cashflow"),
    ("5-7", "How regularly do you review capital expenditure?", "Bank/Cashflow"),

    ("6-1", "How timely are your employer returns and payments (PAYE, UIF, SDL)?", "Compliance"),
    ("6-2", "How current are your CIPC returns (Annual returns and Ownership declarations)?", "Compliance"),
    ("6-3", "How punctual are your VAT returns?", "Compliance"),
    ("6-4", "How up-to-date are your annual tax returns?", "Compliance"),
    ("6-5", "How compliant are you with industry-specific returns?", "Compliance"),
    ("6-6", "How timely are your Trade Union/Department of Labour returns?", "Compliance"),
    ("6-7", "How regularly do you conduct employee reviews?", "Compliance"),
];

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_built_in_has_six_pillars_of_seven() {
        let catalog = QuestionCatalog::built_in();
        assert_eq!(catalog.len(), 42);
        let pillars = catalog.pillars();
        assert_eq!(
            pillars,
            vec![
                "Business Plan",
                "Break Even and Margin",
                "Blueprint",
                "Actual Results",
                "Bank/Cashflow",
                "Compliance"
            ]
        );
    }

    #[test]
    fn test_question_id_accepts_integers_and_strings() {
        let q: Question =
            serde_json::from_str(r#"{"id": 7, "copy": "Cash?", "pillar": "Cashflow"}"#).unwrap();
        assert_eq!(q.id, QuestionId::from("7"));
        assert_eq!(q.text, "Cash?");

        let q: Question =
            serde_json::from_str(r#"{"id": "1-2", "text": "Docs?", "pillar": "Plan"}"#).unwrap();
        assert_eq!(q.id.as_str(), "1-2");
        assert_eq!(q.id.as_number(), None);
    }

    #[test]
    fn test_question_id_as_map_key() {
        let answers: std::collections::BTreeMap<QuestionId, f64> =
            serde_json::from_str(r#"{"1": 4, "1-2": 7.5}"#).unwrap();
        assert_eq!(answers.get(&QuestionId::from(1)), Some(&4.0));
        assert_eq!(answers.get(&QuestionId::from("1-2")), Some(&7.5));
    }

    #[test]
    fn test_shuffle_keeps_every_question() {
        let catalog = QuestionCatalog::built_in();
        let mut rng = StdRng::seed_from_u64(7);
        let shuffled = catalog.shuffled(&mut rng);
        assert_eq!(shuffled.len(), catalog.len());
        for q in catalog.questions() {
            assert!(shuffled.get(&q.id).is_some());
        }
    }

    #[test]
    fn test_get_unknown_is_none() {
        let catalog = QuestionCatalog::built_in();
        assert!(catalog.get(&QuestionId::from("9-9")).is_none());
    }
}
