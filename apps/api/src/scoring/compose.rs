//! Report Composer: assembles a renderer-agnostic report document.
//!
//! Given the same catalog and answers, `compose_at` returns an identical document;
//! `generated_at` is the only field that varies between calls to `compose`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::catalog::{QuestionCatalog, QuestionId};
use crate::scoring::aggregate::{group, out_of_range, overall_average, AnswerSet, PillarGroup};
use crate::scoring::feedback::{classify, Tier, NO_ANSWERS_FEEDBACK};
use crate::scoring::recommend::{advice_for, select_focus_areas, PillarScore, Recommendation};

const HIGHLIGHTS_PER_PILLAR: usize = 2;

/// Respondent details as captured by the client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default, alias = "orgName")]
    pub organization_name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportProfile {
    pub organization_name: Option<String>,
    pub prepared_for: Option<String>,
}

impl Profile {
    fn to_report_profile(&self) -> Option<ReportProfile> {
        let organization_name = non_blank(self.organization_name.as_deref());
        let name_parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .filter_map(non_blank)
            .collect();
        let prepared_for = (!name_parts.is_empty()).then(|| name_parts.join(" "));

        if organization_name.is_none() && prepared_for.is_none() {
            return None;
        }
        Some(ReportProfile {
            organization_name: organization_name.map(str::to_string),
            prepared_for,
        })
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredQuestion {
    pub question_id: QuestionId,
    pub question_text: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PillarSummary {
    pub name: String,
    pub average_score: f64,
    pub tier: Tier,
    pub feedback: String,
    pub answered_count: usize,
    pub strengths: Vec<ScoredQuestion>,
    pub improvements: Vec<ScoredQuestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDocument {
    pub generated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<ReportProfile>,
    /// One decimal place; `"N/A"` on the wire when nothing was answered.
    #[serde(with = "score_or_na")]
    pub overall_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_tier: Option<Tier>,
    pub overall_feedback: String,
    pub answered_count: usize,
    pub pillars: Vec<PillarSummary>,
    pub recommendations: Vec<Recommendation>,
}

impl ReportDocument {
    pub fn overall_score_label(&self) -> String {
        match self.overall_score {
            Some(score) => format!("{score:.1}"),
            None => score_or_na::NOT_AVAILABLE.to_string(),
        }
    }
}

pub fn compose(
    catalog: &QuestionCatalog,
    answers: &AnswerSet,
    profile: Option<&Profile>,
    focus_areas: usize,
) -> ReportDocument {
    compose_at(catalog, answers, profile, focus_areas, Utc::now())
}

pub fn compose_at(
    catalog: &QuestionCatalog,
    answers: &AnswerSet,
    profile: Option<&Profile>,
    focus_areas: usize,
    generated_at: DateTime<Utc>,
) -> ReportDocument {
    let outliers = out_of_range(answers);
    if !outliers.is_empty() {
        warn!(
            "{} answer(s) outside the 0-10 range were scored as-is: {:?}",
            outliers.len(),
            outliers
        );
    }

    let groups = group(catalog, answers);
    let overall = overall_average(&groups);
    let answered_count = groups.iter().map(|g| g.question_refs.len()).sum();

    let pillars: Vec<PillarSummary> = groups.iter().map(summarize_pillar).collect();

    let ranking: Vec<PillarScore> = groups
        .iter()
        .map(|g| {
            let average = g.average();
            PillarScore {
                name: g.pillar_name.clone(),
                average,
                tier: classify(average),
            }
        })
        .collect();

    let recommendations = select_focus_areas(&ranking, focus_areas)
        .into_iter()
        .map(|p| Recommendation {
            pillar: p.name.clone(),
            tier: p.tier,
            average_score: round1(p.average),
            advice_text: advice_for(&p.name).to_string(),
        })
        .collect();

    let overall_tier = overall.map(classify);
    let overall_feedback = overall_tier
        .map(Tier::overall_feedback)
        .unwrap_or(NO_ANSWERS_FEEDBACK)
        .to_string();

    ReportDocument {
        generated_at,
        profile: profile.and_then(Profile::to_report_profile),
        overall_score: overall.map(round1),
        overall_tier,
        overall_feedback,
        answered_count,
        pillars,
        recommendations,
    }
}

fn summarize_pillar(g: &PillarGroup) -> PillarSummary {
    let average = g.average();
    let tier = classify(average);

    // Stable sorts over catalog-ordered refs, so equal scores keep catalog order.
    let mut by_score_desc: Vec<_> = g.question_refs.iter().collect();
    by_score_desc.sort_by(|a, b| b.1.total_cmp(&a.1));
    let mut by_score_asc: Vec<_> = g.question_refs.iter().collect();
    by_score_asc.sort_by(|a, b| a.1.total_cmp(&b.1));

    let to_scored = |(q, s): &&(crate::catalog::Question, f64)| ScoredQuestion {
        question_id: q.id.clone(),
        question_text: q.text.clone(),
        score: *s,
    };

    PillarSummary {
        name: g.pillar_name.clone(),
        average_score: round1(average),
        tier,
        feedback: tier.pillar_feedback(&g.pillar_name),
        answered_count: g.question_refs.len(),
        strengths: by_score_desc
            .iter()
            .take(HIGHLIGHTS_PER_PILLAR)
            .map(to_scored)
            .collect(),
        improvements: by_score_asc
            .iter()
            .take(HIGHLIGHTS_PER_PILLAR)
            .map(to_scored)
            .collect(),
    }
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// `Option<f64>` as a JSON number, or the string `"N/A"` for `None`.
pub mod score_or_na {
    use serde::de::{self, Deserializer, Visitor};
    use serde::Serializer;
    use std::fmt;

    pub const NOT_AVAILABLE: &str = "N/A";

    pub fn serialize<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_f64(*v),
            None => serializer.serialize_str(NOT_AVAILABLE),
        }
    }

    struct ScoreVisitor;

    impl<'de> Visitor<'de> for ScoreVisitor {
        type Value = Option<f64>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "a number or \"{NOT_AVAILABLE}\"")
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v as f64))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(v as f64))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            if v == NOT_AVAILABLE {
                Ok(None)
            } else {
                Err(E::invalid_value(de::Unexpected::Str(v), &self))
            }
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        deserializer.deserialize_any(ScoreVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Question;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn three_question_catalog() -> QuestionCatalog {
        QuestionCatalog::new(vec![
            Question::new("1", "First A", "A"),
            Question::new("2", "Second A", "A"),
            Question::new("3", "Only B", "B"),
        ])
    }

    fn answers(pairs: &[(&str, f64)]) -> AnswerSet {
        pairs
            .iter()
            .map(|(id, s)| (QuestionId::from(*id), *s))
            .collect()
    }

    #[test]
    fn test_worked_example() {
        let doc = compose_at(
            &three_question_catalog(),
            &answers(&[("1", 10.0), ("2", 6.0), ("3", 2.0)]),
            None,
            1,
            fixed_time(),
        );

        assert_eq!(doc.overall_score, Some(6.0));
        assert_eq!(doc.overall_tier, Some(Tier::Good));
        assert_eq!(doc.pillars.len(), 2);
        assert_eq!(doc.pillars[0].name, "A");
        assert_eq!(doc.pillars[0].average_score, 8.0);
        assert_eq!(doc.pillars[0].tier, Tier::Excellent);
        assert_eq!(doc.pillars[1].name, "B");
        assert_eq!(doc.pillars[1].average_score, 2.0);
        assert_eq!(doc.pillars[1].tier, Tier::BelowAverage);
        assert_eq!(doc.recommendations.len(), 1);
        assert_eq!(doc.recommendations[0].pillar, "B");
        assert_eq!(doc.recommendations[0].tier, Tier::BelowAverage);
    }

    #[test]
    fn test_empty_answers_yield_sentinel() {
        let doc = compose_at(&three_question_catalog(), &AnswerSet::new(), None, 2, fixed_time());
        assert_eq!(doc.overall_score, None);
        assert_eq!(doc.overall_tier, None);
        assert!(doc.pillars.is_empty());
        assert!(doc.recommendations.is_empty());
        assert_eq!(doc.overall_feedback, NO_ANSWERS_FEEDBACK);

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["overallScore"], "N/A");
        assert!(json.get("overallTier").is_none());
        assert_eq!(json["pillars"], serde_json::json!([]));
    }

    #[test]
    fn test_single_zero_score_is_critical() {
        let catalog = QuestionCatalog::new(vec![Question::new("1", "Only", "Solo")]);
        let doc = compose_at(&catalog, &answers(&[("1", 0.0)]), None, 2, fixed_time());
        assert_eq!(doc.overall_score, Some(0.0));
        assert_eq!(doc.pillars[0].average_score, 0.0);
        assert_eq!(doc.pillars[0].tier, Tier::Critical);
    }

    #[test]
    fn test_identical_inputs_give_identical_documents() {
        let catalog = QuestionCatalog::built_in();
        let a = answers(&[("1-1", 3.0), ("2-4", 7.0), ("6-1", 9.0), ("6-2", 1.0)]);
        let first = compose(&catalog, &a, None, 2);
        let mut second = compose(&catalog, &a, None, 2);
        second.generated_at = first.generated_at;
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_strengths_and_improvements_tie_break_by_catalog_order() {
        let catalog = QuestionCatalog::new(vec![
            Question::new("1", "q1", "P"),
            Question::new("2", "q2", "P"),
            Question::new("3", "q3", "P"),
            Question::new("4", "q4", "P"),
        ]);
        let doc = compose_at(
            &catalog,
            &answers(&[("1", 5.0), ("2", 9.0), ("3", 5.0), ("4", 9.0)]),
            None,
            2,
            fixed_time(),
        );
        let pillar = &doc.pillars[0];
        let strengths: Vec<_> = pillar.strengths.iter().map(|s| s.question_id.as_str()).collect();
        let improvements: Vec<_> = pillar
            .improvements
            .iter()
            .map(|s| s.question_id.as_str())
            .collect();
        assert_eq!(strengths, vec!["2", "4"]);
        assert_eq!(improvements, vec!["1", "3"]);
    }

    #[test]
    fn test_single_question_pillar_has_one_highlight_each() {
        let doc = compose_at(
            &three_question_catalog(),
            &answers(&[("3", 4.0)]),
            None,
            2,
            fixed_time(),
        );
        assert_eq!(doc.pillars[0].strengths.len(), 1);
        assert_eq!(doc.pillars[0].improvements.len(), 1);
    }

    #[test]
    fn test_overall_score_rounded_to_one_decimal() {
        let doc = compose_at(
            &three_question_catalog(),
            &answers(&[("1", 7.0), ("2", 7.0), ("3", 6.0)]),
            None,
            2,
            fixed_time(),
        );
        // 20 / 3 = 6.666…
        assert_eq!(doc.overall_score, Some(6.7));
        assert_eq!(doc.overall_score_label(), "6.7");
    }

    #[test]
    fn test_profile_builds_prepared_for() {
        let profile = Profile {
            organization_name: Some("Acme Ltd".to_string()),
            first_name: Some("Sam".to_string()),
            last_name: Some(" Doe ".to_string()),
        };
        let doc = compose_at(&three_question_catalog(), &AnswerSet::new(), Some(&profile), 2, fixed_time());
        let p = doc.profile.unwrap();
        assert_eq!(p.organization_name.as_deref(), Some("Acme Ltd"));
        assert_eq!(p.prepared_for.as_deref(), Some("Sam Doe"));
    }

    #[test]
    fn test_blank_profile_is_omitted() {
        let profile = Profile {
            organization_name: Some("  ".to_string()),
            ..Profile::default()
        };
        let doc = compose_at(&three_question_catalog(), &AnswerSet::new(), Some(&profile), 2, fixed_time());
        assert!(doc.profile.is_none());
    }

    #[test]
    fn test_document_round_trips_through_json_with_sentinel() {
        let doc = compose_at(&three_question_catalog(), &AnswerSet::new(), None, 2, fixed_time());
        let json = serde_json::to_string(&doc).unwrap();
        let back: ReportDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn test_repeated_question_id_counts_once() {
        let catalog = QuestionCatalog::new(vec![
            Question::new("1", "First", "A"),
            Question::new("1", "First again", "B"),
            Question::new("2", "Second", "B"),
        ]);
        let doc = compose_at(&catalog, &answers(&[("1", 10.0), ("2", 0.0)]), None, 2, fixed_time());

        assert_eq!(doc.overall_score, Some(5.0));
        assert_eq!(doc.answered_count, 2);
        assert_eq!(doc.pillars.len(), 2);
        assert_eq!(doc.pillars[0].name, "A");
        assert_eq!(doc.pillars[0].average_score, 10.0);
        assert_eq!(doc.pillars[1].name, "B");
        assert_eq!(doc.pillars[1].average_score, 0.0);
        assert_eq!(doc.pillars[1].answered_count, 1);
    }
}
