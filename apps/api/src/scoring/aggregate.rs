//! Answer Aggregator: groups answers by pillar and computes averages.

use std::collections::{BTreeMap, BTreeSet};

use crate::catalog::{Question, QuestionCatalog, QuestionId};

/// Client-supplied answers: question id → numeric score (nominally 0–10).
pub type AnswerSet = BTreeMap<QuestionId, f64>;

/// Answered questions of one pillar, in catalog order.
#[derive(Debug, Clone, PartialEq)]
pub struct PillarGroup {
    pub pillar_name: String,
    /// Position of the pillar's first question in the catalog. Used as the tie-breaker
    /// wherever pillars are ordered.
    pub catalog_rank: usize,
    pub question_refs: Vec<(Question, f64)>,
}

impl PillarGroup {
    pub fn scores(&self) -> impl Iterator<Item = f64> + '_ {
        self.question_refs.iter().map(|(_, s)| *s)
    }

    /// Groups are never empty, so the mean is always defined.
    pub fn average(&self) -> f64 {
        let total: f64 = self.scores().sum();
        total / self.question_refs.len() as f64
    }
}

/// Groups `answers` by the pillar of the corresponding catalog question.
///
/// Answers for ids absent from the catalog are dropped; pillars with no answered
/// question do not appear. Output order is pillar first-appearance order.
/// A repeated question id only counts at its first position in the catalog.
pub fn group(catalog: &QuestionCatalog, answers: &AnswerSet) -> Vec<PillarGroup> {
    let mut groups: Vec<PillarGroup> = Vec::new();
    let mut counted: BTreeSet<&QuestionId> = BTreeSet::new();

    for question in catalog.questions() {
        let Some(&score) = answers.get(&question.id) else {
            continue;
        };
        if !counted.insert(&question.id) {
            continue;
        }
        match groups.iter_mut().find(|g| g.pillar_name == question.pillar) {
            Some(existing) => existing.question_refs.push((question.clone(), score)),
            None => groups.push(PillarGroup {
                pillar_name: question.pillar.clone(),
                catalog_rank: 0,
                question_refs: vec![(question.clone(), score)],
            }),
        }
    }

    // A pillar's rank is where it first appears in the catalog, not where its first
    // *answered* question sits.
    let first_seen = catalog.pillars();
    for g in &mut groups {
        g.catalog_rank = first_seen
            .iter()
            .position(|p| *p == g.pillar_name)
            .unwrap_or(usize::MAX);
    }
    groups.sort_by_key(|g| g.catalog_rank);
    groups
}

/// Mean of every answered catalog question. Each question counts once, so pillars
/// with more answers weigh more. `None` when nothing was answered.
pub fn overall_average(groups: &[PillarGroup]) -> Option<f64> {
    let (sum, count) = groups
        .iter()
        .flat_map(|g| g.scores())
        .fold((0.0_f64, 0usize), |(s, c), score| (s + score, c + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Scores outside the nominal 0–10 range. They are kept as-is; callers only log them.
pub fn out_of_range(answers: &AnswerSet) -> Vec<(&QuestionId, f64)> {
    answers
        .iter()
        .filter(|(_, s)| !(0.0..=10.0).contains(*s))
        .map(|(id, s)| (id, *s))
        .collect()
}
