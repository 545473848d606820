//! Wizard navigation — pure transition functions over the step catalog.
//!
//! Forward moves one step, except when a skip rule fires on the current step,
//! in which case the step right after it is bypassed. Backward mirrors that:
//! when the previous step is one a rule would have skipped, it is bypassed too,
//! so a back-traversal never lands on a step forward traversal did not visit.
//! Both ends are hard stops.

use serde::Serialize;

use super::model::{AnswerSet, FieldValue};
use super::steps::{SkipRule, StepCatalog};

/// Last navigation direction. Only used by renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

fn rule_fires(rule: &SkipRule, answers: &AnswerSet) -> bool {
    answers.get(rule.when) == FieldValue::Flag(true)
}

/// Index reached by moving forward from `index`, or `None` at the end.
pub fn next_index(catalog: &StepCatalog, index: usize, answers: &AnswerSet) -> Option<usize> {
    let step = catalog.get(index)?;
    if index >= catalog.last_index() {
        return None;
    }
    let skips = catalog
        .skip_rules()
        .iter()
        .any(|rule| rule.trigger == step.id && rule_fires(rule, answers));
    let target = if skips { index + 2 } else { index + 1 };
    (target <= catalog.last_index()).then_some(target)
}

/// Index reached by moving backward from `index`, or `None` at the start.
pub fn previous_index(catalog: &StepCatalog, index: usize, answers: &AnswerSet) -> Option<usize> {
    if index == 0 || index > catalog.last_index() {
        return None;
    }
    let previous = catalog.get(index - 1)?;
    let skips = catalog
        .skip_rules()
        .iter()
        .any(|rule| rule.skipped == previous.id && rule_fires(rule, answers));
    if skips {
        Some(index.saturating_sub(2))
    } else {
        Some(index - 1)
    }
}
