//! Completion records for statement evaluation
//!
//! Throw completions travel as `Err(JsError)`; the remaining abrupt kinds are
//! variants here. `None` payloads stand for an empty completion value.

use crate::value::{JsString, Value};

#[derive(Debug, Clone)]
pub enum Completion {
    Normal(Option<Value>),
    Return(Value),
    Break(Option<JsString>, Option<Value>),
    Continue(Option<JsString>, Option<Value>),
}

impl Completion {
    pub fn empty() -> Self {
        Completion::Normal(None)
    }

    pub fn is_abrupt(&self) -> bool {
        !matches!(self, Completion::Normal(_))
    }

    /// The completion's value, `None` when empty.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Completion::Normal(v) | Completion::Break(_, v) | Completion::Continue(_, v) => {
                v.as_ref()
            }
            Completion::Return(v) => Some(v),
        }
    }

    /// UpdateEmpty(C, V): fill an empty value slot with `value`.
    pub fn update_empty(self, value: Option<Value>) -> Completion {
        match self {
            Completion::Normal(None) => Completion::Normal(value),
            Completion::Break(label, None) => Completion::Break(label, value),
            Completion::Continue(label, None) => Completion::Continue(label, value),
            other => other,
        }
    }

    /// LoopContinues(completion, labelSet)
    pub fn loop_continues(&self, labels: &[JsString]) -> bool {
        match self {
            Completion::Normal(_) => true,
            Completion::Continue(None, _) => true,
            Completion::Continue(Some(label), _) => labels.contains(label),
            _ => false,
        }
    }
}
