//! Manual Pattern Source
//!
//! Wraps a caller-supplied pattern so it can stand wherever a generator
//! is expected; the pattern is validated and normalized on generate.

use std::rc::Rc;

use tracing::info;

use crate::errors::Result;
use crate::task::NormalizedTask;
use crate::types::Pattern;
use crate::validation::validate_and_normalize_pattern;

use super::PatternGenerator;

pub struct PatternGeneratorManual {
    pattern: Pattern,
}

impl PatternGeneratorManual {
    pub fn new(pattern: Pattern) -> PatternGeneratorManual {
        PatternGeneratorManual { pattern }
    }
}

impl PatternGenerator for PatternGeneratorManual {
    fn generate(&self, task: &Rc<NormalizedTask>) -> Result<Pattern> {
        let mut pattern = self.pattern.clone();
        validate_and_normalize_pattern(task, &mut pattern)?;
        info!(%pattern, "manual pattern");
        Ok(pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::EngineError;
    use crate::task::builder::TaskBuilder;

    #[test]
    fn test_manual_pattern_is_normalized() {
        let mut b = TaskBuilder::new();
        b.prop_variable("a", 2);
        b.prop_variable("b", 2);
        let task = NormalizedTask::new(b.build()).unwrap();

        let generator = PatternGeneratorManual::new(Pattern::propositional(vec![1, 0, 1]));
        let pattern = generator.generate(&task).unwrap();
        assert_eq!(pattern.propositional, vec![0, 1]);
    }

    #[test]
    fn test_manual_pattern_rejects_out_of_range() {
        let mut b = TaskBuilder::new();
        b.prop_variable("a", 2);
        let task = NormalizedTask::new(b.build()).unwrap();

        let generator = PatternGeneratorManual::new(Pattern::propositional(vec![3]));
        assert!(matches!(
            generator.generate(&task),
            Err(EngineError::InvalidArgument(_))
        ));
    }
}
