use super::domain::{OrderedStep, Step, StepKind, TargetGoal};

/// Ordered, typed roadmap steps plus the separately held target goal.
///
/// Positions are derived from the backing vector index, so they stay
/// contiguous and zero-based through every mutation. After [`teardown`]
/// every mutation except [`append`] is ignored; the next append revives the
/// sequence. The teardown flag is held in memory only and is never persisted:
/// a sequence rebuilt by [`from_parts`] after a restart is fresh.
///
/// [`teardown`]: StepSequence::teardown
/// [`append`]: StepSequence::append
/// [`from_parts`]: StepSequence::from_parts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepSequence {
    steps: Vec<Step>,
    target_goal: Option<TargetGoal>,
    torn_down: bool,
}

impl StepSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a sequence from persisted parts.
    pub fn from_parts(steps: Vec<Step>, target_goal: Option<TargetGoal>) -> Self {
        Self {
            steps,
            target_goal,
            torn_down: false,
        }
    }

    pub fn append(&mut self, step: Step) {
        self.torn_down = false;
        self.steps.push(step);
    }

    /// Drop every step of `kind`, keeping the relative order of the rest.
    /// Returns how many steps were removed.
    pub fn remove_all_of_kind(&mut self, kind: StepKind) -> usize {
        if self.torn_down {
            return 0;
        }
        let before = self.steps.len();
        self.steps.retain(|step| step.kind != kind);
        before - self.steps.len()
    }

    /// Truncate at the first step of `kind` (inclusive). Returns how many
    /// steps were removed; zero when the kind is absent.
    pub fn remove_from_kind(&mut self, kind: StepKind) -> usize {
        if self.torn_down {
            return 0;
        }
        match self.steps.iter().position(|step| step.kind == kind) {
            Some(index) => self.steps.drain(index..).count(),
            None => 0,
        }
    }

    /// Place `step` immediately before the last step of `anchor`, or at the
    /// end when no such step exists. Returns the position the step landed on.
    pub fn insert_before_last_of_kind(&mut self, anchor: StepKind, step: Step) -> Option<usize> {
        if self.torn_down {
            return None;
        }
        match self.steps.iter().rposition(|existing| existing.kind == anchor) {
            Some(index) => {
                self.steps.insert(index, step);
                Some(index)
            }
            None => {
                self.steps.push(step);
                Some(self.steps.len() - 1)
            }
        }
    }

    pub fn set_target_goal(&mut self, goal: TargetGoal) {
        if self.torn_down {
            return;
        }
        self.target_goal = Some(goal);
    }

    pub fn target_goal(&self) -> Option<&TargetGoal> {
        self.target_goal.as_ref()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// A roadmap is saveable once it has at least one step and a goal.
    pub fn is_valid(&self) -> bool {
        !self.steps.is_empty() && self.target_goal.is_some()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn to_ordered_list(&self) -> Vec<OrderedStep> {
        self.steps
            .iter()
            .cloned()
            .enumerate()
            .map(|(position, step)| OrderedStep { position, step })
            .collect()
    }

    /// Discard all steps and the goal.
    pub fn teardown(&mut self) {
        self.steps.clear();
        self.target_goal = None;
        self.torn_down = true;
    }
}
