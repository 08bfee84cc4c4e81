/// Linear cursor over a fixed list of step names. Moves by one and never wraps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSequencer {
    steps: &'static [&'static str],
    active_index: usize,
}

impl StepSequencer {
    /// `steps` must not be empty.
    pub fn new(steps: &'static [&'static str]) -> Self {
        debug_assert!(!steps.is_empty(), "a flow needs at least one step");
        Self {
            steps,
            active_index: 0,
        }
    }

    pub fn steps(&self) -> &'static [&'static str] {
        self.steps
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn last_index(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }

    pub fn is_first(&self) -> bool {
        self.active_index == 0
    }

    pub fn is_last(&self) -> bool {
        self.active_index == self.last_index()
    }

    pub fn current_step(&self) -> &'static str {
        self.steps.get(self.active_index).copied().unwrap_or_default()
    }

    /// Returns `true` when the index moved.
    pub fn advance(&mut self) -> bool {
        if self.is_last() {
            return false;
        }
        self.active_index += 1;
        true
    }

    /// Returns `true` when the index moved.
    pub fn retreat(&mut self) -> bool {
        if self.is_first() {
            return false;
        }
        self.active_index -= 1;
        true
    }

    pub fn reset(&mut self) {
        self.active_index = 0;
    }
}
