use crate::show::show::{Participant, Show, SHOW_CAPACITY};

/// Maximum number of participants that can be selected at once.
pub const MAX_SELECTED: usize = SHOW_CAPACITY;

/// The confirmed outcome of a planning round: one assignment call per
/// participant against the chosen show.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentBatch {
    pub show_id: String,
    pub user_ids: Vec<String>,
}

/// Capacity-constrained selection logic that runs ahead of any network call.
/// Holds the pending participant selection and the target show; every rule
/// violation is reported without mutating the current selection.
#[derive(Default)]
pub struct AssignmentPlanner {
    selected: Vec<Participant>,
    target_show: Option<Show>,
}

impl AssignmentPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle a participant in or out of the selected set. Returns whether
    /// the participant is selected after the call.
    pub fn toggle_user(&mut self, user: &Participant) -> Result<bool, String> {
        if let Some(pos) = self.selected.iter().position(|u| u.id == user.id) {
            self.selected.remove(pos);
            return Ok(false);
        }
        if self.selected.len() >= MAX_SELECTED {
            return Err(format!("Maximum {} users can be selected", MAX_SELECTED));
        }
        self.selected.push(user.clone());
        Ok(true)
    }

    /// Choose the show the pending selection will be assigned to. Rejected
    /// when the show cannot hold the current selection on top of its
    /// existing roster, naming the exact remaining capacity.
    pub fn select_show(&mut self, show: &Show) -> Result<(), String> {
        if show.participants.len() + self.selected.len() > SHOW_CAPACITY {
            return Err(format!(
                "This show can only accept {} more users",
                show.remaining_capacity()
            ));
        }
        self.target_show = Some(show.clone());
        Ok(())
    }

    pub fn selected(&self) -> &[Participant] {
        &self.selected
    }

    pub fn target_show(&self) -> Option<&Show> {
        self.target_show.as_ref()
    }

    /// Build the assignment batch for the current selection. Requires at
    /// least one selected participant and a target show. The planner is left
    /// untouched; callers clear it once the batch has actually been applied,
    /// so a failed batch keeps the selection on screen.
    pub fn plan(&self) -> Result<AssignmentBatch, String> {
        let show = match &self.target_show {
            Some(show) if !self.selected.is_empty() => show,
            _ => return Err("Please select users and a show".to_string()),
        };
        Ok(AssignmentBatch {
            show_id: show.id.clone(),
            user_ids: self.selected.iter().map(|u| u.id.clone()).collect(),
        })
    }

    pub fn clear(&mut self) {
        self.selected.clear();
        self.target_show = None;
    }
}
