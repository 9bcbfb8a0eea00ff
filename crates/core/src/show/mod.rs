pub mod assignment;
pub mod show;

pub use assignment::{AssignmentBatch, AssignmentPlanner, MAX_SELECTED};
pub use show::{
    merge_show, Participant, Show, DEFAULT_SHOW_DURATION_MINS, SHOW_CAPACITY, STATUS_PLAYED,
    STATUS_SCHEDULED,
};
