//! Field checks run before a record is persisted from user input.
//!
//! Each function returns every problem found; an empty list means valid.

use crate::sprint::Sprint;
use crate::story::Story;

pub const MAX_STORY_POINTS: f64 = 100.0;

pub fn validate_story(story: &Story) -> Vec<String> {
    let mut errors = Vec::new();
    if story.title.trim().is_empty() {
        errors.push("title is required".to_string());
    }
    if story.description.trim().is_empty() {
        errors.push("description is required".to_string());
    }
    if let Some(points) = story.story_points {
        if !points.is_finite() || !(0.0..=MAX_STORY_POINTS).contains(&points) {
            errors.push(format!(
                "story points must be between 0 and {MAX_STORY_POINTS}, got {points}"
            ));
        }
    }
    errors
}

pub fn validate_sprint(sprint: &Sprint) -> Vec<String> {
    let mut errors = Vec::new();
    if sprint.name.trim().is_empty() {
        errors.push("name is required".to_string());
    }
    if sprint.end_date <= sprint.start_date {
        errors.push(format!(
            "end date {} must be after start date {}",
            sprint.end_date, sprint.start_date
        ));
    }
    if sprint.capacity == 0 {
        errors.push("capacity must be positive".to_string());
    }
    errors
}
