use crate::model::{Task, LOCKED_TO_THREAD};

/// True when `needle` (already lower-cased) occurs in any searchable field of the task.
pub fn task_matches(task: &Task, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    let contains = |haystack: &str| haystack.to_lowercase().contains(needle);

    contains(&task.id.to_string())
        || contains(&task.status)
        || task
            .created_by
            .as_ref()
            .is_some_and(|frame| contains(&frame.to_string()))
        || task
            .stack_frames
            .iter()
            .any(|frame| contains(&frame.to_string()))
        || (task.locked_to_os_thread && LOCKED_TO_THREAD.contains(needle))
}

/// Indices into `tasks` of every record matching `filter`, case-insensitively, in order.
pub fn filter_indices(tasks: &[Task], filter: &str) -> Vec<usize> {
    let needle = filter.to_lowercase();
    tasks
        .iter()
        .enumerate()
        .filter(|(_, task)| task_matches(task, &needle))
        .map(|(idx, _)| idx)
        .collect()
}
