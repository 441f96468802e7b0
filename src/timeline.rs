use crate::domain::Event;
use crate::normalize::NormalizedSources;

/// Concatenate identity, attribute and task events (in that order) and sort
/// by date, newest first. The sort is stable, so events sharing a timestamp
/// keep the concatenation order.
pub fn merge(identity: Vec<Event>, attribute: Vec<Event>, task: Vec<Event>) -> Vec<Event> {
    let mut events = Vec::with_capacity(identity.len() + attribute.len() + task.len());
    events.extend(identity);
    events.extend(attribute);
    events.extend(task);
    events.sort_by(|a, b| b.date.cmp(&a.date));
    events
}

pub fn merge_sources(sources: NormalizedSources) -> Vec<Event> {
    merge(sources.identity, sources.attribute, sources.task)
}
