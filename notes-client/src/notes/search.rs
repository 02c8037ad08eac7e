use super::Note;

/// Notes whose title or content contains `query`, ignoring case, in cache order.
pub fn search<'a>(notes: &'a [Note], query: &str) -> Vec<&'a Note> {
    if query.is_empty() {
        return notes.iter().collect();
    }

    let query = query.to_lowercase();
    notes
        .iter()
        .filter(|note| note.title.to_lowercase().contains(&query) || note.content.to_lowercase().contains(&query))
        .collect()
}
