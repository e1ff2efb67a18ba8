use dinox_core::Note;

/// Human-readable document path `/{date}/{identity}` used to find a note's
/// mirror in the notebook.
pub fn document_path(date: &str, note: &Note) -> String {
    format!("/{date}/{}", note.identity())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titled_note_lands_under_its_day() {
        let note = Note {
            title: "X".into(),
            note_id: "n-1".into(),
            ..Note::default()
        };
        assert_eq!(document_path("2024-01-01", &note), "/2024-01-01/X");
    }

    #[test]
    fn untitled_note_uses_note_id() {
        let note = Note {
            note_id: "0193e5c2".into(),
            ..Note::default()
        };
        assert_eq!(document_path("2024-01-01", &note), "/2024-01-01/0193e5c2");
    }
}
