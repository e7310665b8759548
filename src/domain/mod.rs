pub mod medicament;
pub mod note;

pub use medicament::{Medicament, MedicamentPatch, MedicamentService, NewMedicament};
pub use note::{NewNote, Note, NoteContent, NotePatch, NoteService};
