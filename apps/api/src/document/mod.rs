// Résumé document handling: binary document → plain text → heuristic fields.
// No network or database access happens in this module.

pub mod extractor;
pub mod info;
