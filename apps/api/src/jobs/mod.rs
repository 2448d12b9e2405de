// Job postings: the data-access seam, the validated load path, and the
// per-source skill frequency tables built straight from records.

pub mod frequency;
pub mod handlers;
pub mod store;
