pub mod note;

pub use note::{Note, SaveStatus};
