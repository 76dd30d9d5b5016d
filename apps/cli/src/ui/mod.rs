mod progress;
mod table;

pub use progress::BarSink;
pub use table::{candidates_table, histories_table, resume_table};
