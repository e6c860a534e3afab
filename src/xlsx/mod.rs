pub mod writer;

pub use writer::write_views_to_xlsx;
