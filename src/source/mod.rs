pub mod reader;
pub mod sniff;

pub use reader::{clean_header, load_csv, read_csv_bytes};
pub use sniff::sniff_delimiter;
