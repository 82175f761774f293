pub mod csv_table;
pub mod discovery;
pub mod error;
pub mod mapping_file;

pub use csv_table::read_csv_table;
pub use discovery::{MAIN_TABLE_NAME, list_csv_files, load_record_set};
pub use error::{IngestError, Result};
pub use mapping_file::load_mapping;
