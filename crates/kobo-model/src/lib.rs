pub mod choices;
pub mod error;
pub mod ids;
pub mod mapping;
pub mod table;

pub use choices::ChoiceTable;
pub use error::{ModelError, Result};
pub use ids::RecordKey;
pub use mapping::{FieldPath, PATH_DELIMITER, PathMapping};
pub use table::{CellValue, RecordSet, Row, Table};
