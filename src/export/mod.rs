pub mod csv;
pub mod xml;

pub use self::csv::to_csv_bytes;
pub use self::xml::to_xml_bytes;
