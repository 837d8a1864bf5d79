//! momo-ingest: SMS source readers, the MoMo SMS extractor, and sample data generation.

pub mod parsers;
pub mod reader;
pub mod sample;
pub mod types;

pub use parsers::momo_sms::SmsExtractor;
pub use reader::{parse_sms_json, parse_sms_xml, read_messages};
pub use types::SourceFormat;
