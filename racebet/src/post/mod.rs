pub mod race_record;
pub mod race_result;
