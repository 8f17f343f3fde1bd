pub mod calendar;
pub mod dates;
pub mod extractor;
pub mod jwt;
pub mod test_utils;
