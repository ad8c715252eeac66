pub mod price_reader;
