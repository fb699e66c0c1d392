// Library interface for blogdigest modules
// This allows tests and other binaries to import modules

pub mod ingestion;
pub mod llm;
pub mod nlp;
pub mod processing;
pub mod scraping;
pub mod storage;
