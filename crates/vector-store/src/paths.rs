use std::path::PathBuf;

pub const SEMRAG_DIR_NAME: &str = ".semrag";
pub const INDEX_DIR_NAME: &str = "index";

pub const VECTORS_FILE_NAME: &str = "vectors.bin";
pub const DOCUMENTS_FILE_NAME: &str = "documents.json";

#[must_use]
pub fn default_index_dir_rel() -> PathBuf {
    PathBuf::from(SEMRAG_DIR_NAME).join(INDEX_DIR_NAME)
}
