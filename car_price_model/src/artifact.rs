use crate::error::ArtifactError;
use std::{
    fs,
    io,
    path::{Path, PathBuf},
};

pub const MODEL_EXTENSION: &str = "onnx";
const PERSISTED_FILE_NAME: &str = "uploaded_car_model.onnx";

/// Raw bytes of an uploaded model under the file name it was declared with.
#[derive(Debug, Clone)]
pub struct ModelArtifact {
    name: String,
    bytes: Vec<u8>,
}

impl ModelArtifact {
    /// Accepts an upload only when its file name carries the model extension.
    pub fn from_upload(file_name: &str, bytes: Vec<u8>) -> Result<Self, ArtifactError> {
        let path = Path::new(file_name);
        let has_model_extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(MODEL_EXTENSION));
        if !has_model_extension {
            return Err(ArtifactError::UnsupportedExtension {
                file_name: file_name.to_string(),
                expected: MODEL_EXTENSION.to_string(),
            });
        }

        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(file_name)
            .to_string();

        Ok(Self { name, bytes })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Writes the bytes to a fixed file inside `dir`, replacing the previous
    /// upload.
    pub fn persist(&self, dir: &Path) -> io::Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(PERSISTED_FILE_NAME);
        fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}
