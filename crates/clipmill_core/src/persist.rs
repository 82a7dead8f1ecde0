use crate::error::Result;
use crate::model::Project;
use std::path::Path;

impl Project {
    /// Save the project to a file as pretty-printed JSON.
    /// Automatically appends the `.clipmill` extension if not present.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = ensure_extension(path.as_ref());
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a project from a JSON file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let project: Project = serde_json::from_str(&data)?;
        Ok(project)
    }
}

fn ensure_extension(path: &Path) -> std::path::PathBuf {
    if path.extension().and_then(|e| e.to_str()) == Some("clipmill") {
        path.to_path_buf()
    } else {
        let mut p = path.to_path_buf();
        let mut name = p.file_name().unwrap_or_default().to_os_string();
        name.push(".clipmill");
        p.set_file_name(name);
        p
    }
}
