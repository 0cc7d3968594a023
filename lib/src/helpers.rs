use std::fs::{self, ReadDir};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::data::CurriculumDraft;
use crate::error::Result;

pub fn read_data_dir(data_path: PathBuf) -> Result<ReadDir> {
    let data_path = fs::canonicalize(data_path)?;
    let entries = fs::read_dir(data_path)?;

    Ok(entries)
}

pub fn write_data(path: &Path, data: String) -> Result<()> {
    fs::write(path, format!("{data}\n"))?;

    Ok(())
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw_data = fs::read(path)?;

    Ok(serde_json::from_slice(&raw_data)?)
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    write_data(path, serde_json::to_string_pretty(value)?)
}

/// Reads a curriculum draft file and renumbers it from array positions.
pub fn load_draft(path: &Path) -> Result<CurriculumDraft> {
    let draft: CurriculumDraft = read_json(path)?;

    Ok(CurriculumDraft::new(draft.sections))
}

pub fn load_draft_and_write_formatted(path: &Path) -> Result<CurriculumDraft> {
    let draft = load_draft(path)?;
    write_json(path, &draft)?;

    Ok(draft)
}

/// Formats every `.json` draft directly inside `data_path`.
pub fn load_drafts_and_write_formatted(data_path: PathBuf) -> Result<Vec<(PathBuf, CurriculumDraft)>> {
    let mut drafts = Vec::new();

    for dir_entry in read_data_dir(data_path)? {
        let dir_entry = dir_entry?;
        let path = dir_entry.path();

        if dir_entry.file_type()?.is_dir() || path.extension().map_or(true, |ext| ext != "json") {
            continue;
        }

        let draft = load_draft_and_write_formatted(&path)?;
        drafts.push((path, draft));
    }

    drafts.sort_by(|a, b| a.0.cmp(&b.0));

    Ok(drafts)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn formatting_renumbers_and_skips_other_files() {
        let dir = tempdir().unwrap();
        let draft_path = dir.path().join("rust-101.json");
        fs::write(
            &draft_path,
            json!({
                "sections": [
                    { "id": 1, "name": "Intro", "order": 4, "lectures": [
                        { "id": 2, "name": "Welcome", "order": 9, "content": { "desc": { "text": "hi" } } }
                    ]},
                    { "id": 3, "name": "Wrap up", "order": 1 }
                ]
            })
            .to_string(),
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "not a draft").unwrap();
        fs::create_dir_all(dir.path().join("archive")).unwrap();

        let drafts = load_drafts_and_write_formatted(dir.path().to_path_buf()).unwrap();

        assert_eq!(drafts.len(), 1);
        let draft = &drafts[0].1;
        assert!(draft.is_contiguous());
        assert_eq!(draft.sections[0].name, "Intro");
        assert_eq!(draft.sections[0].lectures[0].order, 1);

        let rewritten = fs::read_to_string(&draft_path).unwrap();
        assert!(rewritten.ends_with("}\n"));
        let reread = load_draft(&draft_path).unwrap();
        assert_eq!(&reread, draft);
    }

    #[test]
    fn missing_data_dir_is_an_io_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("absent");

        assert!(matches!(
            load_drafts_and_write_formatted(missing),
            Err(crate::error::Error::Io(_))
        ));
    }
}
