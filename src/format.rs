use std::path::PathBuf;

use anyhow::Result;
use coursekit::helpers::load_drafts_and_write_formatted;

pub fn format(data_path: PathBuf) -> Result<()> {
    for (path, draft) in load_drafts_and_write_formatted(data_path)? {
        tracing::debug!(path = %path.display(), hash = %draft.hash(), "draft formatted");
        println!(
            "{}: {} section(s), {} lecture(s)",
            path.display(),
            draft.sections.len(),
            draft.lecture_count()
        );
    }

    Ok(())
}
