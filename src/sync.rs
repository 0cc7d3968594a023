use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use coursekit::helpers::{load_draft, read_json, write_json};
use coursekit::resources::{Assignment, Discussion, Document, LiveClass, Quiz, Rating, Video};
use coursekit::{
    Backend, CourseBuilder, CourseDraft, CurriculumEditor, DroppedContent, HttpBackend,
    LogNotifier, Resource, ResourceView, Session, UploadFile,
};

use crate::{CourseCommand, CurriculumCommand, ListKind};

fn report_dropped(dropped: &[DroppedContent]) {
    if dropped.is_empty() {
        return;
    }

    println!("{} content item(s) could not be placed:", dropped.len());
    for item in dropped {
        println!("  {} / {}: {:?}", item.section, item.lecture, item.reason);
    }
}

/// Nothing the CLI runs deletes from a draft, so prompts are never shown.
fn no_prompt(_message: &str) -> bool {
    true
}

pub async fn curriculum(backend: &HttpBackend, command: &CurriculumCommand) -> Result<()> {
    match command {
        CurriculumCommand::Pull { course_id, out } => {
            let (editor, dropped) = CurriculumEditor::load(backend, *course_id, no_prompt)
                .await
                .with_context(|| format!("pulling curriculum of course {course_id}"))?;

            write_json(out, editor.draft())?;
            report_dropped(&dropped);
            println!(
                "{} section(s), {} lecture(s) written to {}",
                editor.draft().sections.len(),
                editor.draft().lecture_count(),
                out.display()
            );
        }
        CurriculumCommand::Push { course_id, file } => {
            let draft = load_draft(file)
                .with_context(|| format!("reading curriculum draft {}", file.display()))?;
            let mut editor = CurriculumEditor::new(draft, no_prompt);

            let dropped = editor
                .save(backend, *course_id)
                .await
                .with_context(|| format!("pushing curriculum of course {course_id}"))?;

            write_json(file, editor.draft())?;
            report_dropped(&dropped);
            println!("curriculum of course {course_id} saved");
        }
        CurriculumCommand::Format { .. } => bail!("formatting does not talk to the backend"),
    }

    Ok(())
}

pub async fn course(backend: HttpBackend, command: &CourseCommand) -> Result<()> {
    let CourseCommand::Save {
        file,
        course_id,
        preview,
    } = command;

    let draft: CourseDraft =
        read_json(file).with_context(|| format!("reading course draft {}", file.display()))?;

    let mut builder = CourseBuilder::with_draft(backend, LogNotifier, draft);
    if let Some(course_id) = course_id {
        builder = builder.for_course(*course_id);
    }

    if *preview {
        let page = builder.save_and_preview().await?;
        println!("{page}");
    } else {
        let course_id = builder.save().await?;
        println!("course {course_id} saved");
    }

    Ok(())
}

async fn print_list<R, B>(backend: B, session: &Session, course_id: i64) -> Result<()>
where
    R: Resource,
    B: Backend,
{
    let mut view = ResourceView::<R, _, _>::new(backend, LogNotifier, session, course_id);
    view.load().await?;

    tracing::debug!(kind = R::NAME, actions = ?view.allowed_actions(), "view loaded");
    println!("{}", serde_json::to_string_pretty(view.items())?);

    Ok(())
}

pub async fn list(
    backend: &HttpBackend,
    session: &Session,
    kind: ListKind,
    course_id: i64,
) -> Result<()> {
    match kind {
        ListKind::Assignments => print_list::<Assignment, _>(backend, session, course_id).await,
        ListKind::Quizzes => print_list::<Quiz, _>(backend, session, course_id).await,
        ListKind::Documents => print_list::<Document, _>(backend, session, course_id).await,
        ListKind::Videos => print_list::<Video, _>(backend, session, course_id).await,
        ListKind::LiveClasses => print_list::<LiveClass, _>(backend, session, course_id).await,
        ListKind::Discussions => print_list::<Discussion, _>(backend, session, course_id).await,
        ListKind::Ratings => print_list::<Rating, _>(backend, session, course_id).await,
    }
}

pub async fn upload(backend: &HttpBackend, file: &Path, folder: &str) -> Result<()> {
    let file_name = file
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("{} has no file name", file.display()))?
        .to_owned();
    let bytes = fs::read(file).with_context(|| format!("reading {}", file.display()))?;

    let url = backend.upload(UploadFile::new(file_name, bytes), folder).await?;
    println!("{url}");

    Ok(())
}
