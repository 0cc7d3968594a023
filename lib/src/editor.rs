use crate::backend::{paths, Backend, UploadFile};
use crate::data::{
    ContentBlock, ContentKind, CurriculumDraft, DraftId, LectureData, LecturePatch, SectionData,
    SectionPatch,
};
use crate::error::{Entity, Error, Result};
use crate::raw_data::{self, DroppedContent, RawSection};

/// Asks the user before something is removed.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F: Fn(&str) -> bool> Confirm for F {
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Removal {
    Removed,
    Declined,
}

/// The type-specific editor opened for one content slot of one lecture.
#[derive(Clone, Debug, PartialEq)]
pub struct ContentModal {
    pub section_id: DraftId,
    pub lecture_id: DraftId,
    pub kind: ContentKind,
    pub current: Option<ContentBlock>,
}

impl ContentModal {
    /// Value of a `contentId` query parameter that opens this modal.
    pub fn deep_link(&self) -> String {
        format!("{}:{}", self.lecture_id, self.kind)
    }

    pub fn text_block(&self, text: impl Into<String>) -> Result<ContentBlock> {
        ContentBlock::text(self.kind, text)
    }

    /// Uploads `file` and builds the block pointing at its public URL.
    pub async fn upload_block<B: Backend>(
        &self,
        backend: &B,
        file: UploadFile,
        duration: Option<f64>,
    ) -> Result<ContentBlock> {
        if !self.kind.uses_upload() {
            return Err(Error::InvalidInput(format!(
                "{} content is typed, not uploaded",
                self.kind
            )));
        }

        let file_name = file.file_name.clone();
        let url = backend.upload(file, self.kind.upload_folder()).await?;
        tracing::debug!(kind = %self.kind, %url, "content uploaded");

        ContentBlock::uploaded(self.kind, url, Some(file_name), duration)
    }
}

/// Local editing of a curriculum tree. Nothing reaches the backend until
/// `save`.
pub struct CurriculumEditor<C> {
    draft: CurriculumDraft,
    confirm: C,
}

impl<C: Confirm> CurriculumEditor<C> {
    pub fn new(draft: CurriculumDraft, confirm: C) -> Self {
        Self { draft, confirm }
    }

    pub async fn load<B: Backend>(
        backend: &B,
        course_id: i64,
        confirm: C,
    ) -> Result<(Self, Vec<DroppedContent>)> {
        let raw_sections: Vec<RawSection> = backend.get(&paths::curriculum(course_id)).await?;
        let hydrated = raw_data::hydrate(raw_sections);

        Ok((Self::new(hydrated.draft, confirm), hydrated.dropped))
    }

    pub fn draft(&self) -> &CurriculumDraft {
        &self.draft
    }

    pub fn into_draft(self) -> CurriculumDraft {
        self.draft
    }

    pub fn is_dirty(&self) -> bool {
        self.draft.is_dirty()
    }

    pub fn add_section(&mut self) -> DraftId {
        let id = DraftId::temp();
        let name = format!("Section {}", self.draft.sections.len() + 1);

        self.draft.sections.push(SectionData::new(id, name));
        self.draft.renumber();

        id
    }

    pub fn add_lecture(&mut self, section_id: &DraftId) -> Result<DraftId> {
        let section = self.draft.section_mut(section_id)?;
        let id = DraftId::temp();
        let name = format!("Lecture {}", section.lectures.len() + 1);

        section.lectures.push(LectureData::new(id, name));
        self.draft.renumber();

        Ok(id)
    }

    pub fn update_section(&mut self, section_id: &DraftId, patch: SectionPatch) -> Result<()> {
        let section = self.draft.section_mut(section_id)?;

        if let Some(name) = patch.name {
            section.name = name;
        }

        Ok(())
    }

    pub fn update_lecture(
        &mut self,
        section_id: &DraftId,
        lecture_id: &DraftId,
        patch: LecturePatch,
    ) -> Result<()> {
        let lecture = self.draft.lecture_mut(section_id, lecture_id)?;

        if let Some(name) = patch.name {
            lecture.name = name;
        }

        if let Some(lecture_type) = patch.lecture_type {
            lecture.lecture_type = lecture_type;
        }

        Ok(())
    }

    /// Removes a section and all of its lectures after one confirmation.
    pub fn delete_section(&mut self, section_id: &DraftId) -> Result<Removal> {
        let section = self
            .draft
            .section(section_id)
            .ok_or_else(|| Error::NotFound(Entity::Section(section_id.to_string())))?;

        let prompt = format!(
            "Delete section \"{}\" and its {} lecture(s)?",
            section.name,
            section.lectures.len()
        );

        if !self.confirm.confirm(&prompt) {
            return Ok(Removal::Declined);
        }

        self.draft.sections.retain(|section| &section.id != section_id);
        self.draft.renumber();

        Ok(Removal::Removed)
    }

    pub fn delete_lecture(&mut self, section_id: &DraftId, lecture_id: &DraftId) -> Result<Removal> {
        let lecture = self
            .draft
            .lecture(section_id, lecture_id)
            .ok_or_else(|| Error::NotFound(Entity::Lecture(lecture_id.to_string())))?;

        let prompt = format!("Delete lecture \"{}\"?", lecture.name);

        if !self.confirm.confirm(&prompt) {
            return Ok(Removal::Declined);
        }

        self.draft
            .section_mut(section_id)?
            .lectures
            .retain(|lecture| &lecture.id != lecture_id);
        self.draft.renumber();

        Ok(Removal::Removed)
    }

    pub fn open_content(
        &self,
        section_id: &DraftId,
        lecture_id: &DraftId,
        kind: ContentKind,
    ) -> Result<ContentModal> {
        let lecture = self
            .draft
            .lecture(section_id, lecture_id)
            .ok_or_else(|| Error::NotFound(Entity::Lecture(lecture_id.to_string())))?;

        Ok(ContentModal {
            section_id: *section_id,
            lecture_id: *lecture_id,
            kind,
            current: lecture.content.get(kind),
        })
    }

    /// Resolves a `contentId` deep link of the form `<lectureId>:<kind>`.
    pub fn find_content(&self, content_id: &str) -> Result<ContentModal> {
        let not_found = || Error::NotFound(Entity::Content(content_id.to_owned()));

        let (lecture_id, kind) = content_id.rsplit_once(':').ok_or_else(not_found)?;
        let lecture_id = DraftId::parse(lecture_id).ok_or_else(not_found)?;
        let kind = ContentKind::parse(kind).ok_or_else(not_found)?;

        let section = self
            .draft
            .sections
            .iter()
            .find(|section| section.lecture(&lecture_id).is_some())
            .ok_or_else(not_found)?;

        self.open_content(&section.id, &lecture_id, kind)
    }

    /// Puts `block` into its slot, replacing any previous value whole.
    pub fn save_content(
        &mut self,
        section_id: &DraftId,
        lecture_id: &DraftId,
        block: ContentBlock,
    ) -> Result<Option<ContentBlock>> {
        let lecture = self.draft.lecture_mut(section_id, lecture_id)?;

        Ok(lecture.content.set(block))
    }

    /// Confirms a modal with the block it produced.
    pub fn apply(&mut self, modal: &ContentModal, block: ContentBlock) -> Result<Option<ContentBlock>> {
        if block.kind() != modal.kind {
            return Err(Error::InvalidInput(format!(
                "{} modal cannot save {} content",
                modal.kind,
                block.kind()
            )));
        }

        self.save_content(&modal.section_id, &modal.lecture_id, block)
    }

    pub fn clear_content(
        &mut self,
        section_id: &DraftId,
        lecture_id: &DraftId,
        kind: ContentKind,
    ) -> Result<Option<ContentBlock>> {
        let lecture = self.draft.lecture_mut(section_id, lecture_id)?;

        Ok(lecture.content.clear(kind))
    }

    /// Replaces the course's whole curriculum on the backend with this draft,
    /// then reloads the draft from the response so server ids take over.
    pub async fn save<B: Backend>(&mut self, backend: &B, course_id: i64) -> Result<Vec<DroppedContent>> {
        let raw_sections = raw_data::flatten(&self.draft);
        let saved: Vec<RawSection> = backend
            .put(&paths::curriculum(course_id), &raw_sections)
            .await?;

        let hydrated = raw_data::hydrate(saved);
        tracing::info!(
            course_id,
            sections = hydrated.draft.sections.len(),
            lectures = hydrated.draft.lecture_count(),
            "curriculum saved"
        );
        self.draft = hydrated.draft;

        Ok(hydrated.dropped)
    }
}
