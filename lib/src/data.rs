use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Entity, Error, Result};

/// Identity of a section or lecture inside a draft.
///
/// Entities created locally carry a random temporary id until the backend
/// assigns a numeric one on save.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum DraftId {
    Server(i64),
    Temp(Uuid),
}

impl DraftId {
    pub fn temp() -> Self {
        Self::Temp(Uuid::new_v4())
    }

    pub fn server_id(&self) -> Option<i64> {
        match self {
            Self::Server(id) => Some(*id),
            Self::Temp(_) => None,
        }
    }

    pub fn is_temp(&self) -> bool {
        matches!(self, Self::Temp(_))
    }

    pub fn parse(value: &str) -> Option<Self> {
        if let Ok(id) = value.parse::<i64>() {
            return Some(Self::Server(id));
        }

        value
            .strip_prefix("tmp-")
            .unwrap_or(value)
            .parse::<Uuid>()
            .ok()
            .map(Self::Temp)
    }

    fn hash_into(&self, hasher: &mut blake3::Hasher) {
        match self {
            Self::Server(id) => hasher.update(&id.to_le_bytes()),
            Self::Temp(uuid) => hasher.update(uuid.as_bytes()),
        };
    }
}

impl fmt::Display for DraftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Server(id) => write!(f, "{id}"),
            Self::Temp(uuid) => write!(f, "tmp-{uuid}"),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Video,
    File,
    Desc,
    Notes,
    Captions,
}

impl ContentKind {
    /// Canonical slot order, used for badges and for flattening.
    pub const ALL: [Self; 5] = [
        Self::Video,
        Self::File,
        Self::Desc,
        Self::Notes,
        Self::Captions,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::File => "file",
            Self::Desc => "desc",
            Self::Notes => "notes",
            Self::Captions => "captions",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(value.trim()))
    }

    /// Whether the slot is filled through an upload rather than typed text.
    pub fn uses_upload(self) -> bool {
        matches!(self, Self::Video | Self::File | Self::Captions)
    }

    /// Upload folder the backend files this kind of asset under.
    pub fn upload_folder(self) -> &'static str {
        match self {
            Self::Video => "lectures/videos",
            Self::File => "lectures/files",
            Self::Captions => "lectures/captions",
            Self::Desc | Self::Notes => "lectures",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MediaContent {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TextContent {
    pub text: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CaptionsContent {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

/// A single filled content slot.
#[derive(Clone, Debug, PartialEq)]
pub enum ContentBlock {
    Video(MediaContent),
    File(MediaContent),
    Desc(TextContent),
    Notes(TextContent),
    Captions(CaptionsContent),
}

impl ContentBlock {
    pub fn kind(&self) -> ContentKind {
        match self {
            Self::Video(_) => ContentKind::Video,
            Self::File(_) => ContentKind::File,
            Self::Desc(_) => ContentKind::Desc,
            Self::Notes(_) => ContentKind::Notes,
            Self::Captions(_) => ContentKind::Captions,
        }
    }

    pub fn text(kind: ContentKind, text: impl Into<String>) -> Result<Self> {
        let content = TextContent { text: text.into() };

        match kind {
            ContentKind::Desc => Ok(Self::Desc(content)),
            ContentKind::Notes => Ok(Self::Notes(content)),
            other => Err(Error::InvalidInput(format!(
                "{other} content is uploaded, not typed"
            ))),
        }
    }

    pub fn uploaded(
        kind: ContentKind,
        url: impl Into<String>,
        file_name: Option<String>,
        duration: Option<f64>,
    ) -> Result<Self> {
        let url = url.into();

        match kind {
            ContentKind::Video => Ok(Self::Video(MediaContent {
                url,
                file_name,
                duration,
            })),
            ContentKind::File => Ok(Self::File(MediaContent {
                url,
                file_name,
                duration,
            })),
            ContentKind::Captions => Ok(Self::Captions(CaptionsContent { url, file_name })),
            other => Err(Error::InvalidInput(format!(
                "{other} content is typed, not uploaded"
            ))),
        }
    }

    fn hash_into(&self, hasher: &mut blake3::Hasher) {
        hasher.update(self.kind().as_str().as_bytes());

        match self {
            Self::Video(media) | Self::File(media) => {
                hasher.update(media.url.as_bytes());
                hasher.update(media.file_name.as_deref().unwrap_or_default().as_bytes());
                hasher.update(&media.duration.unwrap_or(-1.0).to_le_bytes());
            }
            Self::Desc(text) | Self::Notes(text) => {
                hasher.update(text.text.as_bytes());
            }
            Self::Captions(captions) => {
                hasher.update(captions.url.as_bytes());
                hasher.update(captions.file_name.as_deref().unwrap_or_default().as_bytes());
            }
        }
    }
}

/// Keyed content slots of a lecture. A slot's presence is the only signal
/// that the lecture "has" that kind of content.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct LectureContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<MediaContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<MediaContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<TextContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<TextContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captions: Option<CaptionsContent>,
}

impl LectureContent {
    pub fn get(&self, kind: ContentKind) -> Option<ContentBlock> {
        match kind {
            ContentKind::Video => self.video.clone().map(ContentBlock::Video),
            ContentKind::File => self.file.clone().map(ContentBlock::File),
            ContentKind::Desc => self.desc.clone().map(ContentBlock::Desc),
            ContentKind::Notes => self.notes.clone().map(ContentBlock::Notes),
            ContentKind::Captions => self.captions.clone().map(ContentBlock::Captions),
        }
    }

    /// Replaces the slot for the block's kind wholesale, returning what was
    /// there before.
    pub fn set(&mut self, block: ContentBlock) -> Option<ContentBlock> {
        let previous = self.get(block.kind());

        match block {
            ContentBlock::Video(media) => self.video = Some(media),
            ContentBlock::File(media) => self.file = Some(media),
            ContentBlock::Desc(text) => self.desc = Some(text),
            ContentBlock::Notes(text) => self.notes = Some(text),
            ContentBlock::Captions(captions) => self.captions = Some(captions),
        }

        previous
    }

    pub fn clear(&mut self, kind: ContentKind) -> Option<ContentBlock> {
        let previous = self.get(kind);

        match kind {
            ContentKind::Video => self.video = None,
            ContentKind::File => self.file = None,
            ContentKind::Desc => self.desc = None,
            ContentKind::Notes => self.notes = None,
            ContentKind::Captions => self.captions = None,
        }

        previous
    }

    pub fn has(&self, kind: ContentKind) -> bool {
        match kind {
            ContentKind::Video => self.video.is_some(),
            ContentKind::File => self.file.is_some(),
            ContentKind::Desc => self.desc.is_some(),
            ContentKind::Notes => self.notes.is_some(),
            ContentKind::Captions => self.captions.is_some(),
        }
    }

    /// Filled slots in canonical order.
    pub fn blocks(&self) -> Vec<ContentBlock> {
        ContentKind::ALL
            .into_iter()
            .filter_map(|kind| self.get(kind))
            .collect()
    }

    pub fn badges(&self) -> Vec<ContentKind> {
        ContentKind::ALL
            .into_iter()
            .filter(|kind| self.has(*kind))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.badges().is_empty()
    }
}

pub const DEFAULT_LECTURE_TYPE: &str = "lecture";

fn default_lecture_type() -> String {
    DEFAULT_LECTURE_TYPE.to_owned()
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LectureData {
    pub id: DraftId,

    pub name: String,
    #[serde(rename = "type", default = "default_lecture_type")]
    pub lecture_type: String,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub content: LectureContent,
}

impl LectureData {
    pub fn new(id: DraftId, name: String) -> Self {
        Self {
            id,
            name,
            lecture_type: default_lecture_type(),
            order: 0,
            content: LectureContent::default(),
        }
    }

    pub fn content_badges(&self) -> Vec<ContentKind> {
        self.content.badges()
    }

    fn hash_into(&self, hasher: &mut blake3::Hasher) {
        self.id.hash_into(hasher);
        hasher.update(self.name.as_bytes());
        hasher.update(self.lecture_type.as_bytes());

        for block in self.content.blocks() {
            block.hash_into(hasher);
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SectionData {
    pub id: DraftId,

    pub name: String,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub lectures: Vec<LectureData>,
}

impl SectionData {
    pub fn new(id: DraftId, name: String) -> Self {
        Self {
            id,
            name,
            order: 0,
            lectures: Vec::new(),
        }
    }

    pub fn lecture(&self, lecture_id: &DraftId) -> Option<&LectureData> {
        self.lectures.iter().find(|lecture| &lecture.id == lecture_id)
    }

    pub fn lecture_mut(&mut self, lecture_id: &DraftId) -> Result<&mut LectureData> {
        self.lectures
            .iter_mut()
            .find(|lecture| &lecture.id == lecture_id)
            .ok_or_else(|| Error::NotFound(Entity::Lecture(lecture_id.to_string())))
    }

    fn renumber(&mut self) {
        for (index, lecture) in self.lectures.iter_mut().enumerate() {
            lecture.order = position(index);
        }
    }

    fn hash_into(&self, hasher: &mut blake3::Hasher) {
        self.id.hash_into(hasher);
        hasher.update(self.name.as_bytes());

        for lecture in &self.lectures {
            lecture.hash_into(hasher);
        }
    }
}

/// Fields of a section that can be patched. `None` leaves a field alone.
#[derive(Clone, Debug, Default)]
pub struct SectionPatch {
    pub name: Option<String>,
}

/// Fields of a lecture that can be patched. `None` leaves a field alone.
#[derive(Clone, Debug, Default)]
pub struct LecturePatch {
    pub name: Option<String>,
    pub lecture_type: Option<String>,
}

/// In-memory curriculum tree: sections, their lectures, and each lecture's
/// content slots.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct CurriculumDraft {
    pub sections: Vec<SectionData>,

    #[serde(skip)]
    clean_hash: Option<String>,
}

impl PartialEq for CurriculumDraft {
    fn eq(&self, other: &Self) -> bool {
        self.sections == other.sections
    }
}

impl CurriculumDraft {
    pub fn new(sections: Vec<SectionData>) -> Self {
        let mut draft = Self {
            sections,
            clean_hash: None,
        };

        draft.renumber();
        draft
    }

    pub fn section(&self, section_id: &DraftId) -> Option<&SectionData> {
        self.sections.iter().find(|section| &section.id == section_id)
    }

    pub fn section_mut(&mut self, section_id: &DraftId) -> Result<&mut SectionData> {
        self.sections
            .iter_mut()
            .find(|section| &section.id == section_id)
            .ok_or_else(|| Error::NotFound(Entity::Section(section_id.to_string())))
    }

    pub fn lecture(&self, section_id: &DraftId, lecture_id: &DraftId) -> Option<&LectureData> {
        self.section(section_id)?.lecture(lecture_id)
    }

    pub fn lecture_mut(
        &mut self,
        section_id: &DraftId,
        lecture_id: &DraftId,
    ) -> Result<&mut LectureData> {
        self.section_mut(section_id)?.lecture_mut(lecture_id)
    }

    pub fn lecture_count(&self) -> usize {
        self.sections.iter().map(|section| section.lectures.len()).sum()
    }

    /// Rewrites every `order` from array position.
    pub fn renumber(&mut self) {
        for (index, section) in self.sections.iter_mut().enumerate() {
            section.order = position(index);
            section.renumber();
        }
    }

    /// Whether every sibling list is numbered 1..k without gaps.
    pub fn is_contiguous(&self) -> bool {
        let contiguous = |orders: Vec<u32>| {
            orders
                .into_iter()
                .enumerate()
                .all(|(index, order)| order == position(index))
        };

        contiguous(self.sections.iter().map(|section| section.order).collect())
            && self.sections.iter().all(|section| {
                contiguous(section.lectures.iter().map(|lecture| lecture.order).collect())
            })
    }

    pub fn hash(&self) -> String {
        Self::hash_data(&self.sections[..])
    }

    fn hash_data(sections: &[SectionData]) -> String {
        let mut hasher = blake3::Hasher::new();

        for section in sections {
            section.hash_into(&mut hasher);
        }

        hasher.finalize().to_string()
    }

    /// Records the current tree as matching what the backend holds.
    pub fn mark_clean(&mut self) {
        self.clean_hash = Some(self.hash());
    }

    /// Whether there are edits the backend has not seen. A draft that was
    /// never loaded or saved is dirty as soon as it has any section.
    pub fn is_dirty(&self) -> bool {
        match &self.clean_hash {
            Some(hash) => *hash != self.hash(),
            None => !self.sections.is_empty(),
        }
    }
}

fn position(index: usize) -> u32 {
    u32::try_from(index + 1).unwrap_or(u32::MAX)
}
