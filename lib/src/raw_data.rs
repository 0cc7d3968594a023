use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::data::{
    CaptionsContent, ContentBlock, ContentKind, CurriculumDraft, DraftId, LectureContent,
    LectureData, MediaContent, SectionData, TextContent, DEFAULT_LECTURE_TYPE,
};

/// A section as the backend stores it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawSection {
    #[serde(default)]
    pub id: Option<i64>,

    #[serde(alias = "name")]
    pub title: String,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub lectures: Vec<RawLecture>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawLecture {
    #[serde(default)]
    pub id: Option<i64>,

    #[serde(alias = "title")]
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub lecture_type: Option<String>,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub contents: Vec<RawContentItem>,
}

/// One entry of a lecture's ordered content list.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawContentItem {
    #[serde(rename = "type")]
    pub content_type: String,
    #[serde(default)]
    pub order: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Fields this client does not model, kept so dropped items can be
    /// reported in full.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawContentItem {
    fn new(content_type: ContentKind) -> Self {
        Self {
            content_type: content_type.as_str().to_owned(),
            order: 0,
            url: None,
            file_name: None,
            duration: None,
            text: None,
            extra: Map::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropReason {
    /// The type tag names none of the known content kinds.
    UnknownType,
    /// A later item of the same kind took the slot.
    Duplicate,
    /// The item lacks a field its kind needs.
    MissingField(&'static str),
}

/// A content item that hydration could not place into a slot.
#[derive(Clone, Debug, PartialEq)]
pub struct DroppedContent {
    pub section: String,
    pub lecture: String,
    pub reason: DropReason,
    pub item: RawContentItem,
}

/// Result of turning the backend representation into a draft.
#[derive(Clone, Debug, Default)]
pub struct Hydrated {
    pub draft: CurriculumDraft,
    pub dropped: Vec<DroppedContent>,
}

impl Hydrated {
    pub fn is_lossless(&self) -> bool {
        self.dropped.is_empty()
    }
}

impl TryFrom<RawContentItem> for ContentBlock {
    type Error = DropReason;

    fn try_from(raw: RawContentItem) -> std::result::Result<Self, Self::Error> {
        let kind = ContentKind::parse(&raw.content_type).ok_or(DropReason::UnknownType)?;

        if kind.uses_upload() {
            let url = raw.url.ok_or(DropReason::MissingField("url"))?;

            return match kind {
                ContentKind::Captions => Ok(Self::Captions(CaptionsContent {
                    url,
                    file_name: raw.file_name,
                })),
                ContentKind::File => Ok(Self::File(MediaContent {
                    url,
                    file_name: raw.file_name,
                    duration: raw.duration,
                })),
                _ => Ok(Self::Video(MediaContent {
                    url,
                    file_name: raw.file_name,
                    duration: raw.duration,
                })),
            };
        }

        let text = TextContent {
            text: raw.text.ok_or(DropReason::MissingField("text"))?,
        };

        match kind {
            ContentKind::Notes => Ok(Self::Notes(text)),
            _ => Ok(Self::Desc(text)),
        }
    }
}

impl From<ContentBlock> for RawContentItem {
    fn from(block: ContentBlock) -> Self {
        let mut raw = Self::new(block.kind());

        match block {
            ContentBlock::Video(media) | ContentBlock::File(media) => {
                raw.url = Some(media.url);
                raw.file_name = media.file_name;
                raw.duration = media.duration;
            }
            ContentBlock::Desc(text) | ContentBlock::Notes(text) => {
                raw.text = Some(text.text);
            }
            ContentBlock::Captions(captions) => {
                raw.url = Some(captions.url);
                raw.file_name = captions.file_name;
            }
        }

        raw
    }
}

impl From<LectureData> for RawLecture {
    fn from(data: LectureData) -> Self {
        let contents = data
            .content
            .blocks()
            .into_iter()
            .enumerate()
            .map(|(index, block)| RawContentItem {
                order: index as u32 + 1,
                ..block.into()
            })
            .collect();

        Self {
            id: data.id.server_id(),
            name: data.name,
            lecture_type: Some(data.lecture_type),
            order: data.order,
            contents,
        }
    }
}

impl From<SectionData> for RawSection {
    fn from(data: SectionData) -> Self {
        let lectures = data.lectures.into_iter().map(Into::into).collect();

        Self {
            id: data.id.server_id(),
            title: data.name,
            order: data.order,
            lectures,
        }
    }
}

impl RawLecture {
    fn hydrate(self, section: &str, dropped: &mut Vec<DroppedContent>) -> LectureData {
        let mut content = LectureContent::default();
        // Raw items currently holding a slot, so a later duplicate can report
        // the one it displaces.
        let mut placed: Vec<(ContentKind, RawContentItem)> = Vec::new();

        for item in self.contents {
            let report = |reason: DropReason, item: RawContentItem| DroppedContent {
                section: section.to_owned(),
                lecture: self.name.clone(),
                reason,
                item,
            };

            match ContentBlock::try_from(item.clone()) {
                Ok(block) => {
                    let kind = block.kind();

                    if let Some(index) = placed.iter().position(|(placed, _)| *placed == kind) {
                        let (_, displaced) = placed.remove(index);
                        dropped.push(report(DropReason::Duplicate, displaced));
                    }

                    content.set(block);
                    placed.push((kind, item));
                }
                Err(reason) => dropped.push(report(reason, item)),
            }
        }

        LectureData {
            id: self.id.map_or_else(DraftId::temp, DraftId::Server),
            name: self.name,
            lecture_type: self
                .lecture_type
                .unwrap_or_else(|| DEFAULT_LECTURE_TYPE.to_owned()),
            order: 0,
            content,
        }
    }
}

impl RawSection {
    fn hydrate(self, dropped: &mut Vec<DroppedContent>) -> SectionData {
        let lectures = self
            .lectures
            .into_iter()
            .map(|lecture| lecture.hydrate(&self.title, dropped))
            .collect();

        SectionData {
            id: self.id.map_or_else(DraftId::temp, DraftId::Server),
            name: self.title,
            order: 0,
            lectures,
        }
    }
}

/// Turns the backend's ordered content lists into keyed slots.
///
/// Array position decides the order; stored `order` values are ignored and
/// renumbered. Items that cannot be placed are returned in `dropped` and
/// logged; the caller decides whether to surface them.
pub fn hydrate(raw_sections: Vec<RawSection>) -> Hydrated {
    let mut dropped = Vec::new();
    let sections = raw_sections
        .into_iter()
        .map(|section| section.hydrate(&mut dropped))
        .collect();

    for item in &dropped {
        tracing::warn!(
            section = %item.section,
            lecture = %item.lecture,
            content_type = %item.item.content_type,
            reason = ?item.reason,
            "content item dropped while loading curriculum"
        );
    }

    let mut draft = CurriculumDraft::new(sections);
    draft.mark_clean();

    Hydrated { draft, dropped }
}

/// Turns a draft into the backend's representation, numbering sections,
/// lectures and content items from their array positions.
pub fn flatten(draft: &CurriculumDraft) -> Vec<RawSection> {
    let mut draft = draft.clone();
    draft.renumber();

    draft.sections.into_iter().map(Into::into).collect()
}
