//! Client-side core of the course platform: the curriculum draft and its
//! exchange format, the course builder, course-scoped resource views, the
//! live-class bridge and the REST client they all talk through.

pub mod backend;
pub mod builder;
pub mod client;
pub mod data;
pub mod editor;
pub mod error;
pub mod helpers;
pub mod live;
pub mod notify;
pub mod raw_data;
pub mod resources;
pub mod session;
pub mod views;

#[cfg(test)]
mod fake;

pub use backend::{Backend, UploadFile};
pub use builder::{CourseBuilder, CourseDraft, CoursePayload, CourseRecord, PricingModel, Step};
pub use client::HttpBackend;
pub use data::{
    CaptionsContent, ContentBlock, ContentKind, CurriculumDraft, DraftId, LectureContent,
    LectureData, LecturePatch, MediaContent, SectionData, SectionPatch, TextContent,
};
pub use editor::{Confirm, ContentModal, CurriculumEditor, Removal};
pub use error::{Error, Result};
pub use live::{BridgeSignal, ConferenceEvent, ConferenceSdk, LiveClassBridge, LiveClassController};
pub use notify::{LogNotifier, Notifier, Toast, ToastLevel, ToastLog};
pub use raw_data::{DropReason, DroppedContent, Hydrated, RawContentItem, RawLecture, RawSection};
pub use resources::Resource;
pub use session::{AuthUser, ClientConfig, Session};
pub use views::{Action, CourseOverview, ResourceView, ViewMode, ViewScope};
