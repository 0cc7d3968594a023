use serde::{Deserialize, Serialize};

use crate::backend::{paths, Backend};
use crate::data::CurriculumDraft;
use crate::error::Result;
use crate::notify::{Notifier, Toast};
use crate::raw_data::{self, DroppedContent, RawSection};

/// The four screens of the course builder, in order.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Basic = 1,
    Advance = 2,
    Curriculum = 3,
    Publish = 4,
}

impl Step {
    pub const FIRST: Self = Self::Basic;
    pub const LAST: Self = Self::Publish;

    pub fn number(self) -> u8 {
        self as u8
    }

    /// Any number maps to a step; out-of-range values clamp to the ends.
    pub fn from_number(number: i64) -> Self {
        match number {
            i64::MIN..=1 => Self::Basic,
            2 => Self::Advance,
            3 => Self::Curriculum,
            _ => Self::Publish,
        }
    }

    pub fn next(self) -> Self {
        Self::from_number(i64::from(self.number()) + 1)
    }

    pub fn prev(self) -> Self {
        Self::from_number(i64::from(self.number()) - 1)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PricingModel {
    #[default]
    Free,
    Paid,
}

/// Everything the builder's screens edit. Numeric fields hold whatever the
/// user typed and are coerced when the draft is serialized.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CourseDraft {
    // Basic
    pub title: String,
    pub subtitle: String,
    pub category_id: String,
    pub sub_category_id: String,
    pub topic: String,
    pub language: String,
    pub level: String,
    pub duration: String,

    // Advance
    pub thumbnail_url: Option<String>,
    pub trailer_url: Option<String>,
    pub description: String,
    pub teach: Vec<String>,
    pub audience: Vec<String>,
    pub requirements: Vec<String>,

    // Curriculum
    pub curriculum: CurriculumDraft,

    // Publish
    pub pricing_model: PricingModel,
    pub regular_price: String,
    pub sale_price: String,
    pub welcome_message: String,
    pub congrats_message: String,
}

/// The course as sent to and returned by `/api/courses`.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CoursePayload {
    pub title: String,
    pub subtitle: String,
    pub category_id: i64,
    pub sub_category_id: i64,
    pub topic: String,
    pub language: String,
    pub level: String,
    pub duration: String,
    pub thumbnail_url: Option<String>,
    pub trailer_url: Option<String>,
    pub description: String,
    pub teach: Vec<String>,
    pub audience: Vec<String>,
    pub requirements: Vec<String>,
    pub sections: Vec<RawSection>,
    pub pricing_model: PricingModel,
    pub regular_price: f64,
    pub sale_price: f64,
    pub welcome_message: String,
    pub congrats_message: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CourseRecord {
    pub id: i64,

    #[serde(flatten)]
    pub course: CoursePayload,
}

#[derive(Deserialize)]
struct Created {
    id: i64,
}

fn coerce_price(text: &str) -> f64 {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|price| price.is_finite() && *price >= 0.0)
        .unwrap_or(0.0)
}

fn coerce_id(text: &str) -> i64 {
    text.trim().parse().unwrap_or(0)
}

fn id_text(id: i64) -> String {
    if id == 0 {
        String::new()
    } else {
        id.to_string()
    }
}

fn price_text(price: f64) -> String {
    if price == 0.0 {
        String::new()
    } else {
        price.to_string()
    }
}

impl CourseDraft {
    pub fn payload(&self) -> CoursePayload {
        let (regular_price, sale_price) = match self.pricing_model {
            PricingModel::Free => (0.0, 0.0),
            PricingModel::Paid => (
                coerce_price(&self.regular_price),
                coerce_price(&self.sale_price),
            ),
        };

        CoursePayload {
            title: self.title.clone(),
            subtitle: self.subtitle.clone(),
            category_id: coerce_id(&self.category_id),
            sub_category_id: coerce_id(&self.sub_category_id),
            topic: self.topic.clone(),
            language: self.language.clone(),
            level: self.level.clone(),
            duration: self.duration.clone(),
            thumbnail_url: self.thumbnail_url.clone(),
            trailer_url: self.trailer_url.clone(),
            description: self.description.clone(),
            teach: self.teach.clone(),
            audience: self.audience.clone(),
            requirements: self.requirements.clone(),
            sections: raw_data::flatten(&self.curriculum),
            pricing_model: self.pricing_model,
            regular_price,
            sale_price,
            welcome_message: self.welcome_message.clone(),
            congrats_message: self.congrats_message.clone(),
        }
    }

    /// Rebuilds a draft from a stored course, reporting curriculum content
    /// that could not be placed.
    pub fn from_payload(payload: CoursePayload) -> (Self, Vec<DroppedContent>) {
        let hydrated = raw_data::hydrate(payload.sections);

        let draft = Self {
            title: payload.title,
            subtitle: payload.subtitle,
            category_id: id_text(payload.category_id),
            sub_category_id: id_text(payload.sub_category_id),
            topic: payload.topic,
            language: payload.language,
            level: payload.level,
            duration: payload.duration,
            thumbnail_url: payload.thumbnail_url,
            trailer_url: payload.trailer_url,
            description: payload.description,
            teach: payload.teach,
            audience: payload.audience,
            requirements: payload.requirements,
            curriculum: hydrated.draft,
            pricing_model: payload.pricing_model,
            regular_price: price_text(payload.regular_price),
            sale_price: price_text(payload.sale_price),
            welcome_message: payload.welcome_message,
            congrats_message: payload.congrats_message,
        };

        (draft, hydrated.dropped)
    }
}

/// Multi-step course form. Steps move freely; nothing is validated until the
/// backend sees the whole draft.
pub struct CourseBuilder<B, N> {
    backend: B,
    notifier: N,
    step: Step,
    course_id: Option<i64>,
    draft: CourseDraft,
}

impl<B: Backend, N: Notifier> CourseBuilder<B, N> {
    pub fn new(backend: B, notifier: N) -> Self {
        Self::with_draft(backend, notifier, CourseDraft::default())
    }

    pub fn with_draft(backend: B, notifier: N, draft: CourseDraft) -> Self {
        Self {
            backend,
            notifier,
            step: Step::FIRST,
            course_id: None,
            draft,
        }
    }

    /// Treats the draft as the stored course `course_id`, so saving updates it.
    pub fn for_course(mut self, course_id: i64) -> Self {
        self.course_id = Some(course_id);
        self
    }

    /// Opens an existing course for editing.
    pub async fn load(backend: B, notifier: N, course_id: i64) -> Result<(Self, Vec<DroppedContent>)> {
        let record = match backend.get::<CourseRecord>(&paths::course(course_id)).await {
            Ok(record) => record,
            Err(err) => {
                notifier.failure(&err);

                return Err(err);
            }
        };

        let (draft, dropped) = CourseDraft::from_payload(record.course);
        let builder = Self::with_draft(backend, notifier, draft).for_course(record.id);

        Ok((builder, dropped))
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn next(&mut self) -> Step {
        self.step = self.step.next();
        self.step
    }

    pub fn prev(&mut self) -> Step {
        self.step = self.step.prev();
        self.step
    }

    pub fn go_to(&mut self, number: i64) -> Step {
        self.step = Step::from_number(number);
        self.step
    }

    pub fn course_id(&self) -> Option<i64> {
        self.course_id
    }

    pub fn draft(&self) -> &CourseDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut CourseDraft {
        &mut self.draft
    }

    pub fn payload(&self) -> CoursePayload {
        self.draft.payload()
    }

    /// Creates the course, or updates it once an id is known.
    pub async fn save(&mut self) -> Result<i64> {
        let payload = self.payload();

        let saved = match self.course_id {
            Some(course_id) => self
                .backend
                .put::<_, serde_json::Value>(&paths::course(course_id), &payload)
                .await
                .map(|_| course_id),
            None => self
                .backend
                .post::<_, Created>(paths::COURSES, &payload)
                .await
                .map(|created| created.id),
        };

        match saved {
            Ok(course_id) => {
                tracing::info!(course_id, created = self.course_id.is_none(), "course saved");
                self.course_id = Some(course_id);
                self.draft.curriculum.mark_clean();
                self.notifier.notify(Toast::success("Course saved"));

                Ok(course_id)
            }
            Err(err) => {
                self.notifier.failure(&err);

                Err(err)
            }
        }
    }

    /// Saves, then returns the public page to navigate to.
    pub async fn save_and_preview(&mut self) -> Result<String> {
        let course_id = self.save().await?;

        Ok(paths::course_page(course_id))
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use serde_json::json;

    use super::*;
    use crate::data::{ContentBlock, DraftId, LectureData, MediaContent, SectionData};
    use crate::fake::FakeBackend;
    use crate::notify::ToastLog;

    #[test]
    fn steps_clamp_at_both_ends() {
        assert_eq!(Step::Basic.prev(), Step::Basic);
        assert_eq!(Step::Basic.next(), Step::Advance);
        assert_eq!(Step::Curriculum.next(), Step::Publish);
        assert_eq!(Step::Publish.next(), Step::Publish);
        assert_eq!(Step::from_number(-3), Step::Basic);
        assert_eq!(Step::from_number(99), Step::Publish);
    }

    #[test]
    fn any_step_is_reachable_with_an_empty_draft() {
        let mut builder = CourseBuilder::new(FakeBackend::default(), ToastLog::default());

        builder.next();
        builder.next();
        builder.next();
        builder.next();

        assert_eq!(builder.step(), Step::Publish);
        assert_eq!(builder.go_to(2), Step::Advance);
        assert_eq!(builder.prev(), Step::Basic);
    }

    #[test]
    fn free_courses_zero_both_prices() {
        let draft = CourseDraft {
            pricing_model: PricingModel::Free,
            regular_price: "49.99".into(),
            sale_price: "19".into(),
            ..CourseDraft::default()
        };

        let payload = draft.payload();

        assert_eq!(payload.regular_price, 0.0);
        assert_eq!(payload.sale_price, 0.0);
    }

    #[test]
    fn numeric_fields_are_coerced() {
        let draft = CourseDraft {
            category_id: " 4 ".into(),
            sub_category_id: "abc".into(),
            pricing_model: PricingModel::Paid,
            regular_price: "49.5".into(),
            sale_price: "cheap".into(),
            ..CourseDraft::default()
        };

        let payload = draft.payload();

        assert_eq!(payload.category_id, 4);
        assert_eq!(payload.sub_category_id, 0);
        assert_eq!(payload.regular_price, 49.5);
        assert_eq!(payload.sale_price, 0.0);
    }

    #[test]
    fn sections_are_sent_with_titles() {
        let mut section = SectionData::new(DraftId::temp(), "Intro".into());
        let mut lecture = LectureData::new(DraftId::temp(), "Welcome".into());
        lecture.content.set(ContentBlock::Video(MediaContent {
            url: "a.mp4".into(),
            file_name: None,
            duration: None,
        }));
        section.lectures.push(lecture);

        let draft = CourseDraft {
            curriculum: CurriculumDraft::new(vec![section]),
            ..CourseDraft::default()
        };

        let value = serde_json::to_value(draft.payload()).unwrap();

        assert_eq!(value["sections"][0]["title"], "Intro");
        assert!(value["sections"][0].get("name").is_none());
        assert_eq!(value["pricingModel"], "Free");
    }

    #[tokio::test]
    async fn first_save_creates_then_updates() {
        let backend = FakeBackend::default();
        backend.respond("POST", "/api/courses", json!({ "id": 12 }));
        backend.respond("PUT", "/api/courses/12", json!({ "id": 12 }));

        let toasts = ToastLog::default();
        let mut builder = CourseBuilder::new(&backend, toasts.clone());
        builder.draft_mut().title = "Rust for Beginners".into();

        assert_eq!(builder.save().await.unwrap(), 12);
        builder.draft_mut().subtitle = "Ownership first".into();
        assert_eq!(builder.save_and_preview().await.unwrap(), "/courses/12");

        assert_eq!(backend.calls(), vec!["POST /api/courses", "PUT /api/courses/12"]);
        assert_eq!(backend.bodies("PUT", "/api/courses/12")[0]["subtitle"], "Ownership first");
        assert_eq!(toasts.toasts().len(), 2);
    }

    #[tokio::test]
    async fn rejected_save_keeps_the_draft_and_toasts() {
        let backend = FakeBackend::default();
        backend.fail(
            "POST",
            "/api/courses",
            StatusCode::UNPROCESSABLE_ENTITY,
            Some("The title field is required."),
        );

        let toasts = ToastLog::default();
        let mut builder = CourseBuilder::new(&backend, toasts.clone());
        builder.go_to(4);

        assert!(builder.save_and_preview().await.is_err());
        assert_eq!(builder.course_id(), None);
        assert_eq!(builder.step(), Step::Publish);
        assert_eq!(
            toasts.last(),
            Some(Toast::error("The title field is required."))
        );
    }

    #[tokio::test]
    async fn loading_an_existing_course_hydrates_the_draft() {
        let backend = FakeBackend::default();
        backend.respond(
            "GET",
            "/api/courses/7",
            json!({
                "id": 7,
                "title": "Rust",
                "categoryId": 3,
                "pricingModel": "Paid",
                "regularPrice": 30.0,
                "sections": [{
                    "id": 1,
                    "title": "Intro",
                    "order": 1,
                    "lectures": [{
                        "id": 2,
                        "name": "Welcome",
                        "contents": [{ "type": "slides", "url": "s.pdf" }]
                    }]
                }]
            }),
        );

        let (builder, dropped) = CourseBuilder::load(&backend, ToastLog::default(), 7)
            .await
            .unwrap();

        assert_eq!(builder.course_id(), Some(7));
        assert_eq!(builder.draft().category_id, "3");
        assert_eq!(builder.draft().regular_price, "30");
        assert_eq!(builder.draft().sale_price, "");
        assert_eq!(builder.draft().curriculum.sections[0].name, "Intro");
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].item.content_type, "slides");
    }
}
