use std::fmt::Debug;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::views::{Action, ViewMode};

/// A course-scoped list the backend serves, and how to mutate it.
pub trait Resource: Serialize + DeserializeOwned + Clone + Debug {
    /// Payload of a create call.
    type New: Serialize + Debug;

    const NAME: &'static str;

    fn id(&self) -> i64;

    fn list_path(course_id: i64) -> String;

    fn create_path() -> &'static str;

    fn delete_path(id: i64) -> String;

    /// Actions a view exposes for `mode`. This only decides what is shown;
    /// the backend decides what is allowed.
    fn actions(mode: ViewMode) -> &'static [Action];
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: i64,

    pub course_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_marks: Option<f64>,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub submissions: Vec<AssignmentSubmission>,
}

impl Assignment {
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.due_date.map_or(false, |due| due < now)
    }

    pub fn submission_by(&self, student_id: i64) -> Option<&AssignmentSubmission> {
        self.submissions
            .iter()
            .find(|submission| submission.student_id == student_id)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentSubmission {
    pub id: i64,

    pub student_id: i64,
    #[serde(default)]
    pub student_name: Option<String>,
    pub file_url: String,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub grade: Option<f64>,
    #[serde(default)]
    pub feedback: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewAssignment {
    pub course_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub total_marks: Option<f64>,
    pub file_url: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAssignment {
    pub assignment_id: i64,
    pub file_url: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GradeSubmission {
    pub submission_id: i64,
    pub grade: f64,
    pub feedback: Option<String>,
}

impl Resource for Assignment {
    type New = NewAssignment;

    const NAME: &'static str = "assignment";

    fn id(&self) -> i64 {
        self.id
    }

    fn list_path(course_id: i64) -> String {
        format!("/api/getCourseAssignments/{course_id}")
    }

    fn create_path() -> &'static str {
        "/api/storeAssignment"
    }

    fn delete_path(id: i64) -> String {
        format!("/api/deleteAssignment/{id}")
    }

    fn actions(mode: ViewMode) -> &'static [Action] {
        match mode {
            ViewMode::Instructor => &[Action::Create, Action::Delete, Action::Grade],
            ViewMode::Student => &[Action::Submit],
        }
    }
}

pub mod assignment_paths {
    pub const SUBMIT: &str = "/api/submitAssignment";
    pub const GRADE: &str = "/api/gradeAssignment";
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: i64,

    pub course_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub time_limit_minutes: Option<u32>,
    #[serde(default)]
    pub questions: Vec<QuizQuestion>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    #[serde(default)]
    pub id: Option<i64>,

    pub text: String,
    pub options: Vec<QuizOption>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct QuizOption {
    pub text: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub correct: bool,
}

/// Payload for `/api/storeQuizInfo`.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct QuizInfo {
    pub course_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub time_limit_minutes: Option<u32>,
    pub questions: Vec<QuizQuestion>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuizAnswer {
    pub question_id: i64,
    pub option_index: usize,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct QuizAttempt {
    pub quiz_id: i64,
    pub answers: Vec<QuizAnswer>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub score: f64,
    pub total: f64,
}

impl Resource for Quiz {
    type New = QuizInfo;

    const NAME: &'static str = "quiz";

    fn id(&self) -> i64 {
        self.id
    }

    fn list_path(course_id: i64) -> String {
        format!("/api/getCourseQuizzes/{course_id}")
    }

    fn create_path() -> &'static str {
        "/api/storeQuizInfo"
    }

    fn delete_path(id: i64) -> String {
        format!("/api/deleteQuiz/{id}")
    }

    fn actions(mode: ViewMode) -> &'static [Action] {
        match mode {
            ViewMode::Instructor => &[Action::Create, Action::Delete],
            ViewMode::Student => &[Action::Attempt],
        }
    }
}

pub mod quiz_paths {
    pub const SUBMIT: &str = "/api/submitQuiz";
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: i64,

    pub course_id: i64,
    pub title: String,
    pub file_url: String,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewDocument {
    pub course_id: i64,
    pub title: String,
    pub file_url: String,
    pub file_name: Option<String>,
}

impl Resource for Document {
    type New = NewDocument;

    const NAME: &'static str = "document";

    fn id(&self) -> i64 {
        self.id
    }

    fn list_path(course_id: i64) -> String {
        format!("/api/getCourseDocuments/{course_id}")
    }

    fn create_path() -> &'static str {
        "/api/storeDocument"
    }

    fn delete_path(id: i64) -> String {
        format!("/api/deleteDocument/{id}")
    }

    fn actions(mode: ViewMode) -> &'static [Action] {
        match mode {
            ViewMode::Instructor => &[Action::Create, Action::Delete, Action::View],
            ViewMode::Student => &[Action::View],
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: i64,

    pub course_id: i64,
    pub title: String,
    pub url: String,
    /// Seconds.
    #[serde(default)]
    pub duration: Option<f64>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewVideo {
    pub course_id: i64,
    pub title: String,
    pub url: String,
    pub duration: Option<f64>,
}

impl Resource for Video {
    type New = NewVideo;

    const NAME: &'static str = "video";

    fn id(&self) -> i64 {
        self.id
    }

    fn list_path(course_id: i64) -> String {
        format!("/api/getCourseVideos/{course_id}")
    }

    fn create_path() -> &'static str {
        "/api/storeVideo"
    }

    fn delete_path(id: i64) -> String {
        format!("/api/deleteVideo/{id}")
    }

    fn actions(mode: ViewMode) -> &'static [Action] {
        match mode {
            ViewMode::Instructor => &[Action::Create, Action::Delete, Action::View],
            ViewMode::Student => &[Action::View],
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LiveClassStatus {
    #[default]
    Scheduled,
    Open,
    Ended,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LiveClass {
    pub id: i64,

    pub course_id: i64,
    pub title: String,
    pub room_name: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: LiveClassStatus,
}

impl LiveClass {
    /// Students may only enter once a moderator has opened the meeting.
    pub fn is_joinable(&self, mode: ViewMode) -> bool {
        match mode {
            ViewMode::Instructor => self.status != LiveClassStatus::Ended,
            ViewMode::Student => self.status == LiveClassStatus::Open,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewLiveClass {
    pub course_id: i64,
    pub title: String,
    pub starts_at: Option<DateTime<Utc>>,
}

impl Resource for LiveClass {
    type New = NewLiveClass;

    const NAME: &'static str = "live class";

    fn id(&self) -> i64 {
        self.id
    }

    fn list_path(course_id: i64) -> String {
        format!("/api/getCourseLiveClasses/{course_id}")
    }

    fn create_path() -> &'static str {
        "/api/storeLiveClass"
    }

    fn delete_path(id: i64) -> String {
        format!("/api/deleteLiveClass/{id}")
    }

    fn actions(mode: ViewMode) -> &'static [Action] {
        match mode {
            ViewMode::Instructor => &[
                Action::Create,
                Action::Delete,
                Action::Join,
                Action::Open,
                Action::End,
            ],
            ViewMode::Student => &[Action::Join],
        }
    }
}

pub mod live_class_paths {
    pub fn open(id: i64) -> String {
        format!("/api/openLiveClass/{id}")
    }

    pub fn end(id: i64) -> String {
        format!("/api/endLiveClass/{id}")
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Discussion {
    pub id: i64,

    pub course_id: i64,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub replies: Vec<DiscussionReply>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DiscussionReply {
    pub id: i64,

    pub body: String,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewDiscussion {
    pub course_id: i64,
    pub title: String,
    pub body: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewReply {
    pub discussion_id: i64,
    pub body: String,
}

impl Resource for Discussion {
    type New = NewDiscussion;

    const NAME: &'static str = "discussion";

    fn id(&self) -> i64 {
        self.id
    }

    fn list_path(course_id: i64) -> String {
        format!("/api/getCourseDiscussions/{course_id}")
    }

    fn create_path() -> &'static str {
        "/api/storeDiscussion"
    }

    fn delete_path(id: i64) -> String {
        format!("/api/deleteDiscussion/{id}")
    }

    fn actions(mode: ViewMode) -> &'static [Action] {
        match mode {
            ViewMode::Instructor => &[Action::Create, Action::Delete, Action::Reply],
            ViewMode::Student => &[Action::Create, Action::Reply],
        }
    }
}

pub mod discussion_paths {
    pub const REPLY: &str = "/api/replyDiscussion";
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub id: i64,

    pub course_id: i64,
    #[serde(default)]
    pub user_name: Option<String>,
    pub stars: u8,
    #[serde(default)]
    pub review: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewRating {
    pub course_id: i64,
    pub stars: u8,
    pub review: Option<String>,
}

impl NewRating {
    pub fn check(&self) -> Result<()> {
        if !(1..=5).contains(&self.stars) {
            return Err(Error::InvalidInput(format!(
                "A rating is 1 to 5 stars, got {}",
                self.stars
            )));
        }

        Ok(())
    }
}

/// Aggregate shown above a course's reviews.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RatingSummary {
    pub average: f64,
    pub count: usize,
    /// `histogram[0]` counts one-star ratings, `histogram[4]` five-star.
    pub histogram: [usize; 5],
}

impl RatingSummary {
    pub fn from_ratings(ratings: &[Rating]) -> Self {
        let mut histogram = [0; 5];
        let mut total = 0u32;
        let mut count = 0usize;

        for rating in ratings.iter().filter(|rating| (1..=5).contains(&rating.stars)) {
            histogram[usize::from(rating.stars - 1)] += 1;
            total += u32::from(rating.stars);
            count += 1;
        }

        let average = if count == 0 {
            0.0
        } else {
            f64::from(total) / count as f64
        };

        Self {
            average,
            count,
            histogram,
        }
    }
}

impl Resource for Rating {
    type New = NewRating;

    const NAME: &'static str = "rating";

    fn id(&self) -> i64 {
        self.id
    }

    fn list_path(course_id: i64) -> String {
        format!("/api/getCourseRatings/{course_id}")
    }

    fn create_path() -> &'static str {
        "/api/storeRating"
    }

    fn delete_path(id: i64) -> String {
        format!("/api/deleteRating/{id}")
    }

    fn actions(mode: ViewMode) -> &'static [Action] {
        match mode {
            ViewMode::Instructor => &[Action::Delete],
            ViewMode::Student => &[Action::Rate],
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: i64,

    pub name: String,
}
