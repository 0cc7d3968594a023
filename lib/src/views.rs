use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;

use crate::backend::{paths, Backend};
use crate::builder::CourseRecord;
use crate::error::{Error, Result};
use crate::notify::{Notifier, Toast};
use crate::resources::{
    assignment_paths, discussion_paths, live_class_paths, quiz_paths, Assignment, Discussion,
    Document, GradeSubmission, LiveClass, NewRating, NewReply, Quiz, QuizAttempt, QuizInfo,
    QuizResult, Rating, RatingSummary, Resource, SubmitAssignment, Topic,
};
use crate::session::{Session, INSTRUCTOR_ROLE_ID};

/// Which face of a view is rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewMode {
    Instructor,
    Student,
}

impl ViewMode {
    pub fn for_role(role_id: i64) -> Self {
        if role_id == INSTRUCTOR_ROLE_ID {
            Self::Instructor
        } else {
            Self::Student
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Create,
    Delete,
    Grade,
    Submit,
    Attempt,
    Reply,
    Rate,
    Join,
    Open,
    End,
    View,
}

/// Lifetime of a mounted view. Clones share it, so whoever owns the screen
/// can unmount while a request is in flight.
#[derive(Clone, Debug)]
pub struct ViewScope {
    unmounted: Arc<watch::Sender<bool>>,
}

impl Default for ViewScope {
    fn default() -> Self {
        let (unmounted, _) = watch::channel(false);

        Self {
            unmounted: Arc::new(unmounted),
        }
    }
}

impl ViewScope {
    pub fn unmount(&self) {
        self.unmounted.send_replace(true);
    }

    pub fn is_unmounted(&self) -> bool {
        *self.unmounted.borrow()
    }

    /// Runs `request` unless the view unmounts first. A response that lands
    /// after unmounting is discarded.
    pub async fn run<T, F>(&self, request: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let mut unmounted = self.unmounted.subscribe();

        if *unmounted.borrow_and_update() {
            return Err(Error::Cancelled);
        }

        tokio::select! {
            result = request => {
                if self.is_unmounted() {
                    Err(Error::Cancelled)
                } else {
                    result
                }
            }
            _ = wait_for_unmount(&mut unmounted) => Err(Error::Cancelled),
        }
    }
}

async fn wait_for_unmount(unmounted: &mut watch::Receiver<bool>) {
    loop {
        if *unmounted.borrow_and_update() {
            return;
        }

        if unmounted.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// A course-scoped list with its mutations. Every mutation is followed by a
/// full re-fetch; a failure keeps the previous list and shows a toast.
pub struct ResourceView<R, B, N> {
    backend: B,
    notifier: N,
    course_id: i64,
    mode: ViewMode,
    scope: ViewScope,
    items: Vec<R>,
    loaded: bool,
}

impl<R, B, N> ResourceView<R, B, N>
where
    R: Resource,
    B: Backend,
    N: Notifier,
{
    pub fn new(backend: B, notifier: N, session: &Session, course_id: i64) -> Self {
        Self {
            backend,
            notifier,
            course_id,
            mode: ViewMode::for_role(session.user.role_id),
            scope: ViewScope::default(),
            items: Vec::new(),
            loaded: false,
        }
    }

    pub fn items(&self) -> &[R] {
        &self.items
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn course_id(&self) -> i64 {
        self.course_id
    }

    pub fn scope(&self) -> ViewScope {
        self.scope.clone()
    }

    pub fn allowed_actions(&self) -> &'static [Action] {
        R::actions(self.mode)
    }

    pub fn can(&self, action: Action) -> bool {
        self.allowed_actions().contains(&action)
    }

    pub fn find(&self, id: i64) -> Option<&R> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Fetches the list for the course.
    pub async fn load(&mut self) -> Result<()> {
        let path = R::list_path(self.course_id);
        let fetched = self.scope.run(self.backend.get::<Vec<R>>(&path)).await;

        match fetched {
            Ok(items) => {
                tracing::debug!(kind = R::NAME, count = items.len(), "list loaded");
                self.items = items;
                self.loaded = true;

                Ok(())
            }
            Err(err) => {
                self.notifier.failure(&err);

                Err(err)
            }
        }
    }

    pub async fn create(&mut self, item: &R::New) -> Result<()> {
        let sent = self
            .scope
            .run(self.backend.post::<_, Value>(R::create_path(), item))
            .await
            .map(drop);

        self.refresh_after(sent, format!("{} created", capitalized(R::NAME)))
            .await
    }

    pub async fn delete(&mut self, id: i64) -> Result<()> {
        let sent = self.scope.run(self.backend.delete(&R::delete_path(id))).await;

        self.refresh_after(sent, format!("{} deleted", capitalized(R::NAME)))
            .await
    }

    async fn post_and_refresh<T>(&mut self, path: &str, body: &T, success: &str) -> Result<()>
    where
        T: serde::Serialize + ?Sized,
    {
        let sent = self
            .scope
            .run(self.backend.post::<_, Value>(path, body))
            .await
            .map(drop);

        self.refresh_after(sent, success.to_owned()).await
    }

    async fn refresh_after(&mut self, sent: Result<()>, success: String) -> Result<()> {
        if let Err(err) = sent {
            self.notifier.failure(&err);

            return Err(err);
        }

        self.notifier.notify(Toast::success(success));
        self.load().await
    }
}

fn capitalized(name: &str) -> String {
    let mut chars = name.chars();

    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl<B: Backend, N: Notifier> ResourceView<Assignment, B, N> {
    pub async fn submit(&mut self, submission: &SubmitAssignment) -> Result<()> {
        self.post_and_refresh(assignment_paths::SUBMIT, submission, "Assignment submitted")
            .await
    }

    pub async fn grade(&mut self, grade: &GradeSubmission) -> Result<()> {
        self.post_and_refresh(assignment_paths::GRADE, grade, "Submission graded")
            .await
    }
}

impl<B: Backend, N: Notifier> ResourceView<Quiz, B, N> {
    pub async fn store_quiz_info(&mut self, info: &QuizInfo) -> Result<()> {
        self.create(info).await
    }

    /// Posts the attempt, then re-fetches the list. A failed re-fetch is
    /// toasted but does not lose the score.
    pub async fn submit_attempt(&mut self, attempt: &QuizAttempt) -> Result<QuizResult> {
        let result = self
            .scope
            .run(self.backend.post::<_, QuizResult>(quiz_paths::SUBMIT, attempt))
            .await;

        match result {
            Ok(result) => {
                self.notifier.notify(Toast::success(format!(
                    "You scored {} out of {}",
                    result.score, result.total
                )));

                if let Err(err) = self.load().await {
                    tracing::warn!(quiz_id = attempt.quiz_id, %err, "quiz list not refreshed");
                }

                Ok(result)
            }
            Err(err) => {
                self.notifier.failure(&err);

                Err(err)
            }
        }
    }
}

impl<B: Backend, N: Notifier> ResourceView<LiveClass, B, N> {
    pub async fn open(&mut self, id: i64) -> Result<()> {
        self.post_and_refresh(&live_class_paths::open(id), &Value::Null, "Class opened for students")
            .await
    }

    pub async fn end(&mut self, id: i64) -> Result<()> {
        self.post_and_refresh(&live_class_paths::end(id), &Value::Null, "Class ended")
            .await
    }
}

impl<B: Backend, N: Notifier> ResourceView<Discussion, B, N> {
    pub async fn reply(&mut self, reply: &NewReply) -> Result<()> {
        self.post_and_refresh(discussion_paths::REPLY, reply, "Reply posted")
            .await
    }
}

impl<B: Backend, N: Notifier> ResourceView<Rating, B, N> {
    pub async fn rate(&mut self, rating: &NewRating) -> Result<()> {
        if let Err(err) = rating.check() {
            self.notifier.failure(&err);

            return Err(err);
        }

        self.create(rating).await
    }

    pub fn summary(&self) -> RatingSummary {
        RatingSummary::from_ratings(&self.items)
    }
}

/// Course landing screen: details, documents and topics, fetched together.
/// A part that fails stays empty while the others render.
#[derive(Clone, Debug, Default)]
pub struct CourseOverview {
    pub course: Option<CourseRecord>,
    pub documents: Vec<Document>,
    pub topics: Vec<Topic>,
}

impl CourseOverview {
    pub async fn load<B, N>(backend: &B, notifier: &N, scope: &ViewScope, course_id: i64) -> Self
    where
        B: Backend,
        N: Notifier,
    {
        let course_path = paths::course(course_id);
        let documents_path = Document::list_path(course_id);
        let topics_path = paths::course_topics(course_id);

        let (course, documents, topics) = tokio::join!(
            scope.run(backend.get::<CourseRecord>(&course_path)),
            scope.run(backend.get::<Vec<Document>>(&documents_path)),
            scope.run(backend.get::<Vec<Topic>>(&topics_path)),
        );

        Self {
            course: settle(notifier, course),
            documents: settle(notifier, documents).unwrap_or_default(),
            topics: settle(notifier, topics).unwrap_or_default(),
        }
    }
}

fn settle<T, N: Notifier>(notifier: &N, result: Result<T>) -> Option<T> {
    result.map_err(|err| notifier.failure(&err)).ok()
}
