use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;

use easel_core::model::{
    Exercise, ExerciseId, ExerciseProgress, ExerciseSubmission, LessonId, NewExercise,
    NewSubmission, WarmupCandidate,
};
use easel_core::progress::{
    category_progress, completion_percentage, completion_streak, monthly_completions,
    CategorizedUnit, CategoryCount, CompletionRecord, MonthlyBucket, StreakState,
};
use services::ExerciseService;

use crate::result::{StoreResult, StoreState};

/// Exercise state for the opened lesson plus the user's tracking data, with
/// the derived dashboard views computed over it on demand.
pub struct ExercisesStore {
    service: Arc<ExerciseService>,
    state: StoreState,
    exercises: Vec<Exercise>,
    current: Option<Exercise>,
    warmup_queue: Vec<WarmupCandidate>,
    completed: Vec<ExerciseProgress>,
    units: Vec<CategorizedUnit>,
}

impl ExercisesStore {
    #[must_use]
    pub fn new(service: Arc<ExerciseService>) -> Self {
        Self {
            service,
            state: StoreState::default(),
            exercises: Vec::new(),
            current: None,
            warmup_queue: Vec::new(),
            completed: Vec::new(),
            units: Vec::new(),
        }
    }

    /// Fetch the exercises of one lesson.
    pub async fn load_for_lesson(&mut self, lesson: LessonId) -> StoreResult<()> {
        self.state.begin();
        match self.service.exercises_for_lesson(lesson).await {
            Ok(exercises) => {
                self.exercises = exercises;
                self.state.finish_ok(())
            }
            Err(e) => self.state.finish_err(e),
        }
    }

    /// Open one exercise.
    pub async fn open_exercise(&mut self, id: ExerciseId) -> StoreResult<()> {
        self.state.begin();
        match self.service.get_exercise(id).await {
            Ok(exercise) => {
                self.current = Some(exercise);
                self.state.finish_ok(())
            }
            Err(e) => self.state.finish_err(e),
        }
    }

    /// Add an exercise to the catalog and to the loaded list when it belongs
    /// to the same lesson.
    pub async fn add_exercise(&mut self, draft: NewExercise) -> StoreResult<Exercise> {
        self.state.begin();
        match self.service.add_exercise(draft).await {
            Ok(exercise) => {
                let same_lesson = self
                    .exercises
                    .first()
                    .is_none_or(|e| e.lesson_id == exercise.lesson_id);
                if same_lesson {
                    self.exercises.push(exercise.clone());
                    self.exercises.sort_by_key(|e| e.order_number);
                }
                self.state.finish_ok(exercise)
            }
            Err(e) => self.state.finish_err(e),
        }
    }

    /// Fetch the warmup queue.
    pub async fn load_warmup_queue(&mut self) -> StoreResult<()> {
        self.state.begin();
        match self.service.warmup_queue().await {
            Ok(queue) => {
                self.warmup_queue = queue;
                self.state.finish_ok(())
            }
            Err(e) => self.state.finish_err(e),
        }
    }

    /// Record a warmup use and refresh the queue ordering.
    pub async fn record_warmup_use(&mut self, exercise: ExerciseId) -> StoreResult<()> {
        self.state.begin();
        if let Err(e) = self.service.record_warmup_use(exercise).await {
            return self.state.finish_err(e);
        }
        match self.service.warmup_queue().await {
            Ok(queue) => {
                self.warmup_queue = queue;
                self.state.finish_ok(())
            }
            Err(e) => self.state.finish_err(e),
        }
    }

    /// Submit work for an exercise; on success the completed records are
    /// refreshed so the derived views see the new completion.
    pub async fn submit(&mut self, draft: NewSubmission) -> StoreResult<ExerciseSubmission> {
        self.state.begin();
        let submission = match self.service.submit(draft).await {
            Ok(submission) => submission,
            Err(e) => return self.state.finish_err(e),
        };
        match self.service.completed().await {
            Ok(completed) => {
                self.completed = completed;
                self.state.finish_ok(submission)
            }
            Err(e) => self.state.finish_err(e),
        }
    }

    /// Fetch everything the tracking dashboard needs. The two independent
    /// reads go out concurrently.
    pub async fn load_tracking_data(&mut self) -> StoreResult<()> {
        self.state.begin();
        let (completed, units) =
            tokio::join!(self.service.completed(), self.service.categorized_units());
        let completed = match completed {
            Ok(rows) => rows,
            Err(e) => return self.state.finish_err(e),
        };
        match units {
            Ok(units) => {
                self.completed = completed;
                self.units = units;
                self.state.finish_ok(())
            }
            Err(e) => self.state.finish_err(e),
        }
    }

    #[must_use]
    pub fn exercises(&self) -> &[Exercise] {
        &self.exercises
    }

    #[must_use]
    pub fn current_exercise(&self) -> Option<&Exercise> {
        self.current.as_ref()
    }

    #[must_use]
    pub fn warmup_queue(&self) -> &[WarmupCandidate] {
        &self.warmup_queue
    }

    #[must_use]
    pub fn completed(&self) -> &[ExerciseProgress] {
        &self.completed
    }

    /// The five most recent completions (records are kept newest first).
    #[must_use]
    pub fn recent_completed(&self) -> &[ExerciseProgress] {
        &self.completed[..self.completed.len().min(5)]
    }

    fn completed_ids(&self) -> BTreeSet<u64> {
        self.completed
            .iter()
            .map(|row| row.exercise_id.value())
            .collect()
    }

    fn completion_records(&self) -> Vec<CompletionRecord> {
        self.completed.iter().map(CompletionRecord::from).collect()
    }

    /// Share of all known exercises the user has completed, as a rounded
    /// whole percentage.
    #[must_use]
    pub fn completion_percentage(&self) -> u32 {
        completion_percentage(self.completed_ids().len(), self.units.len())
    }

    /// Consecutive-day completion streak as of `today`.
    #[must_use]
    pub fn streak(&self, today: NaiveDate) -> StreakState {
        completion_streak(&self.completion_records(), today)
    }

    /// Completions bucketed by month over a trailing window ending at
    /// `reference`.
    #[must_use]
    pub fn monthly_activity(&self, window_months: u32, reference: NaiveDate) -> Vec<MonthlyBucket> {
        monthly_completions(&self.completion_records(), window_months, reference)
    }

    /// Per-category completed/total counts.
    #[must_use]
    pub fn category_progress(&self) -> Vec<CategoryCount> {
        category_progress(&self.units, &self.completed_ids())
    }

    #[must_use]
    pub fn busy(&self) -> bool {
        self.state.busy()
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.state.last_error()
    }
}
