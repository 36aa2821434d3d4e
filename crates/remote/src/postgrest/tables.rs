//! Repository trait implementations over the PostgREST table endpoints.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use easel_core::model::{
    Challenge, ChallengeId, ChallengeProgress, Drawing, DrawingPrompt, Exercise, ExerciseId,
    ExerciseProgress, ExerciseSubmission, Lesson, LessonId, LessonNote, NewChallengeSubmission,
    NewDrawing, NewExercise, NewLesson, NewPrompt, NewSubmission, ProfilePatch, UserActivity,
    UserDrawing, UserId, UserProfile, WarmupCandidate,
};
use easel_core::progress::CategorizedUnit;

use crate::postgrest::{error_from_response, Query, RestRemote};
use crate::repository::{
    ActivityRepository, ChallengeRepository, DrawingRepository, ExerciseRepository,
    LessonNoteRepository, LessonRepository, ProfileRepository, RemoteError,
};

const LESSONS: &str = "lessons";
const LESSON_NOTES: &str = "lesson_notes";
const EXERCISES: &str = "exercises";
const EXERCISE_PROGRESS: &str = "user_exercise_progress";
const EXERCISE_SUBMISSIONS: &str = "exercise_submissions";
const CHALLENGES: &str = "challenges";
const CHALLENGE_PROGRESS: &str = "user_challenge_progress";
const CHALLENGE_SUBMISSIONS: &str = "challenge_submissions";
const PROMPTS: &str = "drawing_prompts";
const DRAWINGS: &str = "free_drawings";
const PROFILES: &str = "user_profiles";
const ACTIVITY: &str = "user_activity";

fn transport(e: reqwest::Error) -> RemoteError {
    RemoteError::Operation(e.to_string())
}

impl RestRemote {
    async fn rows<T: DeserializeOwned>(&self, query: Query) -> Result<Vec<T>, RemoteError> {
        let response = self
            .request(Method::GET, self.table_url(query.name()))
            .query(query.params())
            .send()
            .await
            .map_err(transport)?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        response.json().await.map_err(transport)
    }

    async fn maybe_one<T: DeserializeOwned>(&self, query: Query) -> Result<Option<T>, RemoteError> {
        let mut rows: Vec<T> = self.rows(query.limit(1)).await?;
        Ok(rows.pop())
    }

    async fn one<T: DeserializeOwned>(&self, query: Query) -> Result<T, RemoteError> {
        self.maybe_one(query).await?.ok_or(RemoteError::NotFound)
    }

    async fn insert_returning<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        table: &'static str,
        body: &B,
    ) -> Result<T, RemoteError> {
        let response = self
            .request(Method::POST, self.table_url(table))
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await
            .map_err(transport)?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        let mut rows: Vec<T> = response.json().await.map_err(transport)?;
        rows.pop().ok_or(RemoteError::NotFound)
    }

    async fn insert_void<B: Serialize + Sync>(
        &self,
        table: &'static str,
        body: &B,
    ) -> Result<(), RemoteError> {
        let response = self
            .request(Method::POST, self.table_url(table))
            .header("Prefer", "return=minimal")
            .json(body)
            .send()
            .await
            .map_err(transport)?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(error_from_response(response).await)
        }
    }

    async fn upsert_void<B: Serialize + Sync>(
        &self,
        table: &'static str,
        on_conflict: &str,
        body: &B,
    ) -> Result<(), RemoteError> {
        let response = self
            .request(Method::POST, self.table_url(table))
            .query(&[("on_conflict", on_conflict)])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(body)
            .send()
            .await
            .map_err(transport)?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(error_from_response(response).await)
        }
    }

    async fn update_returning<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        query: Query,
        patch: &B,
    ) -> Result<T, RemoteError> {
        let response = self
            .request(Method::PATCH, self.table_url(query.name()))
            .query(&query.filter_params())
            .header("Prefer", "return=representation")
            .json(patch)
            .send()
            .await
            .map_err(transport)?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        let mut rows: Vec<T> = response.json().await.map_err(transport)?;
        rows.pop().ok_or(RemoteError::NotFound)
    }

    async fn delete_where(&self, query: Query) -> Result<(), RemoteError> {
        let response = self
            .request(Method::DELETE, self.table_url(query.name()))
            .query(&query.filter_params())
            .send()
            .await
            .map_err(transport)?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(error_from_response(response).await)
        }
    }
}

#[async_trait]
impl LessonRepository for RestRemote {
    async fn list_lessons(&self) -> Result<Vec<Lesson>, RemoteError> {
        self.rows(Query::table(LESSONS).order_asc("order_number"))
            .await
    }

    async fn get_lesson(&self, id: LessonId) -> Result<Lesson, RemoteError> {
        self.one(Query::table(LESSONS).eq("id", id)).await
    }

    async fn insert_lesson(&self, draft: &NewLesson) -> Result<Lesson, RemoteError> {
        self.insert_returning(LESSONS, draft).await
    }
}

#[async_trait]
impl LessonNoteRepository for RestRemote {
    async fn get_note(
        &self,
        user: UserId,
        lesson: LessonId,
    ) -> Result<Option<LessonNote>, RemoteError> {
        self.maybe_one(
            Query::table(LESSON_NOTES)
                .eq("user_id", user)
                .eq("lesson_id", lesson),
        )
        .await
    }

    async fn insert_note(&self, note: &LessonNote) -> Result<LessonNote, RemoteError> {
        let body = serde_json::json!({
            "user_id": note.user_id,
            "lesson_id": note.lesson_id,
            "notes": note.notes,
            "reflection": note.reflection,
            "created_at": note.created_at,
            "updated_at": note.updated_at,
        });
        self.insert_returning(LESSON_NOTES, &body).await
    }

    async fn update_note(&self, note: &LessonNote) -> Result<LessonNote, RemoteError> {
        let patch = serde_json::json!({
            "notes": note.notes,
            "reflection": note.reflection,
            "updated_at": note.updated_at,
        });
        self.update_returning(
            Query::table(LESSON_NOTES)
                .eq("user_id", note.user_id)
                .eq("lesson_id", note.lesson_id),
            &patch,
        )
        .await
    }

    async fn delete_note(&self, user: UserId, lesson: LessonId) -> Result<(), RemoteError> {
        self.delete_where(
            Query::table(LESSON_NOTES)
                .eq("user_id", user)
                .eq("lesson_id", lesson),
        )
        .await
    }

    async fn delete_user_data(&self, user: UserId) -> Result<(), RemoteError> {
        self.delete_where(Query::table(LESSON_NOTES).eq("user_id", user))
            .await
    }
}

#[derive(Debug, Deserialize)]
struct CategorizedRow {
    id: ExerciseId,
    category: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletedLessonRow {
    exercises: Option<LessonRef>,
}

#[derive(Debug, Deserialize)]
struct LessonRef {
    lesson_id: LessonId,
}

#[derive(Debug, Deserialize)]
struct WarmupRow {
    #[serde(flatten)]
    progress: ExerciseProgress,
    exercises: Exercise,
}

#[async_trait]
impl ExerciseRepository for RestRemote {
    async fn list_for_lesson(&self, lesson: LessonId) -> Result<Vec<Exercise>, RemoteError> {
        self.rows(
            Query::table(EXERCISES)
                .eq("lesson_id", lesson)
                .order_asc("order_number"),
        )
        .await
    }

    async fn get_exercise(&self, id: ExerciseId) -> Result<Exercise, RemoteError> {
        self.one(Query::table(EXERCISES).eq("id", id)).await
    }

    async fn insert_exercise(&self, draft: &NewExercise) -> Result<Exercise, RemoteError> {
        self.insert_returning(EXERCISES, draft).await
    }

    async fn categorized(&self) -> Result<Vec<CategorizedUnit>, RemoteError> {
        let rows: Vec<CategorizedRow> = self
            .rows(Query::table(EXERCISES).select("id,category"))
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| CategorizedUnit {
                id: row.id.value(),
                category: row.category,
            })
            .collect())
    }

    async fn insert_submission(
        &self,
        user: UserId,
        draft: &NewSubmission,
        created_at: DateTime<Utc>,
    ) -> Result<ExerciseSubmission, RemoteError> {
        let body = serde_json::json!({
            "user_id": user,
            "exercise_id": draft.exercise_id(),
            "image_url": draft.image_url(),
            "notes": draft.notes(),
            "self_rating": draft.self_rating(),
            "created_at": created_at,
        });
        self.insert_returning(EXERCISE_SUBMISSIONS, &body).await
    }

    async fn get_progress(
        &self,
        user: UserId,
        exercise: ExerciseId,
    ) -> Result<Option<ExerciseProgress>, RemoteError> {
        self.maybe_one(
            Query::table(EXERCISE_PROGRESS)
                .eq("user_id", user)
                .eq("exercise_id", exercise),
        )
        .await
    }

    async fn upsert_progress(&self, progress: &ExerciseProgress) -> Result<(), RemoteError> {
        self.upsert_void(EXERCISE_PROGRESS, "user_id,exercise_id", progress)
            .await
    }

    async fn completed_for_user(
        &self,
        user: UserId,
    ) -> Result<Vec<ExerciseProgress>, RemoteError> {
        self.rows(
            Query::table(EXERCISE_PROGRESS)
                .eq("user_id", user)
                .eq("status", "completed")
                .order_desc("completed_at"),
        )
        .await
    }

    async fn completed_lesson_ids(&self, user: UserId) -> Result<Vec<LessonId>, RemoteError> {
        let rows: Vec<CompletedLessonRow> = self
            .rows(
                Query::table(EXERCISE_PROGRESS)
                    .select("exercise_id,exercises(lesson_id)")
                    .eq("user_id", user)
                    .eq("status", "completed"),
            )
            .await?;
        let mut lesson_ids: Vec<LessonId> = rows
            .into_iter()
            .filter_map(|row| row.exercises.map(|e| e.lesson_id))
            .collect();
        lesson_ids.sort();
        lesson_ids.dedup();
        Ok(lesson_ids)
    }

    async fn warmup_candidates(
        &self,
        user: UserId,
    ) -> Result<Vec<WarmupCandidate>, RemoteError> {
        let rows: Vec<WarmupRow> = self
            .rows(
                Query::table(EXERCISE_PROGRESS)
                    .select("*,exercises(*)")
                    .eq("user_id", user)
                    .eq("status", "completed")
                    .eq("exercises.is_warmup_eligible", true)
                    .order_asc("warmup_count")
                    .order_asc("last_used_as_warmup"),
            )
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| WarmupCandidate {
                progress: row.progress,
                exercise: row.exercises,
            })
            .collect())
    }

    async fn delete_user_data(&self, user: UserId) -> Result<(), RemoteError> {
        self.delete_where(Query::table(EXERCISE_SUBMISSIONS).eq("user_id", user))
            .await?;
        self.delete_where(Query::table(EXERCISE_PROGRESS).eq("user_id", user))
            .await
    }
}

#[derive(Debug, Deserialize)]
struct ActiveChallengeRow {
    #[serde(flatten)]
    progress: ChallengeProgress,
    challenges: Challenge,
}

#[async_trait]
impl ChallengeRepository for RestRemote {
    async fn list_challenges(&self) -> Result<Vec<Challenge>, RemoteError> {
        self.rows(Query::table(CHALLENGES).order_asc("order_number"))
            .await
    }

    async fn get_challenge(&self, id: ChallengeId) -> Result<Challenge, RemoteError> {
        self.one(Query::table(CHALLENGES).eq("id", id)).await
    }

    async fn get_progress(
        &self,
        user: UserId,
        challenge: ChallengeId,
    ) -> Result<Option<ChallengeProgress>, RemoteError> {
        self.maybe_one(
            Query::table(CHALLENGE_PROGRESS)
                .eq("user_id", user)
                .eq("challenge_id", challenge),
        )
        .await
    }

    async fn insert_progress(
        &self,
        progress: &ChallengeProgress,
    ) -> Result<ChallengeProgress, RemoteError> {
        self.insert_returning(CHALLENGE_PROGRESS, progress).await
    }

    async fn upsert_progress(&self, progress: &ChallengeProgress) -> Result<(), RemoteError> {
        self.upsert_void(CHALLENGE_PROGRESS, "user_id,challenge_id", progress)
            .await
    }

    async fn insert_submission(
        &self,
        user: UserId,
        draft: &NewChallengeSubmission,
        created_at: DateTime<Utc>,
    ) -> Result<(), RemoteError> {
        let body = serde_json::json!({
            "user_id": user,
            "challenge_id": draft.challenge_id(),
            "count": draft.count(),
            "image_url": draft.image_url(),
            "notes": draft.notes(),
            "created_at": created_at,
        });
        self.insert_void(CHALLENGE_SUBMISSIONS, &body).await
    }

    async fn completed_for_user(
        &self,
        user: UserId,
    ) -> Result<Vec<ChallengeProgress>, RemoteError> {
        self.rows(
            Query::table(CHALLENGE_PROGRESS)
                .eq("user_id", user)
                .eq("status", "completed"),
        )
        .await
    }

    async fn active_for_user(
        &self,
        user: UserId,
    ) -> Result<Vec<(ChallengeProgress, Challenge)>, RemoteError> {
        let rows: Vec<ActiveChallengeRow> = self
            .rows(
                Query::table(CHALLENGE_PROGRESS)
                    .select("*,challenges(*)")
                    .eq("user_id", user)
                    .eq("status", "in_progress"),
            )
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| (row.progress, row.challenges))
            .collect())
    }

    async fn delete_user_data(&self, user: UserId) -> Result<(), RemoteError> {
        self.delete_where(Query::table(CHALLENGE_SUBMISSIONS).eq("user_id", user))
            .await?;
        self.delete_where(Query::table(CHALLENGE_PROGRESS).eq("user_id", user))
            .await
    }
}

#[derive(Debug, Deserialize)]
struct UserDrawingRow {
    #[serde(flatten)]
    drawing: Drawing,
    drawing_prompts: Option<DrawingPrompt>,
}

#[async_trait]
impl DrawingRepository for RestRemote {
    async fn list_prompts(&self) -> Result<Vec<DrawingPrompt>, RemoteError> {
        self.rows(Query::table(PROMPTS).order_desc("created_at"))
            .await
    }

    async fn insert_prompt(
        &self,
        user: UserId,
        draft: &NewPrompt,
        created_at: DateTime<Utc>,
    ) -> Result<DrawingPrompt, RemoteError> {
        let body = serde_json::json!({
            "user_id": user,
            "prompt_text": draft.prompt_text(),
            "category": draft.category(),
            "created_at": created_at,
            "updated_at": created_at,
        });
        self.insert_returning(PROMPTS, &body).await
    }

    async fn insert_drawing(
        &self,
        user: UserId,
        draft: &NewDrawing,
        created_at: DateTime<Utc>,
    ) -> Result<Drawing, RemoteError> {
        let body = serde_json::json!({
            "user_id": user,
            "image_url": draft.image_url(),
            "time_spent_minutes": draft.time_spent_minutes(),
            "notes": draft.notes(),
            "prompt_id": draft.prompt_id(),
            "created_at": created_at,
            "updated_at": created_at,
        });
        self.insert_returning(DRAWINGS, &body).await
    }

    async fn drawings_for_user(&self, user: UserId) -> Result<Vec<UserDrawing>, RemoteError> {
        let rows: Vec<UserDrawingRow> = self
            .rows(
                Query::table(DRAWINGS)
                    .select("*,drawing_prompts(*)")
                    .eq("user_id", user)
                    .order_desc("created_at"),
            )
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| UserDrawing {
                drawing: row.drawing,
                prompt: row.drawing_prompts,
            })
            .collect())
    }

    async fn delete_user_data(&self, user: UserId) -> Result<(), RemoteError> {
        self.delete_where(Query::table(DRAWINGS).eq("user_id", user))
            .await?;
        self.delete_where(Query::table(PROMPTS).eq("user_id", user))
            .await
    }
}

#[async_trait]
impl ProfileRepository for RestRemote {
    async fn get_profile(&self, user: UserId) -> Result<Option<UserProfile>, RemoteError> {
        self.maybe_one(Query::table(PROFILES).eq("id", user)).await
    }

    async fn insert_profile(&self, profile: &UserProfile) -> Result<UserProfile, RemoteError> {
        self.insert_returning(PROFILES, profile).await
    }

    async fn update_profile(
        &self,
        user: UserId,
        patch: &ProfilePatch,
        updated_at: DateTime<Utc>,
    ) -> Result<UserProfile, RemoteError> {
        let mut body = serde_json::to_value(patch)
            .map_err(|e| RemoteError::Operation(e.to_string()))?;
        if let Some(fields) = body.as_object_mut() {
            fields.insert(
                "updated_at".into(),
                serde_json::to_value(updated_at)
                    .map_err(|e| RemoteError::Operation(e.to_string()))?,
            );
        }
        self.update_returning(Query::table(PROFILES).eq("id", user), &body)
            .await
    }

    async fn delete_profile(&self, user: UserId) -> Result<(), RemoteError> {
        self.delete_where(Query::table(PROFILES).eq("id", user)).await
    }
}

#[async_trait]
impl ActivityRepository for RestRemote {
    async fn recent_for_user(
        &self,
        user: UserId,
        limit: u32,
    ) -> Result<Vec<UserActivity>, RemoteError> {
        self.rows(
            Query::table(ACTIVITY)
                .eq("user_id", user)
                .order_desc("created_at")
                .limit(limit),
        )
        .await
    }

    async fn list_for_user(&self, user: UserId) -> Result<Vec<UserActivity>, RemoteError> {
        self.rows(Query::table(ACTIVITY).eq("user_id", user)).await
    }

    async fn delete_user_data(&self, user: UserId) -> Result<(), RemoteError> {
        self.delete_where(Query::table(ACTIVITY).eq("user_id", user))
            .await
    }
}
