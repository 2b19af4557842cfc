mod common;

use std::sync::Arc;

use common::{FakeGenerator, flaky_storage, material};
use services::{PersistenceMirror, QuizPhase, QuizSession, QuizSessionError};
use storage::Storage;
use study_core::model::{GradeBand, QuestionId, UserId};
use study_core::score;
use study_core::time::fixed_clock;

fn session(generator: Arc<FakeGenerator>, mirror: PersistenceMirror) -> QuizSession {
    QuizSession::new(material(), generator, mirror, fixed_clock())
}

async fn started(mirror: PersistenceMirror) -> (QuizSession, Vec<QuestionId>) {
    let mut session = session(FakeGenerator::new(), mirror);
    let quiz = session.generate().await.unwrap();
    let ids = quiz.questions().iter().map(|q| q.id().clone()).collect();
    (session, ids)
}

fn answer_all(session: &mut QuizSession, ids: &[QuestionId]) {
    session.answer(&ids[0], "Mitochondria").unwrap();
    session.answer(&ids[1], true).unwrap();
    session
        .answer(&ids[2], "mitochondria is the powerhouse")
        .unwrap();
}

#[tokio::test]
async fn next_is_rejected_while_current_is_unanswered() {
    let (mut session, _) = started(PersistenceMirror::disabled()).await;
    assert_eq!(session.current_index(), Some(0));

    let err = session.next().unwrap_err();
    assert!(matches!(err, QuizSessionError::CurrentUnanswered));
    assert_eq!(session.current_index(), Some(0));

    session.answer_current("Nucleus").unwrap();
    assert_eq!(session.next().unwrap(), 1);
}

#[tokio::test]
async fn navigation_bounds() {
    let (mut session, ids) = started(PersistenceMirror::disabled()).await;
    assert!(matches!(
        session.previous(),
        Err(QuizSessionError::AtFirstQuestion)
    ));

    session.go_to(2).unwrap();
    session.answer(&ids[2], "anything").unwrap();
    assert!(matches!(session.next(), Err(QuizSessionError::AtLastQuestion)));
    assert_eq!(session.previous().unwrap(), 1);
    assert!(matches!(
        session.go_to(3),
        Err(QuizSessionError::IndexOutOfRange { index: 3, len: 3 })
    ));
    assert!(!session.is_answered(0));
    assert!(session.is_answered(2));
}

#[tokio::test]
async fn unknown_question_is_rejected() {
    let (mut session, _) = started(PersistenceMirror::disabled()).await;
    let err = session.answer(&QuestionId::new("99"), "x").unwrap_err();
    assert!(matches!(err, QuizSessionError::UnknownQuestion(_)));
}

#[tokio::test]
async fn submit_requires_every_answer() {
    let (mut session, ids) = started(PersistenceMirror::disabled()).await;
    session.answer(&ids[0], "Mitochondria").unwrap();

    let err = session.submit().unwrap_err();
    assert!(matches!(err, QuizSessionError::Incomplete { missing: 2 }));
    assert_eq!(session.phase(), QuizPhase::InProgress);

    let progress = session.progress().unwrap();
    assert_eq!(progress.answered, 1);
    assert_eq!(progress.remaining, 2);
}

#[tokio::test]
async fn submitted_result_matches_rescoring() {
    let (mut session, ids) = started(PersistenceMirror::disabled()).await;
    answer_all(&mut session, &ids);
    // Type mismatch is kept and scored as wrong.
    session.answer(&ids[1], "true").unwrap();
    assert_eq!(session.live_score().unwrap().score, 2);

    let result = session.submit().unwrap().clone();
    assert_eq!(result.score, 2);
    assert_eq!(result.total_questions, 3);
    assert_eq!(result.percentage(), 67);
    assert_eq!(result.grade(), GradeBand::GoodEffort);
    assert_eq!(session.phase(), QuizPhase::Completed);

    let rescored = score(session.quiz().unwrap(), &result.answers);
    assert_eq!(rescored.score, result.score);
    assert!(matches!(
        session.answer(&ids[0], "Nucleus"),
        Err(QuizSessionError::NotInProgress)
    ));
}

#[tokio::test]
async fn generation_failure_stays_configuring() {
    let generator = FakeGenerator::failing();
    let mut session = session(Arc::clone(&generator), PersistenceMirror::disabled());
    session.set_num_questions(5).unwrap();

    let err = session.generate().await.unwrap_err();
    assert!(matches!(err, QuizSessionError::Generation(_)));
    assert_eq!(session.phase(), QuizPhase::Configuring);
    assert_eq!(session.num_questions(), 5);

    generator.set_failing(false);
    session.generate().await.unwrap();
    assert_eq!(session.phase(), QuizPhase::InProgress);
    assert_eq!(generator.quiz_calls(), 2);
    assert!(matches!(
        session.set_num_questions(10),
        Err(QuizSessionError::NotConfiguring)
    ));
}

#[tokio::test]
async fn zero_questions_is_rejected() {
    let mut session = session(FakeGenerator::new(), PersistenceMirror::disabled());
    assert!(matches!(
        session.set_num_questions(0),
        Err(QuizSessionError::InvalidQuestionCount)
    ));
    assert_eq!(session.num_questions(), 10);
}

#[tokio::test]
async fn reset_discards_quiz_and_answers() {
    let (mut session, ids) = started(PersistenceMirror::disabled()).await;
    answer_all(&mut session, &ids);
    session.submit().unwrap();

    session.reset();
    assert_eq!(session.phase(), QuizPhase::Configuring);
    assert!(session.quiz().is_none());
    assert!(session.answers().is_none());
    assert!(session.result().is_none());
}

#[tokio::test]
async fn result_is_saved_for_persisted_quiz() {
    let storage = Storage::in_memory();
    let user = UserId::new_anonymous();
    let (mut session, ids) = started(PersistenceMirror::new(user, storage.clone())).await;
    assert!(session.quiz().unwrap().id().is_some());

    answer_all(&mut session, &ids);
    session.submit().unwrap();
    session.flush().await;

    let saved = storage.quizzes.list_quiz_results(user).await.unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].result.score, 3);
    assert_eq!(session.mirror().failed_writes(), 0);
}

#[tokio::test]
async fn failed_result_write_keeps_completion() {
    let user = UserId::new_anonymous();
    let (mut session, ids) = started(PersistenceMirror::new(user, flaky_storage())).await;

    answer_all(&mut session, &ids);
    session.submit().unwrap();
    session.flush().await;

    assert_eq!(session.phase(), QuizPhase::Completed);
    assert_eq!(session.result().unwrap().score, 3);
    assert_eq!(session.mirror().failed_writes(), 1);
}
