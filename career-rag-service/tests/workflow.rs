//! Workflow tests with stubbed chat, jobs and mail backends.

mod common;

use anyhow::Result;
use career_rag_retriever::storage::VectorIndex;
use career_rag_service::workflow::{
    AnalysisRequest, EmailStatus, StudentInfo,
    email::{NO_JOBS_YET, SUBJECT},
    learning::fallback_plan,
    rag::{NO_CODE, NO_INFORMATION},
};
use common::{CAREER_DOCS, CannedChat, Harness, MailMode, RecordingMailer, StubBoard};

fn request(code: &str, email: &str) -> AnalysisRequest {
    AnalysisRequest {
        attempt_id: 7,
        personality_code: code.to_string(),
        student: StudentInfo {
            name: "Layla".to_string(),
            email: email.to_string(),
            gender: "F".to_string(),
        },
        metric_scores: Default::default(),
    }
}

/// Test a full run with every backend available
#[tokio::test]
async fn test_complete_run_sends_email() -> Result<()> {
    let harness = Harness::new(&CAREER_DOCS).await?;
    let chat = CannedChat::replying("generated text");
    let mailer = RecordingMailer::new(MailMode::Deliver);
    let workflow = harness.workflow(chat.clone(), StubBoard::with_jobs(8), mailer.clone());

    let report = workflow
        .run(request("I-R-S", "layla@example.com"))
        .await;

    assert_eq!(report.personality_code, "I-R-S");
    assert_eq!(report.career_recommendations, "generated text");
    assert_eq!(report.learning_path, "generated text");
    assert_eq!(report.job_matches.jobs.len(), 5);
    assert_eq!(
        report.email_status,
        EmailStatus::Sent {
            recipient: "layla@example.com".to_string()
        }
    );
    assert!(report.email_sent());
    assert_eq!(harness.index.count().await?, 3);

    // rag prompt, learning plan, email draft
    let calls = chat.calls();
    assert_eq!(calls.len(), 3);
    let rag_prompt = &calls[0].0[0].content;
    assert!(rag_prompt.contains("[السياق 1]:"));
    assert!(rag_prompt.contains("I-R-S"));
    assert_eq!(calls[0].1.max_tokens, 300);
    assert_eq!(calls[1].0[1].content, "توصيات تعليمية لرمز I-R-S");
    assert_eq!(calls[1].1.max_tokens, 2000);
    assert!(calls[2].0[0].content.contains("1. Job 1 - Company 1"));
    assert!(calls[2].0[0].content.contains("\"Layla\""));

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, SUBJECT);
    assert_eq!(sent[0].body, "generated text");
    Ok(())
}

/// Test the placeholders when there is nothing to retrieve from
#[tokio::test]
async fn test_empty_folder_and_blank_code_placeholders() -> Result<()> {
    let empty = Harness::new(&[]).await?;
    let chat = CannedChat::replying("unused");
    let report = empty
        .workflow(chat.clone(), StubBoard::with_jobs(1), RecordingMailer::new(MailMode::Deliver))
        .run(request("R-I-A", ""))
        .await;
    assert_eq!(report.career_recommendations, NO_INFORMATION);
    assert_eq!(report.email_status, EmailStatus::NoRecipient);
    // learning plan only
    assert_eq!(chat.calls().len(), 1);

    let indexed = Harness::new(&CAREER_DOCS).await?;
    let report = indexed
        .workflow(
            CannedChat::replying("unused"),
            StubBoard::with_jobs(1),
            RecordingMailer::new(MailMode::Deliver),
        )
        .run(request("   ", ""))
        .await;
    assert_eq!(report.career_recommendations, NO_CODE);
    Ok(())
}

/// Test every step degrades when the chat model and the job board fail
#[tokio::test]
async fn test_unconfigured_backends_degrade() -> Result<()> {
    let harness = Harness::new(&CAREER_DOCS).await?;
    let mailer = RecordingMailer::new(MailMode::Deliver);
    let report = harness
        .workflow(
            CannedChat::unconfigured(),
            StubBoard::failing("connection timed out"),
            mailer.clone(),
        )
        .run(request("S-I-R", "student@example.com"))
        .await;

    assert!(report.career_recommendations.starts_with("حدث خطأ: "));
    assert_eq!(report.learning_path, fallback_plan());
    assert_eq!(
        report.job_matches.error.as_deref(),
        Some("connection timed out")
    );
    assert!(report.job_matches.jobs.is_empty());
    assert_eq!(
        report.job_matches_json()?,
        r#"{"error":"connection timed out","jobs":[]}"#
    );

    // the plain fallback body still goes out
    assert!(report.email_sent());
    let body = &mailer.sent()[0].body;
    assert!(body.contains("S-I-R"));
    assert!(body.contains(NO_JOBS_YET));
    Ok(())
}

/// Test mailer failures become explicit statuses
#[tokio::test]
async fn test_mail_failures_are_reported() -> Result<()> {
    let harness = Harness::new(&CAREER_DOCS).await?;

    let report = harness
        .workflow(
            CannedChat::replying("body"),
            StubBoard::with_jobs(0),
            RecordingMailer::new(MailMode::NotConfigured),
        )
        .run(request("R-I-A", "a@example.com"))
        .await;
    assert_eq!(report.email_status, EmailStatus::NotConfigured);
    assert!(!report.email_sent());

    let report = harness
        .workflow(
            CannedChat::replying("body"),
            StubBoard::with_jobs(0),
            RecordingMailer::new(MailMode::Reject),
        )
        .run(request("R-I-A", "a@example.com"))
        .await;
    assert!(matches!(report.email_status, EmailStatus::Failed { .. }));
    Ok(())
}

/// Test a second analysis reuses the index built by the first
#[tokio::test]
async fn test_second_run_reuses_index() -> Result<()> {
    let harness = Harness::new(&CAREER_DOCS).await?;
    let workflow = harness.workflow(
        CannedChat::replying("ok"),
        StubBoard::with_jobs(1),
        RecordingMailer::new(MailMode::Deliver),
    );
    workflow.run(request("R-I-A", "")).await;
    let first_ids = harness.index.list_ids().await?;
    let snapshot = tokio::fs::read(harness.config.snapshot_path()).await?;

    workflow.run(request("S-E-C", "")).await;
    assert_eq!(harness.index.list_ids().await?, first_ids);
    assert_eq!(tokio::fs::read(harness.config.snapshot_path()).await?, snapshot);
    Ok(())
}
