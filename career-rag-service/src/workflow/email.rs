//! Compose the results email and send it to the student.

use std::sync::Arc;
use tracing::{info, warn};

use super::state::{AnalysisState, EmailStatus};
use crate::jobs::JobMatches;
use crate::llm::{ChatClient, ChatMessage, ChatOptions};
use crate::mailer::{EmailMessage, MailError, Mailer};

pub const SUBJECT: &str = "نتائج تحليلك المهني والأكاديمي الشامل - مشروع Capstone";
pub const DEFAULT_STUDENT_NAME: &str = "الطالب";
pub const NO_JOBS_YET: &str = "سيتم تحديث فرص العمل قريباً.";

/// Numbered `title - company` lines under a heading, empty without jobs.
pub fn jobs_section(matches: &JobMatches) -> String {
    if matches.jobs.is_empty() {
        return String::new();
    }
    let mut text = String::from("\n\n## 💼 فرص العمل:\n\n");
    for (i, job) in matches.jobs.iter().enumerate() {
        text.push_str(&format!("{}. {}\n", i + 1, job.headline()));
    }
    text
}

struct EmailContent<'a> {
    student_name: &'a str,
    code: &'a str,
    recommendations: &'a str,
    learning: &'a str,
    jobs: String,
}

impl EmailContent<'_> {
    fn jobs_or_placeholder(&self) -> &str {
        if self.jobs.is_empty() {
            NO_JOBS_YET
        } else {
            &self.jobs
        }
    }

    fn system_prompt(&self) -> String {
        format!(
            "أنت مساعد ذكي رائد في الإرشاد المهني والأكاديمي.

مهمتك: صياغة بريد إلكتروني ملهم وشامل للطالب: \"{name}\".

المحتوى المطلوب تضمينه:
1. مقدمة ترحيبية مهنية.
2. تحليل معمق لرمز الشخصية: {code}.
3. التوصيات المهنية (من RAG): {rag}
4. الخطة التعليمية (الجامعات والدورات مع الروابط): {learning}
5. فرص العمل المتاحة: {jobs}

التعليمات الهامة:
- يجب أن يكون البريد بالكامل باللغة العربية.
- تأكد من ظهور روابط المواقع (URLs) بشكل واضح وقابل للضغط.
- استخدم تنسيق Markdown لتحسين المظهر (عناوين، قوائم، نقاط).
- اكتب نص البريد فقط، بدون سطر الموضوع.",
            name = self.student_name,
            code = self.code,
            rag = self.recommendations,
            learning = self.learning,
            jobs = self.jobs_or_placeholder(),
        )
    }

    /// Body used when the chat model is unavailable.
    fn plain_body(&self) -> String {
        format!(
            "مرحباً {name}،\n\nرمز شخصيتك: {code}\n\n## التوصيات المهنية\n{rag}\n\n## الخطة التعليمية\n{learning}\n\n## فرص العمل\n{jobs}\n",
            name = self.student_name,
            code = self.code,
            rag = self.recommendations,
            learning = self.learning,
            jobs = self.jobs_or_placeholder().trim(),
        )
    }
}

pub struct EmailStep {
    chat: Arc<dyn ChatClient>,
    mailer: Arc<dyn Mailer>,
}

impl EmailStep {
    pub fn new(chat: Arc<dyn ChatClient>, mailer: Arc<dyn Mailer>) -> Self {
        Self { chat, mailer }
    }

    pub async fn run(&self, state: &mut AnalysisState) {
        let status = self.deliver(state).await;
        info!(?status, "Email step finished");
        state.email_status = Some(status);
    }

    async fn deliver(&self, state: &AnalysisState) -> EmailStatus {
        let student = &state.request.student;
        let recipient = student.email.trim();
        if recipient.is_empty() {
            return EmailStatus::NoRecipient;
        }

        let name = student.name.trim();
        let content = EmailContent {
            student_name: if name.is_empty() { DEFAULT_STUDENT_NAME } else { name },
            code: state.code(),
            recommendations: state.career_recommendations.as_deref().unwrap_or_default(),
            learning: state.learning_path.as_deref().unwrap_or_default(),
            jobs: state
                .job_matches
                .as_ref()
                .map(jobs_section)
                .unwrap_or_default(),
        };

        let messages = [
            ChatMessage::system(content.system_prompt()),
            ChatMessage::user("أنشئ البريد الآن"),
        ];
        let body = match self.chat.complete(&messages, ChatOptions::draft()).await {
            Ok(body) => body,
            Err(err) => {
                warn!("Email drafting failed, sending plain summary: {}", err);
                content.plain_body()
            }
        };

        let message = EmailMessage {
            to: recipient.to_string(),
            subject: SUBJECT.to_string(),
            body,
        };
        match self.mailer.send(&message).await {
            Ok(()) => EmailStatus::Sent {
                recipient: recipient.to_string(),
            },
            Err(MailError::NotConfigured) => EmailStatus::NotConfigured,
            Err(err) => {
                warn!("Sending email failed: {}", err);
                EmailStatus::Failed {
                    reason: err.to_string(),
                }
            }
        }
    }
}
