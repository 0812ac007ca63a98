//! Learning plan: universities and online courses for a personality code.

use std::sync::Arc;
use tracing::warn;

use super::state::AnalysisState;
use crate::llm::{ChatClient, ChatMessage, ChatOptions};

pub const UNIVERSITIES: &str = "قائمة الجامعات الموصى بها:
1. الجامعة اللبنانية (LU): تضم تخصصات متنوعة في الهندسة، العلوم، والحقوق. (https://www.ul.edu.lb)
2. الجامعة الأميركية في بيروت (AUB): رائدة في الطب، الهندسة، وإدارة الأعمال. (https://www.aub.edu.lb)
3. جامعة القديس يوسف (USJ): تميز في الطب، العلوم الإنسانية والاجتماعية. (https://www.usj.edu.lb)
4. الجامعة اللبنانية الأميركية (LAU): تخصصات متميزة في الصيدلة، التصميم، وهندسة العمارة. (https://www.lau.edu.lb)
5. جامعة بيروت العربية (BAU): تخصصات شاملة في العلوم الطبية والهندسية. (https://www.bau.edu.lb)
";

pub const COURSES: &str = "دورات تدريبية مقترحة:
1. مسارات Google المهنية (Coursera): تغطي تحليل البيانات، إدارة المشاريع، والدعم التقني. (https://www.coursera.org/google-career-certificates)
2. دورات edX التخصصية: تقدم شهادات من هارفارد وMIT في تقنيات الذكاء الاصطناعي والبرمجة. (https://www.edx.org)
3. Udemy Professional Courses: دورات عملية في التصميم الجرافيكي، التسويق الرقمي، وتطوير الويب. (https://www.udemy.com)
4. LinkedIn Learning: دورات في القيادة، التواصل، والمهارات الشخصية (Soft Skills). (https://www.linkedin.com/learning)
";

fn system_prompt(code: &str) -> String {
    format!(
        "أنت خبير إرشاد أكاديمي متخصص في الأنظمة التعليمية.

مهمتك: تقديم خطة تعليمية شاملة لرمز الشخصية {code}.

التعليمات:
1. استخدم قائمة الجامعات وقائمة الدورات أدناه للحصول على معلومات دقيقة.
2. قدم قائمة بـ 3 جامعات على الأقل، مع تحديد الكلية/التخصص المناسب لكل جامعة ورابط الموقع الرسمي.
3. قدم قائمة بـ 3 دورات تدريبية عبر الإنترنت على الأقل، مع ذكر المنصة والرابط المباشر.
4. يجب أن تكون الإجابة كاملة باللغة العربية، منظمة بوضوح، وتحتوي على روابط فعلية.
5. اربط بين السمات الشخصية (S, C, I, etc.) وبين سبب اختيارك لهذه التخصصات.

{UNIVERSITIES}
{COURSES}"
    )
}

/// Plan used when the chat model is unavailable.
pub fn fallback_plan() -> String {
    format!("{UNIVERSITIES}\n{COURSES}")
}

pub struct LearningStep {
    chat: Arc<dyn ChatClient>,
}

impl LearningStep {
    pub fn new(chat: Arc<dyn ChatClient>) -> Self {
        Self { chat }
    }

    pub async fn run(&self, state: &mut AnalysisState) {
        let code = state.code();
        let messages = [
            ChatMessage::system(system_prompt(code)),
            ChatMessage::user(format!("توصيات تعليمية لرمز {code}")),
        ];
        let plan = match self.chat.complete(&messages, ChatOptions::draft()).await {
            Ok(plan) => plan,
            Err(err) => {
                warn!("Learning plan generation failed, using catalogue: {}", err);
                fallback_plan()
            }
        };
        state.learning_path = Some(plan);
    }
}
