//! Prompt construction for artifact descriptions

use crate::models::Artifact;

const PROMPT_HEADER: &str = "당신은 한국 문화재 전문가입니다. \
다음 유물에 대해 자세하고 흥미롭게 설명해주세요.";

const PROMPT_GUIDE: &str = "설명 작성 가이드:
1. 역사적 배경과 시대적 맥락 (2-3문장)
2. 유물의 특징과 제작 기법 (2-3문장)
3. 문화적/예술적 가치와 의의 (1-2문장)

주의사항:
- 자연스럽고 이해하기 쉬운 한국어로 작성
- 전문 용어는 쉽게 풀어서 설명
- 흥미로운 이야기나 에피소드 포함
- 총 200-300자 내외로 작성
- 존댓말 사용하지 않고 평서문으로 작성

설명:";

/// Artifact metadata that feeds the prompt
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptContext {
    pub name: String,
    pub time_period: Option<String>,
    pub estimated_year: Option<String>,
    pub origin_location: Option<String>,
}

impl From<&Artifact> for PromptContext {
    fn from(artifact: &Artifact) -> Self {
        Self {
            name: artifact.name.clone(),
            time_period: artifact.time_period.clone(),
            estimated_year: artifact.estimated_year.clone(),
            origin_location: artifact.origin_location.clone(),
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Build the generation prompt
///
/// Optional fields are added in a fixed order, one line each, and only when
/// non-empty.
pub fn build_prompt(context: &PromptContext) -> String {
    let mut prompt = format!(
        "{}\n\n유물 정보:\n- 유물명: {}",
        PROMPT_HEADER, context.name
    );

    let optional_lines = [
        ("시대", &context.time_period),
        ("추정 연도", &context.estimated_year),
        ("출토지", &context.origin_location),
    ];
    for (label, value) in optional_lines {
        if let Some(value) = present(value) {
            prompt.push_str(&format!("\n- {}: {}", label, value));
        }
    }

    prompt.push_str("\n\n");
    prompt.push_str(PROMPT_GUIDE);
    prompt
}
