//! Prompt text for the generation service
//!
//! Every leveled prompt carries the same complexity contract the rule engine
//! checks against, plus the banned meta phrases.

use crate::core::types::Level;
use crate::rewrite::contract::{prompt_rules, META_PHRASES};
use crate::storage::ScenarioWithOptions;

fn banned_phrases() -> String {
    META_PHRASES
        .iter()
        .map(|p| format!("'{}'", p))
        .collect::<Vec<_>>()
        .join(", ")
}

fn level_guidance(level: Level) -> &'static str {
    match level {
        Level::Beginner => {
            "초등학교 1학년 수준. 제목은 10글자 이내, 상황은 정확히 1문장 4~6어절, 선택지는 15글자 이내의 '~해요' 체."
        }
        Level::Intermediate => {
            "초등학교 2학년 수준. 상황은 1문장 7~11어절, 장소/시간 수식어와 연결어는 각각 1개 이내."
        }
        Level::Advanced => {
            "초등학교 3학년 수준. 상황은 정확히 2문장 12~18어절, 시간/장소 수식어와 부사 1개, 이유/배경 1개를 넣고, 선택지는 구체적인 행동으로."
        }
    }
}

/// System prompt for one difficulty rewrite
pub fn adjust_system(level: Level) -> String {
    format!(
        "당신은 경계선 지능 아동을 위한 교육 시나리오의 난이도를 조정하는 전문가입니다.\n\
         주어진 시나리오를 {} 난이도에 맞게 수정해주세요. 선택지의 순서와 개수는 바꾸지 마세요.\n\n\
         난이도 지침: {}\n\n\
         문장 복잡도 규칙:\n{}\n\n\
         금지 문구: {}\n\n\
         다음 JSON 형식으로만 반환해주세요:\n\
         {{\"title\": \"수정된 제목\", \"situation\": \"수정된 상황 설명\", \"options\": [\"선택지1\", \"선택지2\", \"선택지3\"]}}",
        level,
        level_guidance(level),
        prompt_rules(),
        banned_phrases()
    )
}

pub fn adjust_user(scenario: &ScenarioWithOptions, level: Level) -> String {
    let options: Vec<&str> = scenario.options.iter().map(|o| o.text.as_str()).collect();
    format!(
        "다음 시나리오를 {} 난이도로 조정해주세요:\n\n제목: {}\n상황: {}\n선택지: {}",
        level,
        scenario.scenario.title,
        scenario.scenario.situation,
        options.join(", ")
    )
}

/// System prompt for authoring a batch of custom scenarios
pub fn authoring_system(batch: usize) -> String {
    format!(
        "당신은 경계선 지능 아동을 위한 교육 시나리오를 만드는 전문가입니다.\n\
         사용자가 제공한 문제 상황을 바탕으로 아동이 상황 판단력과 사회성을 기를 수 있는 시나리오 {}개를 만들어주세요.\n\
         각 시나리오는 다음 형식을 따라야 합니다:\n\
         1. title: 간단한 상황 제목\n\
         2. situation: 구체적인 상황 설명 (아동 관점에서 이해하기 쉽게)\n\
         3. options: 3개의 선택지 배열\n\
         4. correct_option: 올바른 선택지 번호 (0, 1, 또는 2)\n\n\
         반드시 유효한 JSON 배열만 반환하고, 코드 블록이나 추가 설명은 포함하지 마세요.",
        batch
    )
}

pub fn authoring_user(description: &str, batch: usize) -> String {
    format!(
        "다음 문제 상황에 대한 교육 시나리오 {}개를 만들어주세요: {}",
        batch, description
    )
}

pub fn theme_name_system(max_chars: usize) -> String {
    format!(
        "주어진 문제 상황을 바탕으로 아이들이 이해하기 쉬운 테마 이름을 만들어주세요. \
         {}글자 이내의 간단하고 친근한 제목으로 만드세요. \
         예: \"친구와 갈등 해결하기\", \"학교에서 예의 지키기\". 테마 이름만 반환하세요.",
        max_chars
    )
}

pub fn theme_name_user(description: &str) -> String {
    format!("다음 상황에 대한 테마 이름을 만들어주세요: {}", description)
}

/// System prompt for the literacy pretest questions
pub fn literacy_quiz_system(count: usize) -> String {
    format!(
        "당신은 경계선 지능 아동을 위한 문해력 퀴즈 출제 전문가입니다. \
         이 퀴즈는 난이도 측정만을 위한 간단한 읽기 이해 문제로 구성합니다.\n\n\
         설계 원칙:\n\
         - 초등학교 1-2학년 수준. 어려운 어휘/지문 금지.\n\
         - 심화 추론을 요구하지 말고, 짧은 문장 읽기 이해만 확인.\n\
         - easy/medium/hard 3단계 문장 복잡도 규칙을 엄격히 준수.\n\n\
         문장 복잡도 규칙 (easy=beginner, medium=intermediate, hard=advanced):\n{}\n\n\
         금지 문구: {}\n\n\
         문제 형식(JSON 배열):\n\
         [{{\"id\": 1, \"question\": \"문장\", \"options\": [\"보기1\", \"보기2\", \"보기3\", \"보기4\"], \"correctAnswer\": 0, \"level\": \"easy\"}}]\n\n\
         요구사항:\n\
         - 총 {}문항, 각 레벨 최소 1문항씩 포함(easy/medium/hard).\n\
         - 오답은 정답과 혼동되지 않게 단순·명확.\n\
         - 반드시 유효한 JSON 배열만 출력. 코드블록/설명 금지.",
        prompt_rules(),
        banned_phrases(),
        count
    )
}

pub fn literacy_quiz_user(count: usize) -> String {
    format!(
        "문해력 퀴즈 {}문항을 만들어주세요. easy/medium/hard를 고르게 포함하세요.",
        count
    )
}
