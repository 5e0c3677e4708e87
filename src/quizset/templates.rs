//! Template catalog for deterministic quiz sets
//!
//! Each template is a fixed set of slots. Rendering fills the slots in a
//! per-level sentence frame, so generated situations meet the same
//! complexity contract as rewritten scenario text.

use crate::core::types::Difficulty;

/// Slot-filled question template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    pub title: &'static str,
    pub who: &'static str,
    pub place: &'static str,
    /// Time phrase without the trailing `에`
    pub time: &'static str,
    /// Past-tense predicate, three or four word groups, no clause markers
    pub action: &'static str,
    pub adverb: &'static str,
    /// Background sentence with a reason clause, no terminal
    pub reason: &'static str,
    pub rule: &'static str,
    pub options: [&'static str; 3],
    pub correct: u8,
}

pub const TEMPLATES: [Template; 10] = [
    Template {
        title: "복도에서 뛰었을 때",
        who: "지우",
        place: "복도",
        time: "쉬는 시간",
        action: "아주 빠르게 달렸어요",
        adverb: "서둘러",
        reason: "친구와 부딪칠 수 있어서 위험했어요",
        rule: "복도에서 뛰지 않기",
        options: ["천천히 걸어간다", "더 빨리 달린다", "벽을 짚고 달린다"],
        correct: 0,
    },
    Template {
        title: "급식 줄 새치기",
        who: "지우",
        place: "급식실",
        time: "점심 시간",
        action: "줄을 몰래 새치기했어요",
        adverb: "갑자기",
        reason: "기다리던 친구들이 속상했기 때문에 문제가 되었어요",
        rule: "줄 새치기 금지",
        options: ["자기 자리로 돌아가 줄을 선다", "앞에서 그대로 기다린다", "옆으로 가서 먼저 받는다"],
        correct: 0,
    },
    Template {
        title: "수업 중 전자기기",
        who: "지우",
        place: "교실",
        time: "수업 시간",
        action: "휴대폰 게임을 켰어요",
        adverb: "몰래",
        reason: "선생님 말씀을 못 들어서 공부를 놓쳤어요",
        rule: "수업 시간 전자기기 사용 금지",
        options: ["폰을 꺼서 가방에 넣는다", "몰래 계속 본다", "친구와 같이 본다"],
        correct: 0,
    },
    Template {
        title: "공유 색연필 사용",
        who: "지우",
        place: "미술실",
        time: "미술 시간",
        action: "공용 색연필을 독차지했어요",
        adverb: "먼저",
        reason: "다른 친구들이 색칠을 못 해서 곤란했어요",
        rule: "공유물은 차례대로 사용",
        options: ["순서를 기다려 사용한다", "먼저 가져가 계속 쓴다", "숨겨 두고 혼자 쓴다"],
        correct: 0,
    },
    Template {
        title: "교실 바닥 물 웅덩이",
        who: "지우",
        place: "교실",
        time: "청소 시간",
        action: "흘린 물을 내버려두었어요",
        adverb: "무심하게",
        reason: "누군가 미끄러질 수 있어서 위험했어요",
        rule: "바닥의 물은 바로 닦기",
        options: ["바로 닦고 선생님께 알린다", "그냥 지나간다", "물을 더 흘려 장난친다"],
        correct: 0,
    },
    Template {
        title: "도서관 소음",
        who: "지우",
        place: "도서관",
        time: "점심 시간",
        action: "큰 소리로 떠들었어요",
        adverb: "갑자기",
        reason: "책을 읽던 친구들이 집중하지 못해서 불편했어요",
        rule: "도서관에서는 조용히 하기",
        options: ["목소리를 낮춰 조용히 말한다", "더 크게 떠든다", "책상을 두드린다"],
        correct: 0,
    },
    Template {
        title: "운동장 공 안전",
        who: "지우",
        place: "운동장",
        time: "체육 시간",
        action: "공을 친구 쪽으로 찼어요",
        adverb: "세게",
        reason: "공에 맞은 친구가 다칠 수 있어서 위험했어요",
        rule: "사람을 향해 공 차지 않기",
        options: ["빈 공간으로 공을 찬다", "친구 쪽으로 세게 찬다", "창문 쪽으로 찬다"],
        correct: 0,
    },
    Template {
        title: "과학실 장비 다루기",
        who: "지우",
        place: "과학실",
        time: "과학 시간",
        action: "비커를 마음대로 만졌어요",
        adverb: "몰래",
        reason: "유리 기구가 깨지면 다칠 수 있어서 조심해야 했어요",
        rule: "선생님 안내 없이 실험 도구 만지지 않기",
        options: ["선생님 안내를 기다린다", "혼자 실험을 시작한다", "친구에게 비커를 건넨다"],
        correct: 0,
    },
    Template {
        title: "쓰레기 분리배출",
        who: "지우",
        place: "교실",
        time: "방과 후",
        action: "쓰레기를 모두 섞어 버렸어요",
        adverb: "서둘러",
        reason: "재활용품을 다시 나눠야 해서 번거로웠어요",
        rule: "쓰레기는 종류별로 나눠 버리기",
        options: ["종류별로 나눠서 버린다", "한 통에 모두 버린다", "바닥에 두고 간다"],
        correct: 0,
    },
    Template {
        title: "교실 자리 이동",
        who: "지우",
        place: "교실",
        time: "아침 자습 시간",
        action: "허락 없이 자리를 옮겼어요",
        adverb: "갑자기",
        reason: "수업이 어수선해졌기 때문에 모두 불편했어요",
        rule: "자리는 선생님 허락을 받고 옮기기",
        options: ["선생님께 먼저 여쭤본다", "마음대로 자리를 바꾼다", "친구 자리를 빼앗는다"],
        correct: 0,
    },
];

/// Template for output slot `i`, cycling through the catalog
pub fn template_at(i: usize) -> &'static Template {
    &TEMPLATES[i % TEMPLATES.len()]
}

impl Template {
    /// Situation text for a discrete difficulty (`Mixed` renders as `Mid`)
    pub fn render(&self, difficulty: Difficulty) -> String {
        match difficulty {
            Difficulty::Low => format!("{}가 {}에서 {}.", self.who, self.place, self.action),
            Difficulty::Mid | Difficulty::Mixed => {
                format!("{}가 {}에서 친구와 같이 {}.", self.who, self.place, self.action)
            }
            Difficulty::High => format!(
                "{}에 {}는 {}에서 {} {}. {}.",
                self.time, self.who, self.place, self.adverb, self.action, self.reason
            ),
        }
    }

    /// Title, tagged with the theme unless the theme is blank
    pub fn title_for(&self, theme: &str) -> String {
        if theme.trim().is_empty() {
            self.title.to_string()
        } else {
            format!("{} ({})", self.title, theme)
        }
    }
}
