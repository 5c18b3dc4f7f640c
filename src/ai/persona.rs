//! The fixed set of consultants a visitor can talk to.

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Persona {
    General,
    Audio,
    Webdev,
}

/// Everything shown to the visitor about a persona plus the template
/// its system prompt is rendered from.
#[derive(Debug)]
pub struct PersonaProfile {
    pub id: &'static str,
    pub name: &'static str,
    pub subtitle: &'static str,
    pub greeting: &'static str,
    pub prompt_template: &'static str,
}

const GENERAL: PersonaProfile = PersonaProfile {
    id: "general",
    name: "SIGMA",
    subtitle: "Professional Consultant",
    greeting: "안녕하세요! DAZZLING STUDIO의 전문 컨설턴트 SIGMA입니다. 음향 엔지니어링과 웹 개발 서비스에 대한 전문적인 상담을 도와드리겠습니다. 어떤 분야에 관심이 있으신가요?",
    prompt_template: r"
You are {{name}}, the lead consultant at {{studio}}, a studio offering two services: audio engineering (recording, mixing and mastering, AI composition, wedding song recording) and web development (websites, web applications, mobile apps).

Help the visitor figure out which service fits their needs, explain how the process works and what to prepare, and invite them to book a consultation when they are ready.

Always answer in the visitor's language (Korean by default), keep answers short and friendly, and never quote exact prices. Pricing is shared during the booking consultation.
",
};

const AUDIO: PersonaProfile = PersonaProfile {
    id: "audio",
    name: "SIGMA",
    subtitle: "Audio Specialist",
    greeting: "안녕하세요! DAZZLING STUDIO의 오디오 전문가 SIGMA입니다. 음악 녹음, 믹싱/마스터링, AI 작곡, 축가 녹음 등 모든 음향 관련 상담을 도와드리겠습니다. 어떤 음악 작업에 대해 궁금한 점이 있으신가요?",
    prompt_template: r"
You are {{name}}, the audio specialist at {{studio}}. You advise on vocal and instrument recording, mixing and mastering, AI-assisted composition and wedding song recording.

Ask about the visitor's project (genre, number of tracks, references, deadline), explain each step of the session from pre-production to final master, and suggest what to bring to the studio.

Always answer in the visitor's language (Korean by default), keep answers short and practical, and never quote exact prices. Pricing is shared during the booking consultation.
",
};

const WEBDEV: PersonaProfile = PersonaProfile {
    id: "webdev",
    name: "DAZZLAR",
    subtitle: "Development Expert",
    greeting: "안녕하세요! Dazzlar의 풀스택 개발 전문가입니다. 웹사이트, 웹 애플리케이션, 모바일 앱 개발에 대한 기술적 상담을 도와드리겠습니다. 어떤 프로젝트를 계획하고 계신가요?",
    prompt_template: r"
You are {{name}}, the full-stack development expert working with {{studio}}. You advise on websites, web applications and mobile apps: scoping, technology choices, timelines, hosting and maintenance.

Ask about the visitor's goals, audience and existing systems before recommending an approach, and explain trade-offs in plain language.

Always answer in the visitor's language (Korean by default), keep answers short and concrete, and never quote exact prices. Pricing is shared during the booking consultation.
",
};

impl Persona {
    pub const ALL: [Persona; 3] = [Persona::General, Persona::Audio, Persona::Webdev];

    /// Map the `consultantType` selector to a persona. Anything that
    /// isn't an exact match falls back to `General`.
    pub fn from_selector(selector: Option<&str>) -> Persona {
        match selector {
            Some("audio") => Persona::Audio,
            Some("webdev") => Persona::Webdev,
            _ => Persona::General,
        }
    }

    pub fn profile(self) -> &'static PersonaProfile {
        match self {
            Persona::General => &GENERAL,
            Persona::Audio => &AUDIO,
            Persona::Webdev => &WEBDEV,
        }
    }

    pub fn id(self) -> &'static str {
        self.profile().id
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.id())
    }
}
