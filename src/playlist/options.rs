use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Target audio attributes for providers with a seeded recommendation endpoint (0.0 to 1.0)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioTargets {
    pub valence: f32, // 0.0 = sad/dark, 1.0 = cheerful
    pub energy: f32,  // 0.0 = calm, 1.0 = intense
}

#[derive(Debug, Clone, Copy)]
pub struct MoodProfile {
    pub terms: &'static [&'static str],
    pub message: &'static str,
    pub targets: AudioTargets,
}

#[derive(Debug, Clone, Copy)]
pub struct GenreProfile {
    /// Keywords anchoring every generated query to the genre
    pub force_terms: &'static [&'static str],
    /// Keywords that read like curated playlist titles
    pub playlist_terms: &'static [&'static str],
    pub chart_region: Option<&'static str>,
    pub seed_genre: Option<&'static str>,
    pub label: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Calm,
    Sad,
    Angry,
    Tired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Situation {
    #[default]
    None,
    Drive,
    Study,
    Workout,
    Commute,
    Party,
    Healing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Genre {
    #[default]
    None,
    #[value(name = "kpop", alias = "k-pop")]
    KPop,
    Pop,
    #[value(name = "jpop", alias = "j-pop")]
    JPop,
    #[value(alias = "classical")]
    Classic,
}

impl Mood {
    pub const ALL: [Mood; 5] = [Mood::Happy, Mood::Calm, Mood::Sad, Mood::Angry, Mood::Tired];

    pub fn profile(self) -> MoodProfile {
        match self {
            Mood::Happy => MoodProfile {
                terms: &["happy", "upbeat", "feel good", "신나는", "기분좋은"],
                message: "Energy up! Let's keep the good mood going.",
                targets: AudioTargets { valence: 0.85, energy: 0.75 },
            },
            Mood::Calm => MoodProfile {
                terms: &["chill", "calm", "relax", "잔잔한", "편안한"],
                message: "Nice and slow: a calm, comfortable selection.",
                targets: AudioTargets { valence: 0.55, energy: 0.3 },
            },
            Mood::Sad => MoodProfile {
                terms: &["sad", "melancholy", "emotional", "감성", "위로"],
                message: "Songs picked to keep you company and lift you up.",
                targets: AudioTargets { valence: 0.2, energy: 0.3 },
            },
            Mood::Angry => MoodProfile {
                terms: &["angry", "rage", "intense", "강렬한", "빡센"],
                message: "Full power. Let it all out.",
                targets: AudioTargets { valence: 0.3, energy: 0.9 },
            },
            Mood::Tired => MoodProfile {
                terms: &["sleep", "ambient", "relaxing", "힐링", "수면"],
                message: "Time to rest: something soft and cozy.",
                targets: AudioTargets { valence: 0.35, energy: 0.15 },
            },
        }
    }
}

impl Situation {
    pub const ALL: [Situation; 7] = [
        Situation::None,
        Situation::Drive,
        Situation::Study,
        Situation::Workout,
        Situation::Commute,
        Situation::Party,
        Situation::Healing,
    ];

    pub fn terms(self) -> &'static [&'static str] {
        match self {
            Situation::None => &[],
            Situation::Drive => &["drive", "driving", "road trip", "드라이브", "차에서 듣기"],
            Situation::Study => &["study", "focus", "집중", "공부할 때", "lofi"],
            Situation::Workout => &["workout", "gym", "running", "운동", "헬스"],
            Situation::Commute => &["commute", "출퇴근", "이동할 때"],
            Situation::Party => &["party", "dance", "파티", "신나는"],
            Situation::Healing => &["healing", "relax", "휴식", "힐링"],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Situation::None => "Anything",
            Situation::Drive => "Drive",
            Situation::Study => "Study / focus",
            Situation::Workout => "Workout",
            Situation::Commute => "Commute",
            Situation::Party => "Party",
            Situation::Healing => "Healing / rest",
        }
    }
}

impl Genre {
    pub const ALL: [Genre; 5] = [Genre::None, Genre::KPop, Genre::Pop, Genre::JPop, Genre::Classic];

    pub fn profile(self) -> GenreProfile {
        match self {
            Genre::None => GenreProfile {
                force_terms: &[],
                playlist_terms: &[],
                chart_region: None,
                seed_genre: None,
                label: "Any genre",
            },
            Genre::KPop => GenreProfile {
                force_terms: &["kpop", "k-pop", "케이팝", "가요", "아이돌"],
                playlist_terms: &["K-pop", "케이팝", "Kpop Hits", "K-pop playlist", "K-pop mix"],
                chart_region: Some("KR"),
                seed_genre: Some("k-pop"),
                label: "K-pop",
            },
            Genre::Pop => GenreProfile {
                force_terms: &["pop", "pop hits", "top hits", "radio hits"],
                playlist_terms: &["Pop Hits", "Today's Top Hits", "Pop playlist", "Top pop"],
                chart_region: Some("US"),
                seed_genre: Some("pop"),
                label: "Pop",
            },
            Genre::JPop => GenreProfile {
                force_terms: &["jpop", "j-pop", "J-Pop", "일본 노래", "Japanese pop"],
                playlist_terms: &["J-Pop", "Jpop Hits", "J-pop playlist", "Japanese pop"],
                chart_region: Some("JP"),
                seed_genre: Some("j-pop"),
                label: "J-pop",
            },
            // Charts skew away from classical, playlists and search do better
            Genre::Classic => GenreProfile {
                force_terms: &["classical", "classic", "orchestra", "piano", "클래식", "피아노"],
                playlist_terms: &["Classical", "Classical playlist", "Piano", "Relaxing classical"],
                chart_region: None,
                seed_genre: Some("classical"),
                label: "Classical",
            },
        }
    }
}
