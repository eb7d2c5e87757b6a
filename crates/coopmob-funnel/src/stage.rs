// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Funnel stages and the static back-map used by the `voltar` command.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Number of introduction messages (stages `intro_1` .. `intro_3`).
pub const INTRO_STAGES: u8 = 3;

/// Number of scenario questions (stages `disc_q0` .. `disc_q4`).
pub const DISC_STAGES: u8 = 5;

/// Where a user currently is in the intake funnel.
///
/// Stored in context under its canonical string form (`intro_1`,
/// `await_city`, `disc_q0`, ...) so records stay readable in the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Introduction message `n` (1-based).
    Intro(u8),
    AwaitCity,
    /// City collection after the user declined during the intro.
    AwaitCityReject,
    ReqMoto,
    ReqCnh,
    ReqAndroid,
    /// Scenario question `n` (0-based).
    DiscQuestion(u8),
    OfferPositions,
    Final,
}

impl Stage {
    pub fn is_intro(&self) -> bool {
        matches!(self, Stage::Intro(_))
    }

    /// The stage `voltar` returns to, when one exists.
    ///
    /// `offer_positions` has no predecessor here; the engine re-sends the
    /// listings menu instead of moving back into the questionnaire.
    pub fn previous(&self) -> Option<Stage> {
        match self {
            Stage::Intro(i) if *i > 1 => Some(Stage::Intro(i - 1)),
            Stage::Intro(_) => Some(Stage::AwaitCity),
            Stage::DiscQuestion(i) if *i > 0 => Some(Stage::DiscQuestion(i - 1)),
            Stage::DiscQuestion(_) => Some(Stage::ReqAndroid),
            Stage::ReqAndroid => Some(Stage::ReqCnh),
            Stage::ReqCnh => Some(Stage::ReqMoto),
            Stage::ReqMoto => Some(Stage::AwaitCity),
            _ => None,
        }
    }

    /// Human-readable label for the `status` summary; `None` renders as "—".
    pub fn progress_label(&self) -> Option<String> {
        match self {
            Stage::AwaitCity => Some("Aguardando seleção de cidade".to_string()),
            Stage::ReqMoto => Some("Confirmando: moto com documentação em dia".to_string()),
            Stage::ReqCnh => Some("Confirmando: CNH A ativa".to_string()),
            Stage::ReqAndroid => Some("Confirmando: dispositivo Android".to_string()),
            Stage::DiscQuestion(i) => Some(format!("Questionário DISC ({}/5)", i + 1)),
            Stage::OfferPositions => Some("Apresentando vagas disponíveis".to_string()),
            Stage::Final => Some("Atendimento concluído".to_string()),
            Stage::Intro(_) | Stage::AwaitCityReject => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Intro(i) => write!(f, "intro_{i}"),
            Stage::AwaitCity => f.write_str("await_city"),
            Stage::AwaitCityReject => f.write_str("await_city_reject"),
            Stage::ReqMoto => f.write_str("req_moto"),
            Stage::ReqCnh => f.write_str("req_cnh"),
            Stage::ReqAndroid => f.write_str("req_android"),
            Stage::DiscQuestion(i) => write!(f, "disc_q{i}"),
            Stage::OfferPositions => f.write_str("offer_positions"),
            Stage::Final => f.write_str("final"),
        }
    }
}

/// Error for a stage string that matches no canonical form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidStage(pub String);

impl fmt::Display for InvalidStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown funnel stage: {}", self.0)
    }
}

impl std::error::Error for InvalidStage {}

impl FromStr for Stage {
    type Err = InvalidStage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(rest) = s.strip_prefix("intro_") {
            return rest
                .parse::<u8>()
                .ok()
                .filter(|i| (1..=INTRO_STAGES).contains(i))
                .map(Stage::Intro)
                .ok_or_else(|| InvalidStage(s.to_string()));
        }
        if let Some(rest) = s.strip_prefix("disc_q") {
            return rest
                .parse::<u8>()
                .ok()
                .filter(|i| *i < DISC_STAGES)
                .map(Stage::DiscQuestion)
                .ok_or_else(|| InvalidStage(s.to_string()));
        }
        match s {
            "await_city" => Ok(Stage::AwaitCity),
            "await_city_reject" => Ok(Stage::AwaitCityReject),
            "req_moto" => Ok(Stage::ReqMoto),
            "req_cnh" => Ok(Stage::ReqCnh),
            "req_android" => Ok(Stage::ReqAndroid),
            "offer_positions" => Ok(Stage::OfferPositions),
            "final" => Ok(Stage::Final),
            other => Err(InvalidStage(other.to_string())),
        }
    }
}

impl Serialize for Stage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Stage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_strings_round_trip() {
        let stages = [
            Stage::Intro(1),
            Stage::Intro(3),
            Stage::AwaitCity,
            Stage::AwaitCityReject,
            Stage::ReqMoto,
            Stage::ReqCnh,
            Stage::ReqAndroid,
            Stage::DiscQuestion(0),
            Stage::DiscQuestion(4),
            Stage::OfferPositions,
            Stage::Final,
        ];
        for stage in stages {
            let s = stage.to_string();
            assert_eq!(s.parse::<Stage>().unwrap(), stage, "via {s}");
        }
    }

    #[test]
    fn unknown_strings_are_rejected() {
        assert!("intro_x".parse::<Stage>().is_err());
        assert!("disc_q".parse::<Stage>().is_err());
        assert!("telegram".parse::<Stage>().is_err());
        assert!("".parse::<Stage>().is_err());
    }

    #[test]
    fn out_of_range_indices_are_rejected() {
        assert!("intro_0".parse::<Stage>().is_err());
        assert!("intro_4".parse::<Stage>().is_err());
        assert!("disc_q5".parse::<Stage>().is_err());
        assert!("disc_q255".parse::<Stage>().is_err());
    }

    #[test]
    fn back_map_walks_toward_city_selection() {
        assert_eq!(Stage::Intro(3).previous(), Some(Stage::Intro(2)));
        assert_eq!(Stage::Intro(1).previous(), Some(Stage::AwaitCity));
        assert_eq!(Stage::DiscQuestion(2).previous(), Some(Stage::DiscQuestion(1)));
        assert_eq!(Stage::DiscQuestion(0).previous(), Some(Stage::ReqAndroid));
        assert_eq!(Stage::ReqAndroid.previous(), Some(Stage::ReqCnh));
        assert_eq!(Stage::ReqCnh.previous(), Some(Stage::ReqMoto));
        assert_eq!(Stage::ReqMoto.previous(), Some(Stage::AwaitCity));
        assert_eq!(Stage::OfferPositions.previous(), None);
        assert_eq!(Stage::Final.previous(), None);
    }

    #[test]
    fn serde_uses_canonical_form() {
        let json = serde_json::to_string(&Stage::DiscQuestion(2)).unwrap();
        assert_eq!(json, "\"disc_q2\"");
        let parsed: Stage = serde_json::from_str("\"offer_positions\"").unwrap();
        assert_eq!(parsed, Stage::OfferPositions);
    }
}
