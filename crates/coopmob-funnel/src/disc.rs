// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The five-scenario DISC questionnaire: question data, scoring, and the
//! candidate profile text.
//!
//! Scoring is a pure function of the answer sequence. Each answer id awards
//! 0 or 1 approval point and contributes to up to two of the four trait
//! buckets (D, I, S, C).

use coopmob_core::MenuItem;
use serde::{Deserialize, Serialize};

/// A candidate is approved with at least this score (out of 5).
pub const APPROVAL_THRESHOLD: u8 = 3;

/// One scenario question with three fixed options.
pub struct DiscQuestion {
    pub id: &'static str,
    pub text: &'static str,
    /// `(answer id, full option text)`, rendered as A/B/C.
    pub options: [(&'static str, &'static str); 3],
}

pub const DISC_QUESTIONS: [DiscQuestion; 5] = [
    DiscQuestion {
        id: "Q1",
        text: "Você está no meio de sua rota diária quando surge uma nova coleta de alta prioridade em uma área próxima, mas que exigirá um desvio.",
        options: [
            ("Q1_A", "Analiso o impacto no restante da minha rota e, se for viável, ajusto o percurso para incluir a nova coleta sem comprometer os outros prazos."),
            ("Q1_B", "Comunico-me imediatamente com a central para avaliar a melhor estratégia, seja repassar a coleta para outro entregador ou receber ajuda para reorganizar minhas entregas."),
            ("Q1_C", "Aceito o desafio e me apresso para realizar a coleta urgente primeiro, mesmo que isso signifique um possível atraso nas outras entregas."),
        ],
    },
    DiscQuestion {
        id: "Q2",
        text: "Ao chegar no endereço de entrega, o cliente te liga e pede para deixar a encomenda com o vizinho, um procedimento que não é o padrão da empresa.",
        options: [
            ("Q2_A", "Agradeço a instrução, mas informo que, por segurança, preciso seguir o procedimento padrão e peço para o cliente ou uma pessoa autorizada receber a encomenda no local correto."),
            ("Q2_B", "Entendo a necessidade do cliente e tento encontrar uma solução, como aguardar alguns minutos ou sugerir que ele autorize formalmente a entrega ao vizinho pelo aplicativo."),
            ("Q2_C", "Para agilizar, deixo com o vizinho conforme solicitado, garantindo que ele se responsabilize e informando o cliente que a encomenda foi deixada no local alternativo."),
        ],
    },
    DiscQuestion {
        id: "Q3",
        text: "Uma chuva intensa e inesperada começa no meio do seu turno, diminuindo a visibilidade e tornando as ruas escorregadias.",
        options: [
            ("Q3_A", "Imediatamente reduzo a velocidade e aumento a distância dos outros veículos. A segurança vem sempre em primeiro lugar."),
            ("Q3_B", "Procuro um local seguro para parar temporariamente, aviso a central sobre as condições climáticas e informo os clientes sobre possíveis atrasos."),
            ("Q3_C", "Continuo a rota com cuidado redobrado, mas tentando manter o ritmo para não comprometer os prazos."),
        ],
    },
    DiscQuestion {
        id: "Q4",
        text: "Na farmácia, ao coletar um pedido, você nota que a embalagem de um item frágil está mal fechada e parece que pode abrir a qualquer momento.",
        options: [
            ("Q4_A", "Comunico o problema imediatamente ao responsável da farmácia e peço que a embalagem seja trocada ou reforçada."),
            ("Q4_B", "Eu mesmo tento reforçar a embalagem da melhor forma possível para não perder tempo e seguir para a entrega."),
            ("Q4_C", "Informo o cliente sobre a condição da embalagem e pergunto se ele ainda deseja receber o pedido, explicando que farei o meu melhor para que chegue intacto."),
        ],
    },
    DiscQuestion {
        id: "Q5",
        text: "Você tem duas coletas agendadas em locais próximos, mas com horários de retirada quase simultâneos e muito apertados.",
        options: [
            ("Q5_A", "Verifico no mapa a rota mais rápida e ligo para os estabelecimentos para avisar de um possível pequeno atraso em um deles, negociando a melhor ordem de coleta."),
            ("Q5_B", "Sigo a ordem definida pelo sistema, focando em ser o mais ágil possível em cada parada para tentar cumprir ambos os horários."),
            ("Q5_C", "Analiso a situação e, se o risco de atraso for alto, peço ajuda à central para que outro entregador assuma uma das coletas."),
        ],
    },
];

/// Per-trait point totals, serialized under the bucket letters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitScores {
    #[serde(rename = "D")]
    pub d: u8,
    #[serde(rename = "I")]
    pub i: u8,
    #[serde(rename = "S")]
    pub s: u8,
    #[serde(rename = "C")]
    pub c: u8,
}

/// Resolves a tapped option id against question `q_idx`, if it belongs there.
pub fn match_selection(q_idx: usize, selected: &str) -> Option<&'static str> {
    let question = DISC_QUESTIONS.get(q_idx)?;
    question
        .options
        .iter()
        .find(|(id, _)| *id == selected)
        .map(|(id, _)| *id)
}

fn answer_points(answer_id: &str) -> u8 {
    match answer_id {
        "Q1_A" | "Q1_B" | "Q2_A" | "Q2_B" | "Q3_A" | "Q3_B" | "Q4_A" | "Q4_B" | "Q5_A"
        | "Q5_B" => 1,
        _ => 0,
    }
}

/// Approval score over the answer sequence (0..=5 for a full run).
pub fn score(answers: &[String]) -> u8 {
    answers.iter().map(|a| answer_points(a)).sum()
}

/// Sums the per-answer trait contributions.
pub fn trait_scores(answers: &[String]) -> TraitScores {
    let mut scores = TraitScores::default();
    for answer in answers {
        match answer.as_str() {
            "Q1_A" => {
                scores.s += 1;
                scores.c += 1;
            }
            "Q1_B" => {
                scores.i += 1;
                scores.s += 1;
            }
            "Q1_C" => scores.d += 1,
            "Q2_A" => scores.c += 1,
            "Q2_B" => {
                scores.i += 1;
                scores.s += 1;
            }
            "Q2_C" => scores.d += 1,
            "Q3_A" => {
                scores.c += 1;
                scores.s += 1;
            }
            "Q3_B" => {
                scores.s += 1;
                scores.i += 1;
            }
            "Q3_C" => scores.d += 1,
            "Q4_A" => scores.c += 1,
            "Q4_B" => {
                scores.d += 1;
                scores.s += 1;
            }
            "Q4_C" => scores.i += 1,
            "Q5_A" => {
                scores.i += 1;
                scores.c += 1;
            }
            "Q5_B" => scores.d += 1,
            "Q5_C" => {
                scores.s += 1;
                scores.c += 1;
            }
            _ => {}
        }
    }
    scores
}

/// Buckets tied at the maximum total, in D, I, S, C order.
pub fn dominant_traits(scores: &TraitScores) -> Vec<&'static str> {
    let pairs = [
        ("D", scores.d),
        ("I", scores.i),
        ("S", scores.s),
        ("C", scores.c),
    ];
    let max = pairs.iter().map(|(_, v)| *v).max().unwrap_or(0);
    pairs
        .iter()
        .filter(|(_, v)| *v == max)
        .map(|(t, _)| *t)
        .collect()
}

/// Renders the candidate profile summary stored as `analise_perfil`.
pub fn profile_text(scores: &TraitScores) -> String {
    let mut text = String::from("Perfil do Candidato:\n");
    for (trait_name, value) in [
        ("D", scores.d),
        ("I", scores.i),
        ("S", scores.s),
        ("C", scores.c),
    ] {
        text.push_str(&format!("- {trait_name}: {value} pontos\n"));
    }
    let dominant = dominant_traits(scores);
    text.push_str(&format!("\nTraços dominantes: {}.\n", dominant.join(", ")));
    if dominant.contains(&"D") {
        text.push_str("Indica foco em resultados e proatividade.\n");
    }
    if dominant.contains(&"I") {
        text.push_str("Indica habilidade de comunicação e persuasão.\n");
    }
    if dominant.contains(&"S") {
        text.push_str("Indica estabilidade e paciência.\n");
    }
    if dominant.contains(&"C") {
        text.push_str("Indica atenção a detalhes e conformidade.\n");
    }
    text
}

/// Long message presenting scenario `q_idx` with its lettered options.
pub fn question_message(q_idx: usize) -> String {
    let question = &DISC_QUESTIONS[q_idx];
    let mut message = format!("Cenário: {}\n\nComo você agiria?\n", question.text);
    for (i, (_, title)) in question.options.iter().enumerate() {
        let label = (b'A' + i as u8) as char;
        message.push_str(&format!("{label}) {title}\n"));
    }
    message
}

/// Reply buttons for scenario `q_idx` ("Opção A".."Opção C").
pub fn question_buttons(q_idx: usize) -> Vec<MenuItem> {
    DISC_QUESTIONS[q_idx]
        .options
        .iter()
        .enumerate()
        .map(|(i, (id, _))| {
            let label = (b'A' + i as u8) as char;
            MenuItem::new(*id, format!("Opção {label}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn third_options_score_zero() {
        assert_eq!(score(&answers(&["Q1_C", "Q2_C", "Q3_C", "Q4_C", "Q5_C"])), 0);
        assert_eq!(score(&answers(&["Q1_A", "Q2_B", "Q3_A", "Q4_B", "Q5_A"])), 5);
        assert_eq!(score(&answers(&["Q1_A", "Q2_A", "Q3_A", "Q4_C", "Q5_C"])), 3);
    }

    #[test]
    fn unknown_answers_score_zero() {
        assert_eq!(score(&answers(&["Q9_Z"])), 0);
    }

    #[test]
    fn trait_totals_follow_the_contribution_table() {
        let scores = trait_scores(&answers(&["Q1_A", "Q2_B", "Q3_A", "Q4_B", "Q5_A"]));
        // Q1_A: S,C  Q2_B: I,S  Q3_A: C,S  Q4_B: D,S  Q5_A: I,C
        assert_eq!(
            scores,
            TraitScores {
                d: 1,
                i: 2,
                s: 4,
                c: 3
            }
        );
        assert_eq!(dominant_traits(&scores), vec!["S"]);
    }

    #[test]
    fn dominant_traits_keep_ties_in_bucket_order() {
        let scores = TraitScores {
            d: 2,
            i: 1,
            s: 2,
            c: 0,
        };
        assert_eq!(dominant_traits(&scores), vec!["D", "S"]);
    }

    #[test]
    fn profile_text_lists_every_bucket_and_dominants() {
        let scores = trait_scores(&answers(&["Q1_C", "Q2_C", "Q3_C", "Q4_C", "Q5_C"]));
        // All third options: D=3, I=1, S=1, C=1.
        let text = profile_text(&scores);
        assert!(text.starts_with("Perfil do Candidato:\n"));
        assert!(text.contains("- D: 3 pontos\n"));
        assert!(text.contains("Traços dominantes: D.\n"));
        assert!(text.contains("Indica foco em resultados e proatividade.\n"));
        assert!(!text.contains("Indica estabilidade"));
    }

    #[test]
    fn selection_resolves_only_within_its_question() {
        assert_eq!(match_selection(0, "Q1_B"), Some("Q1_B"));
        assert_eq!(match_selection(0, "Q2_A"), None);
        assert_eq!(match_selection(4, "Q5_C"), Some("Q5_C"));
        assert_eq!(match_selection(7, "Q1_A"), None);
    }

    #[test]
    fn question_message_letters_all_options() {
        let message = question_message(2);
        assert!(message.starts_with("Cenário: Uma chuva intensa"));
        assert!(message.contains("\n\nComo você agiria?\n"));
        assert!(message.contains("A) Imediatamente reduzo"));
        assert!(message.contains("C) Continuo a rota"));
    }

    #[test]
    fn question_buttons_carry_answer_ids() {
        let buttons = question_buttons(1);
        assert_eq!(buttons.len(), 3);
        assert_eq!(buttons[0].id, "Q2_A");
        assert_eq!(buttons[0].title, "Opção A");
        assert_eq!(buttons[2].id, "Q2_C");
        assert_eq!(buttons[2].title, "Opção C");
    }
}
