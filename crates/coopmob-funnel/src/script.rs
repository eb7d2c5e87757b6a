// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Every user-facing Portuguese string of the funnel, plus the intro script.
//!
//! Centralized so the engine reads as control flow and the copy can be
//! reviewed in one place. Strings are sent verbatim; only `{nome}` in the
//! intro script is substituted.

use coopmob_core::MenuItem;

use crate::context::LeadContext;
use crate::stage::Stage;

/// Fallback display name when the channel profile carries none.
pub const DEFAULT_NAME: &str = "candidato(a)";

/// Button id that advances the intro script.
pub const INTRO_NEXT_ID: &str = "intro_next";

/// Introduction script. `{nome}` is replaced with the first name.
pub const INTRO_MESSAGES: [&str; 3] = [
    "Olá, {nome}! 👋 Eu sou a Kelly, assistente de recrutamento da CoopMob, a cooperativa de entregadores parceira das farmácias da sua região.\n\nVou te acompanhar em um cadastro rápido: confirmo sua cidade, alguns requisitos e faço 5 perguntas sobre o seu dia a dia nas entregas. Leva menos de 10 minutos.",
    "Como cooperado da CoopMob, você escolhe as vagas e os turnos disponíveis na sua cidade e recebe a taxa de entrega de cada corrida, sem intermediários.\n\nPara participar, você precisa de moto própria com documentação em dia, CNH categoria A ativa e um celular Android.",
    "No final, se o seu perfil for aprovado, te mostro as vagas abertas na sua cidade e você escolhe a que preferir. Seus dados ficam guardados com segurança e são usados apenas para o processo de associação.\n\nPodemos começar?",
];

pub const INTRO_NEXT_LABEL: &str = "Avançar";
pub const INTRO_LAST_BODY: &str = "Deseja prosseguir?";

pub const AUDIO_NOT_UNDERSTOOD: &str =
    "Não consegui entender seu áudio. Pode escrever a mensagem?";

pub const CLOSING: &str = "O atendimento foi finalizado. Em breve, alguém da nossa equipe entrará em contato pelos canais oficiais de atendimento da CoopMob.";

pub const CITY_PROMPT: &str = "Antes de começarmos, preciso saber: \nEm qual cidade você atua como entregador?\nSelecione no menu abaixo";

pub const CITY_REJECT_PROMPT: &str =
    "Antes de encerrar, em qual cidade você atua como entregador?\nSelecione uma opção abaixo";

pub const CITIES_UNAVAILABLE: &str = "No momento, não consegui obter as cidades com vagas.";

pub const CITY_MENU_BUTTON: &str = "Ver cidades";

pub const REQUIREMENTS_INTRO: &str =
    "Perfeito! Antes de seguir, preciso confirmar alguns requisitos rápidos.";

pub const AFTER_MOTO: &str = "Ótimo, obrigada pela confirmação.";
pub const AFTER_CNH: &str = "Perfeito, mais uma pergunta rápida.";
pub const DISC_INTRO: &str =
    "Excelente! Agora vou fazer 5 perguntas rápidas para entender seu perfil.";
pub const REQUIREMENTS_NOT_MET: &str =
    "Obrigada pelo interesse. No momento, os requisitos necessários não foram atendidos.";

pub const DISC_BUTTONS_BODY: &str = "Selecione uma opção abaixo:";

pub const APPROVED: &str = "Parabéns! Você foi aprovado(a).";
pub const REJECTED: &str = "Obrigado por participar. Neste momento, não seguiremos adiante.";

pub const LISTINGS_BODY: &str = "Selecione uma vaga no menu abaixo 👇";
pub const LISTINGS_BUTTON: &str = "Ver vagas";
pub const LISTING_MISMATCH: &str =
    "Não entendi a vaga selecionada. Por favor, escolha uma das opções do menu de vagas.";

pub const RECAP: &str = "Retomando de onde paramos. Aqui estão as opções novamente 👇";
pub const MENU_AGAIN: &str = "Claro! Aqui estão as opções novamente 👇";

pub const AGENT_FAILURE: &str =
    "Não consegui processar sua mensagem agora. Tente novamente em instantes.";
pub const AGENT_EMPTY: &str = "Desculpe, não consegui entender.";
pub const AGENT_OPTIONS_BODY: &str = "Selecione uma opção:";

/// Default button label when re-sending a list menu without a stored one.
pub const DEFAULT_LIST_BUTTON: &str = "Ver opções";

pub const COMMAND_GUIDE: &str = "Guia rapido de comandos:\n\
- menu: reenvia o ultimo menu\n\
- voltar: volta uma etapa\n\
- recomecar: inicia do zero\n\
- status: mostra etapa, cidade, requisitos e progresso\n\
- ajuda: dica da etapa atual\n\
- humano: encaminhar para atendimento humano\n\n\
Dica: responda tocando nas opcoes quando possivel.";

/// First name used in greetings; whitespace-trimmed, first token only.
pub fn first_name(nome: Option<&str>) -> String {
    nome.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.split_whitespace().next())
        .unwrap_or(DEFAULT_NAME)
        .to_string()
}

/// Intro message `idx` (1-based) with the name substituted, if in range.
pub fn intro_text(idx: u8, nome: &str) -> Option<String> {
    if idx == 0 {
        return None;
    }
    INTRO_MESSAGES
        .get(idx as usize - 1)
        .map(|template| template.replace("{nome}", nome))
}

/// Compact follow-up body and buttons for intro message `idx`.
///
/// The last message asks for consent with Sim/Não; earlier messages carry
/// the advance button plus help.
pub fn intro_buttons(idx: u8) -> (String, Vec<MenuItem>) {
    if idx as usize == INTRO_MESSAGES.len() {
        (
            INTRO_LAST_BODY.to_string(),
            vec![MenuItem::new("Sim", "Sim"), MenuItem::new("Não", "Não")],
        )
    } else {
        (
            INTRO_NEXT_LABEL.to_string(),
            vec![
                MenuItem::new(INTRO_NEXT_ID, INTRO_NEXT_LABEL),
                MenuItem::new("ajuda", "Ajuda"),
            ],
        )
    }
}

/// Sim/Não reply buttons for the requirement questions.
pub fn yes_no_buttons() -> Vec<MenuItem> {
    vec![MenuItem::new("Sim", "Sim"), MenuItem::new("Não", "Não")]
}

/// Question body for a requirement stage.
pub fn requirement_question(stage: Stage) -> Option<&'static str> {
    match stage {
        Stage::ReqMoto => Some("Você possui moto própria com documentação em dia?"),
        Stage::ReqCnh => Some("Você possui CNH categoria A ativa?"),
        Stage::ReqAndroid => Some("Você possui um dispositivo Android para trabalhar?"),
        _ => None,
    }
}

/// Stage-specific hint for the `ajuda` command.
pub fn help_tip(stage: Stage) -> &'static str {
    match stage {
        Stage::AwaitCity => "Toque em uma das cidades do menu para continuar.",
        Stage::ReqMoto | Stage::ReqCnh | Stage::ReqAndroid => {
            "Responda tocando em Sim ou Não."
        }
        Stage::OfferPositions => "Toque em uma vaga do menu para selecionar.",
        _ => "Selecione uma opcao do menu abaixo.",
    }
}

pub fn help_message(stage: Stage) -> String {
    format!(
        "Ajuda: {}\nDigite 'comandos' para ver a lista completa de comandos.",
        help_tip(stage)
    )
}

pub fn city_saved(cidade: &str) -> String {
    format!("Obrigado! Cidade registrada: {cidade}. Seus dados foram salvos para futuras oportunidades.")
}

pub fn no_listings(cidade: &str) -> String {
    format!("Aprovado! Porém, não encontrei vagas listadas agora para {cidade}.")
}

pub fn human_handoff(link: &str) -> String {
    format!("Sem problemas! Vou pedir para nossa equipe te chamar. Você também pode preencher o formulário: {link}")
}

pub fn listing_selected(vaga_id: &str, farmacia: &str, turno: &str, taxa: &str) -> String {
    format!("Vaga selecionada:\n• ID: {vaga_id}\n• Farmácia: {farmacia}\n• Turno: {turno}\n• Taxa: {taxa}")
}

pub fn listing_confirmation(vaga_id: &str, link: &str) -> String {
    format!(
        "Excelente! Sua manifestação de interesse na vaga ID {vaga_id} foi registrada com sucesso.\n\
Para dar o próximo passo em sua jornada de associação à CoopMob, por favor, preencha o formulário de cadastro: {link}.\n\n\
Nossa equipe entrará em contato em breve para dar continuidade ao seu processo de ingresso na cooperativa. Agradecemos seu interesse em fazer parte da nossa comunidade de entregadores cooperados!"
    )
}

fn bool_mark(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "Sim",
        Some(false) => "Não",
        None => "—",
    }
}

/// Progress summary for the `status` command.
pub fn status_summary(ctx: &LeadContext) -> String {
    let nome = ctx.nome.as_deref().unwrap_or("Entregador(a)");
    let etapa = ctx
        .stage
        .and_then(|s| s.progress_label())
        .unwrap_or_else(|| "—".to_string());
    let cidade = ctx.cidade.as_deref().unwrap_or("—");
    let mut msg = format!(
        "Status de {nome}:\n\
• Etapa: {etapa}\n\
• Cidade: {cidade}\n\
• Requisitos: Moto: {}, CNH A: {}, Android: {}\n\
• DISC: {}/5 respondidas\n",
        bool_mark(ctx.req_moto),
        bool_mark(ctx.req_cnh),
        bool_mark(ctx.req_android),
        ctx.disc_answers.len(),
    );
    if let Some(score) = ctx.disc_score {
        msg.push_str(&format!("• Pontuação DISC: {score}\n"));
    }
    if let Some(analise) = &ctx.analise_perfil {
        msg.push_str(&format!("• Análise de Perfil:\n{analise}\n"));
    }
    msg.push_str("\nDicas: digite 'menu' para ver as opções, 'voltar' para a etapa anterior ou 'recomeçar' para iniciar do zero.");
    msg
}
