// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Input normalization: accent folding, yes/no detection, and the global
//! command vocabulary.

/// Folds Portuguese diacritics to ASCII ("não" -> "nao").
///
/// Other non-ASCII characters (emoji and the like) are dropped, matching
/// the behavior of an NFKD-normalize-then-ASCII pass.
pub fn fold_accents(text: &str) -> String {
    text.chars()
        .filter_map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => Some('a'),
            'Á' | 'À' | 'Â' | 'Ã' | 'Ä' => Some('A'),
            'é' | 'è' | 'ê' | 'ë' => Some('e'),
            'É' | 'È' | 'Ê' | 'Ë' => Some('E'),
            'í' | 'ì' | 'î' | 'ï' => Some('i'),
            'Í' | 'Ì' | 'Î' | 'Ï' => Some('I'),
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => Some('o'),
            'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => Some('O'),
            'ú' | 'ù' | 'û' | 'ü' => Some('u'),
            'Ú' | 'Ù' | 'Û' | 'Ü' => Some('U'),
            'ç' => Some('c'),
            'Ç' => Some('C'),
            'ñ' => Some('n'),
            'Ñ' => Some('N'),
            c if c.is_ascii() => Some(c),
            _ => None,
        })
        .collect()
}

/// Interprets an utterance as a yes/no answer, tolerant of accents and case.
pub fn normalize_yes_no(text: &str) -> Option<bool> {
    let t = fold_accents(text).trim().to_lowercase();
    match t.as_str() {
        "sim" | "s" | "ok" | "claro" | "yes" => Some(true),
        "nao" | "n" | "no" => Some(false),
        _ => None,
    }
}

/// Global commands checked before stage dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Menu,
    Voltar,
    Recomecar,
    Ajuda,
    Humano,
    Status,
    Comandos,
}

/// Parses a global command, accent-insensitive and lowercased.
pub fn parse_command(text: &str) -> Option<Command> {
    let t = fold_accents(text).trim().to_lowercase();
    match t.as_str() {
        "menu" => Some(Command::Menu),
        "voltar" => Some(Command::Voltar),
        "recomecar" => Some(Command::Recomecar),
        "ajuda" | "help" => Some(Command::Ajuda),
        "humano" | "atendente" | "suporte" => Some(Command::Humano),
        "status" | "progresso" => Some(Command::Status),
        "comandos" | "comando" | "help comandos" => Some(Command::Comandos),
        _ => None,
    }
}
