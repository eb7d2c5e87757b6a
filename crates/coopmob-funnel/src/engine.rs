// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The funnel state machine.
//!
//! [`FunnelEngine::handle_delivery`] processes one normalized webhook
//! delivery end to end: claim the delivery id, load the sender's context,
//! walk the decision ladder, persist, prompt. Collaborator failures degrade
//! inside the engine (a failed send is logged and skipped, an unreachable
//! catalog reads as "no cities open"), so the caller can always acknowledge
//! the webhook.

use std::sync::Arc;
use std::time::Duration;

use coopmob_core::{
    AgentPort, AgentReply, CatalogPort, ChannelPort, ContextStore, InboundDelivery, LeadSink,
    Listing, MenuItem, MenuKind, MenuSnapshot, UserId, Utterance,
};
use coopmob_store::DedupGate;
use tracing::{debug, info, warn};

use crate::command::{Command, normalize_yes_no, parse_command};
use crate::context::{ContextHandle, LeadContext, VagaSnapshot, now_secs};
use crate::disc;
use crate::recorder::LeadRecorder;
use crate::script;
use crate::stage::Stage;

/// Flow tuning knobs, mapped from configuration by the binary.
#[derive(Debug, Clone)]
pub struct FunnelSettings {
    /// Run the three-message introduction before asking for the city.
    pub intro_before_city: bool,
    /// Invalid menu replies tolerated per stage before the overrun is logged.
    pub max_invalid_per_stage: u32,
    /// Off-context turns tolerated before the overrun is logged.
    pub max_off_context: u32,
    /// Silence after which the active menu is re-sent with a recap line.
    pub recap_after: Duration,
    /// Minimum gap between intro sends to one user.
    pub intro_debounce: Duration,
    /// Registration form link sent on hand-off and after a vacancy is chosen.
    pub registration_link: String,
    /// Lifetime of a conversation context in the store.
    pub lead_ttl: Duration,
    /// Replay window for delivery ids.
    pub seen_ttl: Duration,
}

impl Default for FunnelSettings {
    fn default() -> Self {
        Self {
            intro_before_city: true,
            max_invalid_per_stage: 2,
            max_off_context: 3,
            recap_after: Duration::from_secs(30 * 60),
            intro_debounce: Duration::from_secs(10),
            registration_link: "https://app.pipefy.com/public/form/v2m7kpB-".to_string(),
            lead_ttl: Duration::from_secs(30 * 24 * 60 * 60),
            seen_ttl: Duration::from_secs(300),
        }
    }
}

/// How one delivery was concluded, reported back in the webhook response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Processed and replied to.
    Handled,
    /// Nothing to do: empty text or an utterance we cannot dispatch.
    Ignored,
    /// The delivery id was already claimed within the replay window.
    Duplicate,
}

impl Disposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Disposition::Handled => "handled",
            Disposition::Ignored => "ignored",
            Disposition::Duplicate => "handled_duplicate",
        }
    }
}

/// The deterministic intake funnel, wired to its collaborators through the
/// port traits so tests can swap in fakes.
pub struct FunnelEngine {
    channel: Arc<dyn ChannelPort>,
    catalog: Arc<dyn CatalogPort>,
    agent: Option<Arc<dyn AgentPort>>,
    contexts: ContextHandle,
    dedup: DedupGate,
    recorder: LeadRecorder,
    settings: FunnelSettings,
}

impl FunnelEngine {
    pub fn new(
        channel: Arc<dyn ChannelPort>,
        catalog: Arc<dyn CatalogPort>,
        agent: Option<Arc<dyn AgentPort>>,
        store: Arc<dyn ContextStore>,
        sink: Option<Arc<dyn LeadSink>>,
        settings: FunnelSettings,
    ) -> Self {
        let contexts = ContextHandle::new(Arc::clone(&store), settings.lead_ttl);
        let dedup = DedupGate::new(Arc::clone(&store), settings.seen_ttl);
        let recorder = LeadRecorder::new(store, sink);
        Self {
            channel,
            catalog,
            agent,
            contexts,
            dedup,
            recorder,
            settings,
        }
    }

    /// Processes one delivery.
    ///
    /// A replay of an already-claimed delivery id returns immediately with
    /// zero side effects.
    pub async fn handle_delivery(&self, delivery: InboundDelivery) -> Disposition {
        if self.dedup.seen(&delivery.delivery_id).await {
            debug!(
                delivery_id = delivery.delivery_id.as_str(),
                user = %delivery.from,
                "duplicate delivery suppressed"
            );
            return Disposition::Duplicate;
        }
        self.process(delivery).await
    }

    /// The decision ladder, in fixed order: name capture, utterance
    /// normalization, first-contact bootstrap, terminal short-circuit, intro
    /// advance, intro decline, recap, global commands, city selection,
    /// in-stage rules, menu re-send, agent fallback.
    async fn process(&self, delivery: InboundDelivery) -> Disposition {
        let InboundDelivery {
            from: user,
            profile_name,
            utterance,
            ..
        } = delivery;
        let mut ctx = self.contexts.load(&user).await;

        // Display name from the channel profile, captured once.
        if ctx.nome.is_none() {
            if let Some(name) = profile_name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
            {
                ctx.nome = Some(name.to_string());
                self.contexts.save(&user, &ctx).await;
            }
        }

        // Voice notes are transcribed before dispatch; empty text is noise.
        let text = match &utterance {
            Utterance::Audio { media_id } => match self.transcribe_audio(media_id).await {
                Some(text) if !text.trim().is_empty() => text,
                _ => {
                    self.deliver_text(&user, script::AUDIO_NOT_UNDERSTOOD).await;
                    return Disposition::Ignored;
                }
            },
            other => match other.text() {
                Some(text) if !text.trim().is_empty() => text.to_string(),
                _ => return Disposition::Ignored,
            },
        };

        // First contact: open with the intro script, or go straight to the
        // city menu when the intro is disabled.
        let Some(stage) = ctx.stage else {
            ctx.invalid_count = 0;
            ctx.off_context_count = 0;
            ctx.last_message_at = Some(now_secs());
            if self.settings.intro_before_city {
                ctx.stage = Some(Stage::Intro(1));
                ctx.intro_idx = Some(1);
                self.contexts.save(&user, &ctx).await;
                self.send_intro(&user, &mut ctx, 1).await;
            } else {
                ctx.stage = Some(Stage::AwaitCity);
                self.contexts.save(&user, &ctx).await;
                self.send_city_menu(&user, &mut ctx, script::CITY_PROMPT).await;
            }
            return Disposition::Handled;
        };

        // Terminal: a fixed closing line, context untouched.
        if stage == Stage::Final {
            self.deliver_text(&user, script::CLOSING).await;
            return Disposition::Handled;
        }

        // A tapped Avançar, scoped to the intro; a stale tap from a later
        // stage falls through to the invalid-input path instead of dragging
        // the user back to city selection.
        if matches!(&utterance, Utterance::ButtonReply { id } if id == script::INTRO_NEXT_ID)
            && (stage.is_intro() || ctx.from_intro == Some(true))
        {
            return self.intro_advance(&user, &mut ctx).await;
        }

        // Declining during the intro: collect the city anyway, for the
        // future-opportunities registry.
        if stage.is_intro() && normalize_yes_no(&text) == Some(false) {
            ctx.stage = Some(Stage::AwaitCityReject);
            ctx.last_message_at = Some(now_secs());
            self.contexts.save(&user, &ctx).await;
            self.send_city_menu(&user, &mut ctx, script::CITY_REJECT_PROMPT)
                .await;
            return Disposition::Handled;
        }

        // Returning after a long pause: recap before dispatching the turn.
        // The resend also stands in for the invalid-input resend below, so
        // the same menu never goes out twice in one turn.
        let now = now_secs();
        let mut recap_resent = false;
        if let Some(last) = ctx.last_message_at {
            if now - last > self.settings.recap_after.as_secs_f64() && ctx.last_menu.is_some() {
                self.deliver_text(&user, script::RECAP).await;
                recap_resent = self.resend_last_menu(&user, &ctx).await;
            }
        }
        ctx.last_message_at = Some(now);

        // Global commands override in-stage rules; some fall through when
        // they have nothing to act on.
        if let Some(cmd) = parse_command(&text) {
            if let Some(disposition) = self.run_command(&user, &mut ctx, stage, cmd).await {
                return disposition;
            }
        }

        // City selection, exact match against the catalog.
        match stage {
            Stage::AwaitCity => {
                if let Some(cidade) = self.match_city_soft(&text).await {
                    self.city_selected(&user, &mut ctx, cidade).await;
                    return Disposition::Handled;
                }
            }
            Stage::AwaitCityReject => {
                if let Some(cidade) = self.match_city_soft(&text).await {
                    self.city_recorded_on_decline(&user, &mut ctx, cidade).await;
                    return Disposition::Handled;
                }
            }
            _ => {}
        }

        if let Some(disposition) = self.stage_rules(&user, &mut ctx, stage, &text).await {
            return disposition;
        }

        // Nothing matched. Re-issue the active menu verbatim; only when
        // there is no menu to re-send (or the send failed) does the turn go
        // to the conversational agent.
        let resent = recap_resent || self.resend_last_menu(&user, &ctx).await;
        if resent {
            ctx.invalid_count += 1;
            if ctx.invalid_count > self.settings.max_invalid_per_stage {
                info!(
                    user = %user,
                    stage = %stage,
                    count = ctx.invalid_count,
                    "invalid replies over cap"
                );
            }
            self.contexts.save(&user, &ctx).await;
            return Disposition::Handled;
        }

        ctx.off_context_count += 1;
        if ctx.off_context_count > self.settings.max_off_context {
            info!(
                user = %user,
                stage = %stage,
                count = ctx.off_context_count,
                "off-context turns over cap"
            );
        }
        self.contexts.save(&user, &ctx).await;
        self.agent_fallback(&user, stage, &text).await;
        Disposition::Handled
    }

    /// Handles one global command. `None` means the command had nothing to
    /// act on and the turn continues down the ladder.
    async fn run_command(
        &self,
        user: &UserId,
        ctx: &mut LeadContext,
        stage: Stage,
        cmd: Command,
    ) -> Option<Disposition> {
        match cmd {
            Command::Recomecar => {
                *ctx = LeadContext {
                    stage: Some(Stage::AwaitCity),
                    last_message_at: Some(now_secs()),
                    ..LeadContext::default()
                };
                info!(user = %user, "funnel restarted");
                self.contexts.save(user, ctx).await;
                self.send_city_menu(user, ctx, script::CITY_PROMPT).await;
                Some(Disposition::Handled)
            }
            Command::Menu => {
                ctx.last_menu.as_ref()?;
                self.deliver_text(user, script::MENU_AGAIN).await;
                self.resend_last_menu(user, ctx).await;
                self.contexts.save(user, ctx).await;
                Some(Disposition::Handled)
            }
            Command::Voltar => self.go_back(user, ctx, stage).await,
            Command::Ajuda => {
                self.deliver_text(user, &script::help_message(stage)).await;
                self.resend_last_menu(user, ctx).await;
                self.contexts.save(user, ctx).await;
                Some(Disposition::Handled)
            }
            Command::Comandos => {
                self.deliver_text(user, script::COMMAND_GUIDE).await;
                if ctx.last_menu.is_some() {
                    self.resend_last_menu(user, ctx).await;
                }
                self.contexts.save(user, ctx).await;
                Some(Disposition::Handled)
            }
            Command::Status => {
                self.deliver_text(user, &script::status_summary(ctx)).await;
                if ctx.last_menu.is_some() {
                    self.resend_last_menu(user, ctx).await;
                }
                self.contexts.save(user, ctx).await;
                Some(Disposition::Handled)
            }
            Command::Humano => {
                self.deliver_text(user, &script::human_handoff(&self.settings.registration_link))
                    .await;
                self.recorder.record(user, ctx).await;
                ctx.stage = Some(Stage::Final);
                self.contexts.save(user, ctx).await;
                info!(user = %user, "handed off to the team");
                Some(Disposition::Handled)
            }
        }
    }

    /// `voltar`: one step back along the static back-map, re-prompting the
    /// predecessor. The listings stage re-offers instead of re-opening the
    /// questionnaire; stages without a predecessor re-send their own menu.
    async fn go_back(
        &self,
        user: &UserId,
        ctx: &mut LeadContext,
        stage: Stage,
    ) -> Option<Disposition> {
        if stage == Stage::OfferPositions {
            if !self.resend_last_menu(user, ctx).await {
                self.send_vagas_menu(user, ctx).await;
            }
            self.contexts.save(user, ctx).await;
            return Some(Disposition::Handled);
        }

        let Some(previous) = stage.previous() else {
            if self.resend_last_menu(user, ctx).await {
                self.contexts.save(user, ctx).await;
                return Some(Disposition::Handled);
            }
            return None;
        };

        ctx.stage = Some(previous);
        ctx.invalid_count = 0;
        if let Stage::Intro(idx) = previous {
            ctx.intro_idx = Some(idx);
        }
        self.contexts.save(user, ctx).await;
        match previous {
            Stage::Intro(idx) => {
                self.send_intro(user, ctx, idx).await;
            }
            Stage::AwaitCity => {
                self.send_city_menu(user, ctx, script::CITY_PROMPT).await;
            }
            Stage::ReqMoto | Stage::ReqCnh | Stage::ReqAndroid => {
                self.send_requirement(user, ctx, previous).await;
            }
            Stage::DiscQuestion(idx) => {
                self.send_disc_question(user, ctx, idx as usize).await;
            }
            _ => {}
        }
        Some(Disposition::Handled)
    }

    /// Avançar (or an intro-stage "sim"): the next intro message, or the
    /// city menu once the script ran out.
    async fn intro_advance(&self, user: &UserId, ctx: &mut LeadContext) -> Disposition {
        ctx.last_message_at = Some(now_secs());
        if ctx.from_intro == Some(true) {
            ctx.stage = Some(Stage::AwaitCity);
            self.contexts.save(user, ctx).await;
            self.send_city_menu(user, ctx, script::CITY_PROMPT).await;
            return Disposition::Handled;
        }

        let next = ctx.intro_idx.unwrap_or(1) + 1;
        if next as usize <= script::INTRO_MESSAGES.len() {
            ctx.stage = Some(Stage::Intro(next));
            ctx.intro_idx = Some(next);
            self.contexts.save(user, ctx).await;
            self.send_intro(user, ctx, next).await;
        } else {
            ctx.stage = Some(Stage::AwaitCity);
            ctx.from_intro = Some(true);
            self.contexts.save(user, ctx).await;
            self.send_city_menu(user, ctx, script::CITY_PROMPT).await;
        }
        Disposition::Handled
    }

    /// In-stage deterministic rules. `None` means nothing matched and the
    /// turn falls to the menu-resend / fallback tail.
    async fn stage_rules(
        &self,
        user: &UserId,
        ctx: &mut LeadContext,
        stage: Stage,
        text: &str,
    ) -> Option<Disposition> {
        match stage {
            Stage::Intro(_) => {
                if normalize_yes_no(text) == Some(true) {
                    return Some(self.intro_advance(user, ctx).await);
                }
                None
            }
            Stage::ReqMoto => {
                let answer = normalize_yes_no(text)?;
                ctx.req_moto = Some(answer);
                ctx.stage = Some(Stage::ReqCnh);
                self.contexts.save(user, ctx).await;
                self.deliver_text(user, script::AFTER_MOTO).await;
                self.send_requirement(user, ctx, Stage::ReqCnh).await;
                Some(Disposition::Handled)
            }
            Stage::ReqCnh => {
                let answer = normalize_yes_no(text)?;
                ctx.req_cnh = Some(answer);
                ctx.stage = Some(Stage::ReqAndroid);
                self.contexts.save(user, ctx).await;
                self.deliver_text(user, script::AFTER_CNH).await;
                self.send_requirement(user, ctx, Stage::ReqAndroid).await;
                Some(Disposition::Handled)
            }
            Stage::ReqAndroid => {
                let answer = normalize_yes_no(text)?;
                ctx.req_android = Some(answer);
                let all_met =
                    ctx.req_moto == Some(true) && ctx.req_cnh == Some(true) && answer;
                if all_met {
                    ctx.stage = Some(Stage::DiscQuestion(0));
                    ctx.disc_answers.clear();
                    self.contexts.save(user, ctx).await;
                    self.deliver_text(user, script::DISC_INTRO).await;
                    self.send_disc_question(user, ctx, 0).await;
                } else {
                    ctx.stage = Some(Stage::Final);
                    self.contexts.save(user, ctx).await;
                    self.deliver_text(user, script::REQUIREMENTS_NOT_MET).await;
                    info!(user = %user, "requirements not met");
                }
                Some(Disposition::Handled)
            }
            Stage::DiscQuestion(q_idx) => {
                let answer = disc::match_selection(q_idx as usize, text)?;
                // Answers live at their question's position; re-answering
                // after voltar overwrites instead of appending.
                ctx.disc_answers.truncate(q_idx as usize);
                ctx.disc_answers.push(answer.to_string());
                let next = q_idx + 1;
                if (next as usize) < disc::DISC_QUESTIONS.len() {
                    ctx.stage = Some(Stage::DiscQuestion(next));
                    self.contexts.save(user, ctx).await;
                    self.send_disc_question(user, ctx, next as usize).await;
                } else {
                    self.finish_questionnaire(user, ctx).await;
                }
                Some(Disposition::Handled)
            }
            Stage::OfferPositions => Some(self.offer_selection(user, ctx, text).await),
            Stage::AwaitCity | Stage::AwaitCityReject | Stage::Final => None,
        }
    }

    /// A city chosen while the funnel is live: on to the requirements.
    async fn city_selected(&self, user: &UserId, ctx: &mut LeadContext, cidade: String) {
        info!(user = %user, cidade = cidade.as_str(), "city selected");
        ctx.cidade = Some(cidade);
        ctx.from_intro = None;
        ctx.stage = Some(Stage::ReqMoto);
        self.contexts.save(user, ctx).await;
        self.deliver_text(user, script::REQUIREMENTS_INTRO).await;
        self.send_requirement(user, ctx, Stage::ReqMoto).await;
    }

    /// A city given after declining: record the lead for future openings
    /// and close the conversation.
    async fn city_recorded_on_decline(
        &self,
        user: &UserId,
        ctx: &mut LeadContext,
        cidade: String,
    ) {
        ctx.cidade = Some(cidade.clone());
        ctx.aprovado = Some(false);
        self.contexts.save(user, ctx).await;
        self.deliver_text(user, &script::city_saved(&cidade)).await;
        self.recorder.record(user, ctx).await;
        ctx.stage = Some(Stage::Final);
        self.contexts.save(user, ctx).await;
    }

    /// Scores the finished questionnaire and branches on approval.
    async fn finish_questionnaire(&self, user: &UserId, ctx: &mut LeadContext) {
        let score = disc::score(&ctx.disc_answers);
        let traits = disc::trait_scores(&ctx.disc_answers);
        ctx.analise_perfil = Some(disc::profile_text(&traits));
        ctx.disc_score = Some(score);
        ctx.disc_trait_scores = Some(traits);
        let aprovado = score >= disc::APPROVAL_THRESHOLD;
        ctx.aprovado = Some(aprovado);
        self.contexts.save(user, ctx).await;
        info!(user = %user, score, aprovado, "questionnaire scored");

        if aprovado {
            self.deliver_text(user, script::APPROVED).await;
            self.send_vagas_menu(user, ctx).await;
            ctx.stage = Some(Stage::OfferPositions);
            self.contexts.save(user, ctx).await;
        } else {
            self.deliver_text(user, script::REJECTED).await;
            ctx.stage = Some(Stage::Final);
            self.contexts.save(user, ctx).await;
        }
    }

    /// A reply while vacancies are on offer: resolve it against the city's
    /// open listings, or re-offer the menu.
    async fn offer_selection(&self, user: &UserId, ctx: &mut LeadContext, text: &str) -> Disposition {
        let cidade = ctx.cidade.clone().unwrap_or_default();
        match self.find_listing(&cidade, text).await {
            Some(listing) => {
                let selected = script::listing_selected(
                    &listing.vaga_id,
                    &listing.farmacia,
                    &listing.turno,
                    &listing.taxa_entrega,
                );
                let confirmation = script::listing_confirmation(
                    &listing.vaga_id,
                    &self.settings.registration_link,
                );
                info!(user = %user, vaga_id = listing.vaga_id.as_str(), "vacancy chosen");
                ctx.vaga = Some(VagaSnapshot {
                    vaga_id: listing.vaga_id,
                    farmacia: listing.farmacia,
                    turno: listing.turno,
                    taxa_entrega: listing.taxa_entrega,
                });
                self.contexts.save(user, ctx).await;
                self.deliver_text(user, &selected).await;
                self.deliver_text(user, &confirmation).await;
                self.recorder.record(user, ctx).await;
                ctx.stage = Some(Stage::Final);
                self.contexts.save(user, ctx).await;
            }
            None => {
                ctx.invalid_count += 1;
                self.contexts.save(user, ctx).await;
                self.deliver_text(user, script::LISTING_MISMATCH).await;
                self.send_vagas_menu(user, ctx).await;
            }
        }
        Disposition::Handled
    }

    /// Off-script input with no menu to re-send: hand the turn to the agent
    /// and render its reply.
    async fn agent_fallback(&self, user: &UserId, stage: Stage, text: &str) {
        let Some(agent) = self.agent.as_ref() else {
            self.deliver_text(user, script::AGENT_FAILURE).await;
            return;
        };
        debug!(user = %user, stage = %stage, "agent fallback engaged");
        let stage_name = stage.to_string();
        match agent.ask(user, Some(&stage_name), text).await {
            Ok(reply) => self.render_agent_reply(user, reply).await,
            Err(error) => {
                warn!(user = %user, error = %error, "agent fallback failed");
                self.deliver_text(user, script::AGENT_FAILURE).await;
            }
        }
    }

    /// Renders an agent reply: plain text without options, buttons up to
    /// three, a list beyond. Agent menus are ephemeral and never become the
    /// stored last menu.
    async fn render_agent_reply(&self, user: &UserId, reply: AgentReply) {
        let options: Vec<String> = reply
            .options
            .unwrap_or_default()
            .into_iter()
            .map(|option| option.trim().to_string())
            .filter(|option| !option.is_empty())
            .collect();
        let content = reply.content.trim();

        if options.is_empty() {
            let body = if content.is_empty() {
                script::AGENT_EMPTY
            } else {
                content
            };
            self.deliver_text(user, body).await;
            return;
        }

        let body = if content.is_empty() {
            script::AGENT_OPTIONS_BODY
        } else {
            content
        };
        let items: Vec<MenuItem> = options
            .iter()
            .map(|option| MenuItem::new(option.clone(), option.clone()))
            .collect();
        let menu = if items.len() > 3 {
            MenuSnapshot {
                kind: MenuKind::List,
                body: body.to_string(),
                items,
                button_label: Some(script::DEFAULT_LIST_BUTTON.to_string()),
            }
        } else {
            MenuSnapshot {
                kind: MenuKind::Buttons,
                body: body.to_string(),
                items,
                button_label: None,
            }
        };
        self.deliver_menu(user, &menu).await;
    }

    /// Downloads and transcribes a voice note; any failure reads as "could
    /// not understand".
    async fn transcribe_audio(&self, media_id: &str) -> Option<String> {
        let media = match self.channel.download_media(media_id).await {
            Ok(media) => media,
            Err(error) => {
                warn!(error = %error, media_id, "media download failed");
                return None;
            }
        };
        let agent = self.agent.as_ref()?;
        match agent.transcribe(&media).await {
            Ok(text) => Some(text),
            Err(error) => {
                warn!(error = %error, media_id, "transcription failed");
                None
            }
        }
    }

    async fn match_city_soft(&self, label: &str) -> Option<String> {
        match self.catalog.match_city(label).await {
            Ok(matched) => matched,
            Err(error) => {
                warn!(error = %error, "city match failed");
                None
            }
        }
    }

    /// Resolves a listing from the menu row id or a typed "ID V001" label.
    async fn find_listing(&self, cidade: &str, input: &str) -> Option<Listing> {
        let trimmed = input.trim();
        let vaga_id = if trimmed.to_lowercase().starts_with("id ") {
            trimmed.split_whitespace().nth(1).unwrap_or(trimmed)
        } else {
            trimmed
        };
        let listings = match self.catalog.listings_for(cidade).await {
            Ok(listings) => listings,
            Err(error) => {
                warn!(error = %error, city = cidade, "listing lookup failed");
                return None;
            }
        };
        listings.into_iter().find(|l| l.vaga_id == vaga_id)
    }

    /// Intro message `idx`: the long text, then the compact button prompt.
    /// Debounced so channel redeliveries do not double-send the script.
    async fn send_intro(&self, user: &UserId, ctx: &mut LeadContext, idx: u8) {
        if let Some(sent_at) = ctx.intro_sent_at {
            if now_secs() - sent_at < self.settings.intro_debounce.as_secs_f64() {
                debug!(user = %user, idx, "intro send debounced");
                return;
            }
        }
        let nome = script::first_name(ctx.nome.as_deref());
        let Some(text) = script::intro_text(idx, &nome) else {
            return;
        };
        self.deliver_text(user, &text).await;
        let (body, buttons) = script::intro_buttons(idx);
        ctx.intro_sent_at = Some(now_secs());
        self.issue_menu(
            user,
            ctx,
            MenuSnapshot {
                kind: MenuKind::Buttons,
                body,
                items: buttons,
                button_label: None,
            },
        )
        .await;
    }

    /// The city menu, built from the catalog. An unreachable or empty
    /// catalog degrades to a plain unavailable line and leaves any previous
    /// menu in place.
    async fn send_city_menu(&self, user: &UserId, ctx: &mut LeadContext, prompt: &str) {
        let cities = match self.catalog.open_cities().await {
            Ok(cities) => cities,
            Err(error) => {
                warn!(user = %user, error = %error, "city catalog unavailable");
                Vec::new()
            }
        };
        if cities.is_empty() {
            self.deliver_text(user, script::CITIES_UNAVAILABLE).await;
            return;
        }
        let items: Vec<MenuItem> = cities
            .iter()
            .map(|city| MenuItem::new(city.clone(), city.clone()))
            .collect();
        let menu = if items.len() > 3 {
            MenuSnapshot {
                kind: MenuKind::List,
                body: prompt.to_string(),
                items,
                button_label: Some(script::CITY_MENU_BUTTON.to_string()),
            }
        } else {
            MenuSnapshot {
                kind: MenuKind::Buttons,
                body: prompt.to_string(),
                items,
                button_label: None,
            }
        };
        self.issue_menu(user, ctx, menu).await;
    }

    async fn send_requirement(&self, user: &UserId, ctx: &mut LeadContext, stage: Stage) {
        let Some(body) = script::requirement_question(stage) else {
            return;
        };
        self.issue_menu(
            user,
            ctx,
            MenuSnapshot {
                kind: MenuKind::Buttons,
                body: body.to_string(),
                items: script::yes_no_buttons(),
                button_label: None,
            },
        )
        .await;
    }

    async fn send_disc_question(&self, user: &UserId, ctx: &mut LeadContext, q_idx: usize) {
        self.deliver_text(user, &disc::question_message(q_idx)).await;
        self.issue_menu(
            user,
            ctx,
            MenuSnapshot {
                kind: MenuKind::Buttons,
                body: script::DISC_BUTTONS_BODY.to_string(),
                items: disc::question_buttons(q_idx),
                button_label: None,
            },
        )
        .await;
    }

    /// The open-listings menu for the user's city. An empty feed degrades
    /// to a plain text line without replacing the stored menu.
    async fn send_vagas_menu(&self, user: &UserId, ctx: &mut LeadContext) {
        let cidade = ctx.cidade.clone().unwrap_or_default();
        let listings = match self.catalog.listings_for(&cidade).await {
            Ok(listings) => listings,
            Err(error) => {
                warn!(user = %user, error = %error, "listing fetch failed");
                Vec::new()
            }
        };
        if listings.is_empty() {
            self.deliver_text(user, &script::no_listings(&cidade)).await;
            return;
        }
        let items: Vec<MenuItem> = listings
            .iter()
            .map(|listing| {
                MenuItem::new(listing.vaga_id.clone(), format!("ID {}", listing.vaga_id))
                    .with_description(format!(
                        "Turno: {} | Farmácia: {} | Taxa: {}",
                        listing.turno, listing.farmacia, listing.taxa_entrega
                    ))
            })
            .collect();
        self.issue_menu(
            user,
            ctx,
            MenuSnapshot {
                kind: MenuKind::List,
                body: script::LISTINGS_BODY.to_string(),
                items,
                button_label: Some(script::LISTINGS_BUTTON.to_string()),
            },
        )
        .await;
    }

    /// Stores `menu` as the user's active prompt, persists, then delivers.
    async fn issue_menu(&self, user: &UserId, ctx: &mut LeadContext, menu: MenuSnapshot) {
        ctx.last_menu = Some(menu);
        self.contexts.save(user, ctx).await;
        if let Some(menu) = &ctx.last_menu {
            self.deliver_menu(user, menu).await;
        }
    }

    /// Re-delivers the stored menu verbatim. False when there is none or
    /// the send failed.
    async fn resend_last_menu(&self, user: &UserId, ctx: &LeadContext) -> bool {
        match &ctx.last_menu {
            Some(menu) => self.deliver_menu(user, menu).await,
            None => false,
        }
    }

    /// Send policy lives here: a failed send is logged and the conversation
    /// carries on, it is never retried at the call site.
    async fn deliver_text(&self, to: &UserId, body: &str) -> bool {
        match self.channel.send_text(to, body).await {
            Ok(()) => true,
            Err(error) => {
                warn!(user = %to, error = %error, "text send failed");
                false
            }
        }
    }

    async fn deliver_menu(&self, to: &UserId, menu: &MenuSnapshot) -> bool {
        let result = match menu.kind {
            MenuKind::Buttons => self.channel.send_buttons(to, &menu.body, &menu.items).await,
            MenuKind::List => {
                let label = menu
                    .button_label
                    .as_deref()
                    .unwrap_or(script::DEFAULT_LIST_BUTTON);
                self.channel.send_list(to, &menu.body, &menu.items, label).await
            }
        };
        match result {
            Ok(()) => true,
            Err(error) => {
                warn!(user = %to, error = %error, "menu send failed");
                false
            }
        }
    }
}
