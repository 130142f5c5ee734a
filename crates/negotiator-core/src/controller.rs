//! Negotiator controller
//!
//! Owns the session state and turns UI events into service calls and board
//! updates:
//! - `refresh`: fetch identity, parties, templates and inbox; reconcile
//! - `offer.*`: send offers, acceptances, counter-offers and rejections
//! - `dialog.*`: open and close offer forms
//!
//! Events published on the bus are queued and handled by
//! [`Negotiator::process_pending`], one at a time.

use crate::board::Board;
use crate::bus::{Publisher, SubscriptionId};
use crate::config::{InboxMode, NegotiatorConfig};
use crate::error::NegotiatorError;
use crate::events::{UiEvent, TOPICS};
use crate::forms::{CounterOfferForm, Dialog, OfferForm, ValidationErrors};
use negotiator_client::{
    CounterOffer, NegotiationService, NegotiatorClient, OfferReply, OfferSubmission,
    TransportError,
};
use negotiator_contract::{Directory, Ledger, NegotiationId, Template, TrustedOffer};
use negotiator_inbox::{Card, CardKind, Reconciler, Section, StatusLevel};
use std::future::Future;
use tokio::sync::mpsc;

/// Outcome of one refresh
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Inbox entries served
    pub entries: usize,
    /// Patches applied to the board
    pub patches: usize,
    /// Entries dropped after retries
    pub dropped: usize,
    /// Reads that failed
    pub failed_reads: usize,
}

impl RefreshReport {
    fn record_failure(&mut self, endpoint: &str, error: &TransportError) {
        tracing::warn!("Failed to fetch {}: {}", endpoint, error);
        self.failed_reads += 1;
    }
}

/// Negotiation session controller
pub struct Negotiator<S> {
    config: NegotiatorConfig,
    service: S,
    reconciler: Reconciler,
    ledger: Ledger,
    directory: Directory,
    board: Board,
    bus: Publisher<UiEvent>,
    commands: mpsc::UnboundedReceiver<UiEvent>,
    inbox_offset: usize,
    dialog: Option<Dialog>,
}

impl<S> std::fmt::Debug for Negotiator<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Negotiator")
            .field("config", &self.config)
            .field("inbox_offset", &self.inbox_offset)
            .field("negotiations", &self.ledger.negotiation_count())
            .finish_non_exhaustive()
    }
}

impl Negotiator<NegotiatorClient> {
    /// Create controller talking HTTP to `config.base_url`
    ///
    /// # Errors
    /// Fails on invalid configuration or when the HTTP client cannot be
    /// built.
    pub fn connect(config: NegotiatorConfig) -> Result<Self, NegotiatorError> {
        config.validate()?;
        let client = NegotiatorClient::new(config.client_config())?;
        tracing::info!("Connecting to negotiation service at {}", config.base_url);
        Ok(Self::new(config, client))
    }
}

impl<S: NegotiationService> Negotiator<S> {
    /// Create controller over `service`
    #[must_use]
    pub fn new(config: NegotiatorConfig, service: S) -> Self {
        let (sender, commands) = mpsc::unbounded_channel();
        let mut bus = Publisher::new();
        for topic in TOPICS {
            let sender = sender.clone();
            bus.subscribe(topic, move |event: &UiEvent| {
                sender
                    .send(event.clone())
                    .map_err(|_| anyhow::anyhow!("command queue closed"))
            });
        }

        Self {
            reconciler: Reconciler::new(config.retry),
            config,
            service,
            ledger: Ledger::new(),
            directory: Directory::new(),
            board: Board::new(),
            bus,
            commands,
            inbox_offset: 0,
            dialog: None,
        }
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &NegotiatorConfig {
        &self.config
    }

    /// Underlying service
    #[inline]
    #[must_use]
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Definitions and negotiations learned so far
    #[inline]
    #[must_use]
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Identity, parties and templates
    #[inline]
    #[must_use]
    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    /// Card sections
    #[inline]
    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Number of inbox entries consumed in poll mode
    #[inline]
    #[must_use]
    pub fn inbox_offset(&self) -> usize {
        self.inbox_offset
    }

    /// Open dialog
    #[inline]
    #[must_use]
    pub fn dialog(&self) -> Option<&Dialog> {
        self.dialog.as_ref()
    }

    /// Open dialog, for filling in fields
    #[inline]
    pub fn dialog_mut(&mut self) -> Option<&mut Dialog> {
        self.dialog.as_mut()
    }

    /// Subscribe an additional observer to UI events
    pub fn subscribe<F>(&mut self, topic: &str, callback: F) -> SubscriptionId
    where
        F: Fn(&UiEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.bus.subscribe(topic, callback)
    }

    /// Publish an event; it is handled by the next [`Self::process_pending`]
    pub fn dispatch(&self, event: UiEvent) -> usize {
        self.bus.publish(event.topic(), &event)
    }

    /// Handle queued events in publication order
    ///
    /// Returns the number of events handled. Failures are logged.
    pub async fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.commands.try_recv() {
            self.handle(event).await;
            handled += 1;
        }
        handled
    }

    async fn handle(&mut self, event: UiEvent) {
        let topic = event.topic();
        let result = match event {
            UiEvent::Refresh => {
                self.refresh().await;
                Ok(())
            }
            UiEvent::ShowOfferDialog(template) => {
                self.open_offer_dialog(template);
                Ok(())
            }
            UiEvent::ShowCounterOfferDialog(id) => self.open_counter_dialog(id),
            UiEvent::HideDialog => {
                self.close_dialog();
                Ok(())
            }
            UiEvent::SubmitOffer(submission) => self.submit_offer(submission).await.map(drop),
            UiEvent::Accept(reply) => self.accept_reply(reply).await,
            UiEvent::Counter(counter) => self.counter_offer(counter).await,
            UiEvent::Reject(reply) => self.reject_reply(reply).await,
        };
        if let Err(e) = result {
            tracing::error!("Handling '{}' failed: {}", topic, e);
        }
    }

    /// Fetch identity, parties, templates and new inbox entries
    ///
    /// Requests run concurrently; a failed read is logged and leaves the
    /// previous state in place. Entries are reconciled after the reference
    /// data of the same refresh is applied.
    pub async fn refresh(&mut self) -> RefreshReport {
        let service = &self.service;
        let offset = self.inbox_offset;
        let mode = self.config.inbox_mode;
        let inbox = async move {
            match mode {
                InboxMode::Poll => service.inbox_entries(offset).await,
                InboxMode::Drain => service.drain_inbox().await,
            }
        };
        let (me, parties, templates, inbox) =
            tokio::join!(service.me(), service.parties(), service.templates(), inbox);

        let mut report = RefreshReport::default();

        match me {
            Ok(me) => {
                tracing::debug!("Identity is {} ({})", me.label, me.name);
                self.directory.set_me(me);
            }
            Err(e) => report.record_failure("/ui/me", &e),
        }
        match parties {
            Ok(parties) => self.directory.set_parties(parties),
            Err(e) => report.record_failure("/ui/parties", &e),
        }
        match templates {
            Ok(templates) => {
                let cards: Vec<Card> = templates
                    .iter()
                    .map(|template| Card::template(template, &self.ledger))
                    .collect();
                self.board.replace_section(Section::Templates, cards);
                self.directory.set_templates(templates);
            }
            Err(e) => report.record_failure("/ui/templates", &e),
        }
        match inbox {
            Ok(batch) => {
                if mode == InboxMode::Poll {
                    self.inbox_offset += batch.len;
                }
                report.entries = batch.len;
                let result =
                    self.reconciler
                        .reconcile(&mut self.ledger, &self.directory, batch.entries);
                report.patches = result.patches.len();
                report.dropped = result.dropped.len();
                for patch in result.patches {
                    self.board.apply(patch);
                }
                // Definitions may arrive a batch after the cards referencing them
                self.board.resolve_references(&self.ledger);
            }
            Err(e) => report.record_failure("/ui/inbox/entries", &e),
        }

        if report.entries > 0 {
            tracing::info!(
                "Refreshed: {} entries, {} patches, {} dropped",
                report.entries,
                report.patches,
                report.dropped
            );
        }
        report
    }

    /// Send a new offer and show it as sent
    ///
    /// # Errors
    /// Fails when the identity is unknown, the request fails or the sent
    /// card cannot be rendered.
    pub async fn submit_offer(
        &mut self,
        submission: OfferSubmission,
    ) -> Result<NegotiationId, NegotiatorError> {
        let me = self
            .directory
            .me()
            .ok_or(NegotiatorError::IdentityUnknown)?
            .name
            .clone();
        let receipt = self.service.submit_offer(&submission).await?;
        tracing::info!(
            "Offered {} to {} as negotiation {}",
            submission.template.label,
            submission.receiver,
            receipt.id
        );

        let offer = submission.to_trusted_offer(&me);
        let card = Card::sent(
            CardKind::OfferSent,
            receipt.id,
            &offer,
            &submission.receiver,
            &self.directory,
            &self.ledger,
        )?;
        self.board.prepend(Section::Inbox, card);
        Ok(receipt.id)
    }

    /// Accept the latest offer of negotiation `id`
    ///
    /// # Errors
    /// Fails when no offer is known for `id`, or as [`Self::accept_reply`].
    pub async fn accept(&mut self, id: NegotiationId) -> Result<(), NegotiatorError> {
        let offer = self.latest_offer(id)?;
        self.accept_reply(OfferReply::new(id, offer)).await
    }

    /// Accept an offer
    ///
    /// The inbox card is replaced and the contract saved before the request
    /// is sent; a failed request sets the error status of the new card.
    ///
    /// # Errors
    /// Fails when the cards cannot be rendered or the request fails.
    pub async fn accept_reply(&mut self, reply: OfferReply) -> Result<(), NegotiatorError> {
        let OfferReply { id, offer } = &reply;
        let sent = Card::sent(
            CardKind::AcceptSent,
            *id,
            offer,
            &offer.offeror_name,
            &self.directory,
            &self.ledger,
        )?;
        let contract = Card::contract(*id, offer, &self.directory, &self.ledger)?;

        self.replace_inbox_card(*id, sent);
        self.board.prepend(Section::Contracts, contract);

        let result = self.service.accept(&reply).await;
        self.route_write_result(*id, result)
    }

    /// Send a counter-offer
    ///
    /// # Errors
    /// Fails when the card cannot be rendered or the request fails.
    pub async fn counter_offer(&mut self, counter: CounterOffer) -> Result<(), NegotiatorError> {
        let id = counter.negotiation_id;
        let offer = counter.to_trusted_offer();
        let sent = Card::sent(
            CardKind::CounterOfferSent,
            id,
            &offer,
            &offer.receiver_name,
            &self.directory,
            &self.ledger,
        )?;
        self.replace_inbox_card(id, sent);

        let result = self.service.counter_offer(&counter).await;
        self.route_write_result(id, result)
    }

    /// Reject the latest offer of negotiation `id`
    ///
    /// # Errors
    /// Fails when no offer is known for `id`, or as [`Self::reject_reply`].
    pub async fn reject(&mut self, id: NegotiationId) -> Result<(), NegotiatorError> {
        let offer = self.latest_offer(id)?;
        self.reject_reply(OfferReply::new(id, offer)).await
    }

    /// Reject an offer
    ///
    /// # Errors
    /// Fails when the card cannot be rendered or the request fails.
    pub async fn reject_reply(&mut self, reply: OfferReply) -> Result<(), NegotiatorError> {
        let OfferReply { id, offer } = &reply;
        let sent = Card::sent(
            CardKind::RejectSent,
            *id,
            offer,
            &offer.offeror_name,
            &self.directory,
            &self.ledger,
        )?;
        self.replace_inbox_card(*id, sent);

        let result = self.service.reject(&reply).await;
        self.route_write_result(*id, result)
    }

    /// Open the offer dialog for `template`
    pub fn open_offer_dialog(&mut self, template: Template) {
        tracing::debug!("Opening offer dialog for {}", template.name);
        self.dialog = Some(Dialog::Offer(OfferForm::new(
            template,
            &self.directory,
            &self.ledger,
        )));
    }

    /// Open the counter-offer dialog for negotiation `id`
    ///
    /// # Errors
    /// Fails when no offer is known for `id` or the form cannot be built.
    pub fn open_counter_dialog(&mut self, id: NegotiationId) -> Result<(), NegotiatorError> {
        let offer = self.latest_offer(id)?;
        let form = CounterOfferForm::new(id, offer, &self.directory, &self.ledger)?;
        self.dialog = Some(Dialog::CounterOffer(form));
        Ok(())
    }

    /// Close the open dialog
    pub fn close_dialog(&mut self) {
        self.dialog = None;
    }

    /// Validate the open dialog and, when valid, publish its submission
    /// followed by `dialog.hide`
    ///
    /// Returns `Ok(false)` when no dialog is open.
    ///
    /// # Errors
    /// Returns the invalid fields; the dialog stays open.
    pub fn submit_dialog(&mut self) -> Result<bool, ValidationErrors> {
        let event = match self.dialog.as_mut() {
            None => return Ok(false),
            Some(Dialog::Offer(form)) => UiEvent::SubmitOffer(form.validate()?),
            Some(Dialog::CounterOffer(form)) => UiEvent::Counter(form.validate()?),
        };
        self.dispatch(event);
        self.dispatch(UiEvent::HideDialog);
        Ok(true)
    }

    /// Refresh every poll interval until `shutdown` completes
    pub async fn watch<F: Future<Output = ()>>(&mut self, shutdown: F) {
        let mut interval = tokio::time::interval(self.config.poll_interval());
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("Stopping watch");
                    break;
                }
                _ = interval.tick() => {
                    self.dispatch(UiEvent::Refresh);
                    self.process_pending().await;
                }
            }
        }
    }

    fn latest_offer(&self, id: NegotiationId) -> Result<TrustedOffer, NegotiatorError> {
        self.ledger
            .negotiation(id)
            .and_then(|negotiation| negotiation.latest_offer())
            .cloned()
            .ok_or(NegotiatorError::UnknownNegotiation(id))
    }

    fn replace_inbox_card(&mut self, id: NegotiationId, card: Card) {
        self.board.remove_first(Section::Inbox, id);
        self.board.prepend(Section::Inbox, card);
    }

    /// Set the error status of the negotiation's inbox card, else log
    fn route_write_result(
        &mut self,
        id: NegotiationId,
        result: Result<(), TransportError>,
    ) -> Result<(), NegotiatorError> {
        let Err(error) = result else {
            return Ok(());
        };
        let message = format!("{}: {}", error.kind(), error);
        match self.board.find_by_negotiation(Section::Inbox, id) {
            Some(handle) => {
                self.board.set_status(handle, StatusLevel::Error, message);
            }
            None => tracing::error!("Negotiation {} request failed: {}", id, message),
        }
        Err(error.into())
    }
}

