//! The recommendation panel: which bundles to show and the content cards
//! inside them, fetched in the background as the panel opens.

use async_trait::async_trait;
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use crate::errors::WizardError;
use crate::wizard::WizardDocument;

/// Supplies the rendered card for one content item.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch_card(&self, content_id: u64) -> Result<String, WizardError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardSlot {
    Loading,
    Ready(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelItem {
    pub id: String,
    pub title: Option<String>,
    pub content: Option<String>,
    pub cards: Vec<(u64, CardSlot)>,
}

/// A fetch that finished and changed the panel it was started for.
/// `loaded` is false when the card failed and its slot was removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardArrival {
    pub generation: u64,
    pub item: usize,
    pub content_id: u64,
    pub loaded: bool,
}

#[derive(Default)]
struct PanelState {
    /// Bumped on every show and hide. A fetch started under an older
    /// generation must not touch the panel.
    generation: u64,
    items: Option<Vec<PanelItem>>,
}

pub struct Resolver {
    source: Arc<dyn ContentSource>,
    panel: Arc<Mutex<PanelState>>,
    pending: Vec<JoinHandle<()>>,
    arrivals: Option<UnboundedSender<CardArrival>>,
}

fn lock(panel: &Mutex<PanelState>) -> MutexGuard<'_, PanelState> {
    panel.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Resolver {
    pub fn new(source: Arc<dyn ContentSource>) -> Self {
        Self {
            source,
            panel: Arc::new(Mutex::new(PanelState::default())),
            pending: Vec::new(),
            arrivals: None,
        }
    }

    /// Reports every card arrival from now on. A later call replaces the
    /// earlier receiver.
    pub fn subscribe(&mut self) -> UnboundedReceiver<CardArrival> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.arrivals = Some(tx);
        rx
    }

    /// Opens the panel for `ids`, or for every recommendation when `ids` is
    /// empty. Unknown and repeated ids are skipped.
    pub fn show(&mut self, document: &WizardDocument, ids: &[String]) {
        let selected: Vec<_> = if ids.is_empty() {
            document.recommendations.iter().collect()
        } else {
            let mut seen = HashSet::new();
            ids.iter()
                .filter(|id| seen.insert(id.as_str()))
                .filter_map(|id| {
                    let found = document.recommendation(id);
                    if found.is_none() {
                        log::warn!("Skipping unknown recommendation '{}'.", id);
                    }
                    found
                })
                .collect()
        };

        let items: Vec<PanelItem> = selected
            .into_iter()
            .map(|rec| PanelItem {
                id: rec.id.clone(),
                title: rec.title.clone(),
                content: rec.content.clone(),
                cards: rec.content_ids.iter().map(|cid| (*cid, CardSlot::Loading)).collect(),
            })
            .collect();

        let fetches: Vec<(usize, u64)> = items
            .iter()
            .enumerate()
            .flat_map(|(index, item)| item.cards.iter().map(move |(cid, _)| (index, *cid)))
            .collect();

        let generation = {
            let mut panel = lock(&self.panel);
            panel.generation += 1;
            panel.items = Some(items);
            panel.generation
        };

        if fetches.is_empty() {
            return;
        }

        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                log::warn!("No async runtime available; recommendation cards will not be loaded.");
                let mut panel = lock(&self.panel);
                if let Some(items) = panel.items.as_mut() {
                    for item in items.iter_mut() {
                        item.cards.clear();
                    }
                }
                return;
            }
        };

        for (index, content_id) in fetches {
            let source = Arc::clone(&self.source);
            let panel = Arc::clone(&self.panel);
            let arrivals = self.arrivals.clone();
            self.pending.push(handle.spawn(async move {
                let result = source.fetch_card(content_id).await;
                let mut panel = lock(&panel);
                if panel.generation != generation {
                    log::debug!("Dropping card {} fetched for a panel that is gone.", content_id);
                    return;
                }
                let Some(item) = panel.items.as_mut().and_then(|items| items.get_mut(index)) else {
                    return;
                };
                let Some(slot) = item
                    .cards
                    .iter()
                    .position(|(cid, slot)| *cid == content_id && *slot == CardSlot::Loading)
                else {
                    return;
                };
                let loaded = match result {
                    Ok(html) => {
                        item.cards[slot].1 = CardSlot::Ready(html);
                        true
                    }
                    Err(e) => {
                        log::warn!("Could not load card {}: {}", content_id, e);
                        item.cards.remove(slot);
                        false
                    }
                };
                if let Some(arrivals) = arrivals {
                    let _ = arrivals.send(CardArrival {
                        generation,
                        item: index,
                        content_id,
                        loaded,
                    });
                }
            }));
        }
    }

    pub fn hide(&mut self) {
        let mut panel = lock(&self.panel);
        panel.generation += 1;
        panel.items = None;
    }

    pub fn snapshot(&self) -> Option<Vec<PanelItem>> {
        lock(&self.panel).items.clone()
    }

    /// The item and card HTML an arrival delivered, if the panel it was
    /// fetched for is still the one shown.
    pub fn arrived(&self, arrival: &CardArrival) -> Option<(PanelItem, String)> {
        let panel = lock(&self.panel);
        if panel.generation != arrival.generation || !arrival.loaded {
            return None;
        }
        let item = panel.items.as_ref()?.get(arrival.item)?;
        let html = item.cards.iter().find_map(|(cid, slot)| match slot {
            CardSlot::Ready(html) if *cid == arrival.content_id => Some(html.clone()),
            _ => None,
        })?;
        Some((item.clone(), html))
    }

    /// Waits for every fetch started so far.
    pub async fn settle(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        for result in join_all(pending).await {
            if let Err(e) = result {
                log::warn!("A card fetch task failed: {}", e);
            }
        }
    }
}
