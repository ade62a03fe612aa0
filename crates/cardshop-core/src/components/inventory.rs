//! Back-room stock, the card collection, and the active deck.

use std::collections::BTreeMap;

use cardshop_logic::products::{ProductKind, Rarity};
use serde::{Deserialize, Serialize};

/// Identifier of a specific card (e.g. `c042`).
pub type CardId = String;

/// Sealed and bulk stock not yet on a shelf.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Inventory {
    pub boosters: u32,
    pub decks: u32,
    /// Bulk singles by rarity key.
    pub singles: BTreeMap<String, u32>,
}

impl Inventory {
    pub fn count(&self, product: ProductKind) -> u32 {
        match product {
            ProductKind::Booster => self.boosters,
            ProductKind::Deck => self.decks,
            ProductKind::Single(r) => self.singles.get(r.key()).copied().unwrap_or(0),
        }
    }

    pub fn add(&mut self, product: ProductKind, amount: u32) {
        match product {
            ProductKind::Booster => self.boosters = self.boosters.saturating_add(amount),
            ProductKind::Deck => self.decks = self.decks.saturating_add(amount),
            ProductKind::Single(r) => {
                let slot = self.singles.entry(r.key().to_string()).or_insert(0);
                *slot = slot.saturating_add(amount);
            }
        }
    }

    /// Remove up to `amount` units. Returns how many were actually removed.
    pub fn take(&mut self, product: ProductKind, amount: u32) -> u32 {
        let taken = amount.min(self.count(product));
        match product {
            ProductKind::Booster => self.boosters -= taken,
            ProductKind::Deck => self.decks -= taken,
            ProductKind::Single(r) => {
                if let Some(slot) = self.singles.get_mut(r.key()) {
                    *slot -= taken;
                }
            }
        }
        taken
    }

    pub fn total(&self) -> u64 {
        let singles: u64 = self.singles.values().map(|&n| u64::from(n)).sum();
        u64::from(self.boosters) + u64::from(self.decks) + singles
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedCard {
    pub rarity: Rarity,
    #[serde(default)]
    pub qty: u32,
}

/// Specific cards the player owns, keyed by card id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CardCollection {
    pub cards: BTreeMap<CardId, OwnedCard>,
}

impl CardCollection {
    pub fn add(&mut self, card_id: &str, rarity: Rarity, qty: u32) {
        if qty == 0 {
            return;
        }
        let entry = self
            .cards
            .entry(card_id.to_string())
            .or_insert(OwnedCard { rarity, qty: 0 });
        entry.qty = entry.qty.saturating_add(qty);
    }

    pub fn qty(&self, card_id: &str) -> u32 {
        self.cards.get(card_id).map_or(0, |c| c.qty)
    }

    pub fn rarity_of(&self, card_id: &str) -> Option<Rarity> {
        self.cards.get(card_id).map(|c| c.rarity)
    }

    /// Remove a single copy; the entry is dropped at zero.
    pub fn remove_one(&mut self, card_id: &str) -> bool {
        let Some(card) = self.cards.get_mut(card_id) else {
            return false;
        };
        if card.qty == 0 {
            return false;
        }
        card.qty -= 1;
        if card.qty == 0 {
            self.cards.remove(card_id);
        }
        true
    }

    /// Copies of `card_id` not committed to `deck`.
    pub fn spare(&self, card_id: &str, deck: &Deck) -> u32 {
        self.qty(card_id).saturating_sub(deck.count(card_id))
    }

    /// A card of `rarity` with a spare copy, in card id order.
    ///
    /// Cards not in `already_listed` are preferred so a shelf shows variety.
    pub fn listable_card(
        &self,
        rarity: Rarity,
        deck: &Deck,
        already_listed: &[CardId],
    ) -> Option<CardId> {
        let mut candidates = self
            .cards
            .iter()
            .filter(|(id, card)| card.rarity == rarity && self.spare(id, deck) > 0)
            .map(|(id, _)| id);
        let first = candidates.next()?;
        if !already_listed.contains(first) {
            return Some(first.clone());
        }
        let pick = candidates
            .find(|id| !already_listed.contains(*id))
            .unwrap_or(first);
        Some(pick.clone())
    }
}

/// The active deck: card id to number of copies committed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Deck {
    pub cards: BTreeMap<CardId, u32>,
}

impl Deck {
    pub fn count(&self, card_id: &str) -> u32 {
        self.cards.get(card_id).copied().unwrap_or(0)
    }

    pub fn set(&mut self, card_id: &str, count: u32) {
        if count == 0 {
            self.cards.remove(card_id);
        } else {
            self.cards.insert(card_id.to_string(), count);
        }
    }
}
