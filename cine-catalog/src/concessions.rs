use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A purchasable food/drink add-on from the static catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Concession {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: i32,
}

#[derive(Debug, thiserror::Error)]
pub enum ConcessionError {
    #[error("Unknown concession: {0}")]
    UnknownConcession(String),

    #[error("Invalid quantity {0}: must not be negative")]
    InvalidQuantity(i32),
}

/// Static concession catalog.
#[derive(Debug, Clone)]
pub struct ConcessionCatalog {
    items: BTreeMap<String, Concession>,
}

impl ConcessionCatalog {
    pub fn new(items: Vec<Concession>) -> Self {
        Self {
            items: items.into_iter().map(|c| (c.id.clone(), c)).collect(),
        }
    }

    /// The concession menu sold at every cinema.
    pub fn standard() -> Self {
        Self::new(vec![
            Concession {
                id: "combo1".to_string(),
                name: "My Combo".to_string(),
                description: "1 Large Popcorn + 1 Large Drink. Your choice of flavor.".to_string(),
                price: 89_000,
            },
            Concession {
                id: "combo2".to_string(),
                name: "CGV Combo".to_string(),
                description: "1 Large Popcorn + 2 Large Drinks. Perfect for sharing.".to_string(),
                price: 109_000,
            },
            Concession {
                id: "nachos".to_string(),
                name: "Nachos".to_string(),
                description: "Crispy nachos with a delicious cheese sauce.".to_string(),
                price: 65_000,
            },
            Concession {
                id: "hotdog".to_string(),
                name: "Hot Dog".to_string(),
                description: "A classic cinema hot dog.".to_string(),
                price: 55_000,
            },
        ])
    }

    pub fn get(&self, id: &str) -> Option<&Concession> {
        self.items.get(id)
    }

    pub fn items(&self) -> impl Iterator<Item = &Concession> {
        self.items.values()
    }
}

/// One line in the ledger; quantity is always >= 1, zero-quantity entries
/// are removed instead of stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerEntry {
    pub quantity: u32,
    pub unit_price: i32,
}

/// Quantity map of selected concessions with prices captured from the
/// catalog at selection time.
#[derive(Debug, Clone, Default)]
pub struct ConcessionLedger {
    entries: BTreeMap<String, LedgerEntry>,
}

impl ConcessionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the quantity for a concession. Zero removes the entry; negative
    /// quantities are rejected.
    pub fn set_quantity(
        &mut self,
        catalog: &ConcessionCatalog,
        concession_id: &str,
        quantity: i32,
    ) -> Result<(), ConcessionError> {
        if quantity < 0 {
            return Err(ConcessionError::InvalidQuantity(quantity));
        }

        let concession = catalog
            .get(concession_id)
            .ok_or_else(|| ConcessionError::UnknownConcession(concession_id.to_string()))?;

        if quantity == 0 {
            self.entries.remove(concession_id);
        } else {
            self.entries.insert(
                concession_id.to_string(),
                LedgerEntry {
                    quantity: quantity as u32,
                    unit_price: concession.price,
                },
            );
        }
        Ok(())
    }

    /// Sum of price * quantity over all entries.
    pub fn total(&self) -> i32 {
        self.entries
            .values()
            .map(|e| e.unit_price * e.quantity as i32)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &LedgerEntry)> {
        self.entries.iter().map(|(id, e)| (id.as_str(), e))
    }
}
