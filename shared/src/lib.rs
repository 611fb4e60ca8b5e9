use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

mod money;

pub use money::{MoneyError, MoneyValue, DEFAULT_CURRENCY};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a fresh random identifier
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

entity_id!(
    /// Identifier of a transaction entry
    EntryId
);
entity_id!(
    /// Identifier of a category
    CategoryId
);
entity_id!(
    /// Identifier of a ledger
    LedgerId
);

/// The signed-in identity as reported by the auth collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub user_id: String,
    pub email: String,
    pub display_name: String,
    pub email_verified: bool,
    pub photo_url: Option<String>,
}

/// Authentication state of the current user.
///
/// Exactly one of the three states holds at any time; `Loading` is the state
/// before the auth collaborator has reported anything.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", content = "session", rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Loading,
    SignedOut,
    SignedIn(AuthSession),
}

impl SessionState {
    pub fn session(&self) -> Option<&AuthSession> {
        match self {
            SessionState::SignedIn(session) => Some(session),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading)
    }

    pub fn is_signed_in(&self) -> bool {
        matches!(self, SessionState::SignedIn(_))
    }
}

/// Severity of a transient status message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(name)
    }
}

/// A single income or expense record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    /// User that owns the entry
    pub owner_id: String,
    pub ledger_id: Option<LedgerId>,
    pub date: NaiveDate,
    pub detail: String,
    pub amount: MoneyValue,
    /// `true` for income, `false` for an expense
    pub is_positive: bool,
    pub note: Option<String>,
    pub category_id: Option<CategoryId>,
}

impl Entry {
    /// Materialize a submitted entry once the backend has assigned identity
    pub fn from_new(id: EntryId, owner_id: impl Into<String>, new_entry: NewEntry) -> Self {
        Self {
            id,
            owner_id: owner_id.into(),
            ledger_id: new_entry.ledger_id,
            date: new_entry.date,
            detail: new_entry.detail,
            amount: new_entry.amount,
            is_positive: new_entry.is_positive,
            note: new_entry.note,
            category_id: new_entry.category_id,
        }
    }

    /// Field values of this entry in submittable form
    pub fn to_new(&self) -> NewEntry {
        NewEntry {
            ledger_id: self.ledger_id,
            date: self.date,
            detail: self.detail.clone(),
            amount: self.amount.clone(),
            is_positive: self.is_positive,
            note: self.note.clone(),
            category_id: self.category_id,
        }
    }
}

/// Entry fields as submitted by the entry form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEntry {
    pub ledger_id: Option<LedgerId>,
    pub date: NaiveDate,
    pub detail: String,
    pub amount: MoneyValue,
    pub is_positive: bool,
    pub note: Option<String>,
    pub category_id: Option<CategoryId>,
}

/// A user-scoped tag for entries. Names are unique per owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub owner_id: String,
    pub name: String,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub color: Option<String>,
}

/// A named collection of entries with its own currency. Names are unique per owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    pub id: LedgerId,
    pub owner_id: String,
    pub name: String,
    pub currency_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLedger {
    pub name: String,
    pub currency_code: String,
}

impl NewLedger {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            currency_code: DEFAULT_CURRENCY.to_string(),
        }
    }
}
