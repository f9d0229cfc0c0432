use crate::database::Storage;
use crate::models::Invoice;
use crate::store::{StoreError, CURRENT_INVOICE_KEY};

/// Handle returned by `CurrentInvoice::subscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn FnMut(Option<&Invoice>)>;

/// The single "current invoice" slot of an editing session.
///
/// Every change goes through `set` (or `update` / `clear`, which call into
/// the same path): the value is mirrored as JSON into the session storage
/// area and then every subscriber is notified synchronously. Subscribers
/// only ever see a shared reference.
pub struct CurrentInvoice<S: Storage> {
    storage: S,
    current: Option<Invoice>,
    subscribers: Vec<(SubscriptionId, Callback)>,
    next_id: u64,
}

impl<S: Storage> CurrentInvoice<S> {
    /// An empty slot mirrored into `storage`. Call `restore` to pick up a
    /// draft left by an earlier run in the same session.
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            current: None,
            subscribers: Vec::new(),
            next_id: 0,
        }
    }

    pub fn get(&self) -> Option<&Invoice> {
        self.current.as_ref()
    }

    /// A copy of the current invoice to edit, or a fresh draft when the slot
    /// is empty
    pub fn draft(&self) -> Invoice {
        self.current.clone().unwrap_or_else(Invoice::new)
    }

    /// Replace the current invoice, mirror it and notify subscribers.
    /// When the mirror write fails the slot is left unchanged.
    pub fn set(&mut self, invoice: Invoice) -> Result<(), StoreError> {
        let json = serde_json::to_string(&invoice).map_err(|source| StoreError::SerializeError {
            key: CURRENT_INVOICE_KEY.to_string(),
            source,
        })?;
        self.storage.set_item(CURRENT_INVOICE_KEY, &json)?;

        self.current = Some(invoice);
        self.notify();
        Ok(())
    }

    /// Copy-on-write edit: clone the current value (or start a fresh
    /// draft), apply `edit` to the clone, then `set` it
    pub fn update<F>(&mut self, edit: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Invoice),
    {
        let mut draft = self.draft();
        edit(&mut draft);
        self.set(draft)
    }

    /// Empty the slot and drop the mirror
    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.storage.remove_item(CURRENT_INVOICE_KEY)?;
        self.current = None;
        self.notify();
        Ok(())
    }

    /// Load the mirrored draft back into the slot. Returns whether a draft
    /// was found. A mirror that no longer parses is logged and ignored.
    pub fn restore(&mut self) -> Result<bool, StoreError> {
        let Some(raw) = self.storage.get_item(CURRENT_INVOICE_KEY)? else {
            return Ok(false);
        };

        match serde_json::from_str::<Invoice>(&raw) {
            Ok(mut invoice) => {
                invoice.fill_defaults();
                self.current = Some(invoice);
                self.notify();
                Ok(true)
            }
            Err(e) => {
                log::warn!("Ignoring malformed current invoice in session storage: {}", e);
                Ok(false)
            }
        }
    }

    /// Register `callback`; it is called right away with the current value
    /// and again after every change
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(Option<&Invoice>) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;

        let mut callback: Callback = Box::new(callback);
        callback(self.current.as_ref());
        self.subscribers.push((id, callback));
        id
    }

    /// Returns whether the subscription existed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    fn notify(&mut self) {
        let current = self.current.as_ref();
        for (_, callback) in &mut self.subscribers {
            callback(current);
        }
    }
}
