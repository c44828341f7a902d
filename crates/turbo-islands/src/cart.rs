//! Cart island over a narrow cart facade.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use rand::Rng;
use serde::Serialize;
use tokio::time::Instant;
use turbo_hydrate::Environment;

use crate::error::{IslandError, Result};
use crate::island::{ActionOutcome, IslandCore, IslandKind, Panel};

/// Product added by the `add` action.
pub const SAMPLE_PRODUCT: &str = "300938";

const ADD_SETTLE: Duration = Duration::from_millis(1000);
const ANALYZE_DELAY: Duration = Duration::from_millis(500);

/// A line in the active cart. Entry numbers are positional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartEntry {
    pub entry_number: usize,
    pub product_code: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

impl CartEntry {
    pub fn total_cents(&self) -> i64 {
        self.unit_price_cents * self.quantity as i64
    }
}

/// Snapshot of the active cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CartView {
    pub code: String,
    pub entries: Vec<CartEntry>,
}

impl CartView {
    pub fn total_items(&self) -> u32 {
        self.entries.iter().map(|e| e.quantity).sum()
    }

    pub fn total_cents(&self) -> i64 {
        self.entries.iter().map(CartEntry::total_cents).sum()
    }
}

/// Format cents as dollars.
pub fn format_price(cents: i64) -> String {
    format!("${}.{:02}", cents / 100, cents % 100)
}

/// The cart operations the island depends on.
pub trait CartFacade {
    /// Current contents of the active cart.
    fn active(&self) -> CartView;

    /// Add `quantity` of a product, merging with an existing entry.
    fn add_entry(&self, product_code: &str, quantity: u32) -> Result<()>;

    /// Set an entry's quantity.
    fn update_entry(&self, entry_number: usize, quantity: u32) -> Result<()>;

    /// Remove an entry.
    fn remove_entry(&self, entry_number: usize) -> Result<()>;

    /// Reload the active cart from its source.
    fn reload(&self);

    /// Whether a user is signed in.
    fn is_logged_in(&self) -> bool;
}

/// In-memory cart with a tiny fixed catalog.
pub struct MemoryCart {
    cart: RefCell<CartView>,
    logged_in: Cell<bool>,
    reloads: Cell<u32>,
}

impl MemoryCart {
    pub fn new() -> Self {
        Self {
            cart: RefCell::new(CartView {
                code: "00000001".to_string(),
                entries: Vec::new(),
            }),
            logged_in: Cell::new(false),
            reloads: Cell::new(0),
        }
    }

    pub fn set_logged_in(&self, logged_in: bool) {
        self.logged_in.set(logged_in);
    }

    pub fn reloads(&self) -> u32 {
        self.reloads.get()
    }

    fn lookup(code: &str) -> (String, i64) {
        match code {
            SAMPLE_PRODUCT => ("Photosmart E317 Digital Camera".to_string(), 11412),
            other => (format!("Product {}", other), 1000),
        }
    }

    fn renumber(entries: &mut [CartEntry]) {
        for (i, entry) in entries.iter_mut().enumerate() {
            entry.entry_number = i;
        }
    }
}

impl Default for MemoryCart {
    fn default() -> Self {
        Self::new()
    }
}

impl CartFacade for MemoryCart {
    fn active(&self) -> CartView {
        self.cart.borrow().clone()
    }

    fn add_entry(&self, product_code: &str, quantity: u32) -> Result<()> {
        if quantity == 0 {
            return Err(IslandError::invalid_argument("add", "quantity must be positive"));
        }
        let mut cart = self.cart.borrow_mut();
        if let Some(entry) = cart
            .entries
            .iter_mut()
            .find(|e| e.product_code == product_code)
        {
            entry.quantity += quantity;
            return Ok(());
        }
        let (product_name, unit_price_cents) = Self::lookup(product_code);
        let entry_number = cart.entries.len();
        cart.entries.push(CartEntry {
            entry_number,
            product_code: product_code.to_string(),
            product_name,
            quantity,
            unit_price_cents,
        });
        Ok(())
    }

    fn update_entry(&self, entry_number: usize, quantity: u32) -> Result<()> {
        if quantity == 0 {
            return self.remove_entry(entry_number);
        }
        let mut cart = self.cart.borrow_mut();
        let entry = cart
            .entries
            .get_mut(entry_number)
            .ok_or(IslandError::EntryNotFound(entry_number))?;
        entry.quantity = quantity;
        Ok(())
    }

    fn remove_entry(&self, entry_number: usize) -> Result<()> {
        let mut cart = self.cart.borrow_mut();
        if entry_number >= cart.entries.len() {
            return Err(IslandError::EntryNotFound(entry_number));
        }
        cart.entries.remove(entry_number);
        Self::renumber(&mut cart.entries);
        Ok(())
    }

    fn reload(&self) {
        self.reloads.set(self.reloads.get() + 1);
    }

    fn is_logged_in(&self) -> bool {
        self.logged_in.get()
    }
}

/// Simulated cart metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartMetrics {
    pub cart_load_ms: u64,
    pub api_calls: u32,
    pub cache_hits: u32,
}

#[derive(Debug, Default)]
struct CartState {
    adding: bool,
    metrics: Option<CartMetrics>,
}

#[derive(Serialize)]
struct CartPanelView {
    cart: CartView,
    total_items: u32,
    total_price: String,
    user_status: &'static str,
    adding: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    metrics: Option<CartMetrics>,
}

#[derive(Serialize)]
struct ExportedEntry {
    product: String,
    code: String,
    quantity: u32,
    price: String,
}

#[derive(Serialize)]
struct CartExport {
    cart_id: String,
    total_items: u32,
    total_price: String,
    entries: Vec<ExportedEntry>,
    exported_at: String,
    user_status: &'static str,
}

/// Interactive view over the active cart.
pub struct CartPanel {
    core: IslandCore,
    cart: Rc<dyn CartFacade>,
    state: Rc<RefCell<CartState>>,
}

impl CartPanel {
    pub fn new(env: &Environment, cart: Rc<dyn CartFacade>) -> Self {
        Self {
            core: IslandCore::new(IslandKind::Cart, env),
            cart,
            state: Rc::new(RefCell::new(CartState::default())),
        }
    }

    pub fn cart(&self) -> CartView {
        self.cart.active()
    }

    pub fn metrics(&self) -> Option<CartMetrics> {
        self.state.borrow().metrics.clone()
    }

    fn user_status(&self) -> &'static str {
        if self.cart.is_logged_in() {
            "logged-in"
        } else {
            "anonymous"
        }
    }

    fn add(&self) -> Result<ActionOutcome> {
        if self.state.borrow().adding {
            return Ok(ActionOutcome::ignored("adding"));
        }
        self.cart.add_entry(SAMPLE_PRODUCT, 1)?;
        self.state.borrow_mut().adding = true;
        tracing::debug!(product = SAMPLE_PRODUCT, "Adding sample product to cart");

        let state = Rc::clone(&self.state);
        self.core.tasks().spawn(async move {
            tokio::time::sleep(ADD_SETTLE).await;
            state.borrow_mut().adding = false;
        });
        Ok(ActionOutcome::Started)
    }

    fn clear(&self) -> Result<ActionOutcome> {
        let count = self.cart.active().entries.len();
        for entry_number in (0..count).rev() {
            self.cart.remove_entry(entry_number)?;
        }
        tracing::debug!(removed = count, "Cart cleared");
        Ok(ActionOutcome::Applied)
    }

    fn adjust(&self, name: &str, arg: Option<&str>) -> Result<ActionOutcome> {
        let entry_number: usize = arg
            .and_then(|a| a.trim().parse().ok())
            .ok_or_else(|| IslandError::invalid_argument(name, "expected an entry number"))?;
        let quantity = self
            .cart
            .active()
            .entries
            .get(entry_number)
            .map(|e| e.quantity)
            .ok_or(IslandError::EntryNotFound(entry_number))?;

        match name {
            "increase" => self.cart.update_entry(entry_number, quantity + 1)?,
            "decrease" => self.cart.update_entry(entry_number, quantity.saturating_sub(1))?,
            _ => self.cart.remove_entry(entry_number)?,
        }
        Ok(ActionOutcome::Applied)
    }

    fn analyze(&self) -> ActionOutcome {
        let state = Rc::clone(&self.state);
        let started = Instant::now();
        self.core.tasks().spawn(async move {
            tokio::time::sleep(ANALYZE_DELAY).await;
            let mut rng = rand::thread_rng();
            let metrics = CartMetrics {
                cart_load_ms: started.elapsed().as_millis() as u64,
                api_calls: rng.gen_range(5..15),
                cache_hits: rng.gen_range(10..30),
            };
            tracing::info!(?metrics, "Cart performance analysis complete");
            state.borrow_mut().metrics = Some(metrics);
        });
        ActionOutcome::Started
    }

    fn export(&self) -> Result<ActionOutcome> {
        let cart = self.cart.active();
        let export = CartExport {
            cart_id: cart.code.clone(),
            total_items: cart.total_items(),
            total_price: format_price(cart.total_cents()),
            entries: cart
                .entries
                .iter()
                .map(|e| ExportedEntry {
                    product: e.product_name.clone(),
                    code: e.product_code.clone(),
                    quantity: e.quantity,
                    price: format_price(e.total_cents()),
                })
                .collect(),
            exported_at: chrono::Utc::now().to_rfc3339(),
            user_status: self.user_status(),
        };
        Ok(ActionOutcome::Output(serde_json::to_string_pretty(&export)?))
    }
}

impl Panel for CartPanel {
    fn core(&self) -> &IslandCore {
        &self.core
    }

    fn actions(&self) -> &'static [&'static str] {
        &[
            "add", "clear", "refresh", "increase", "decrease", "remove", "analyze", "export",
        ]
    }

    fn on_mount(&self) {
        self.core.activate_after(Duration::ZERO);
        if self.core.hydration().is_active() {
            self.cart.reload();
        }
    }

    fn apply(&self, name: &str, arg: Option<&str>) -> Result<ActionOutcome> {
        match name {
            "add" => self.add(),
            "clear" => self.clear(),
            "refresh" => {
                self.cart.reload();
                Ok(ActionOutcome::Applied)
            }
            "increase" | "decrease" | "remove" => self.adjust(name, arg),
            "analyze" => Ok(self.analyze()),
            _ => self.export(),
        }
    }

    fn state(&self) -> Result<serde_json::Value> {
        let cart = self.cart.active();
        let state = self.state.borrow();
        Ok(serde_json::to_value(CartPanelView {
            total_items: cart.total_items(),
            total_price: format_price(cart.total_cents()),
            cart,
            user_status: self.user_status(),
            adding: state.adding,
            metrics: state.metrics.clone(),
        })?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::task::LocalSet;

    fn panel_with(cart: &Rc<MemoryCart>) -> CartPanel {
        let facade: Rc<dyn CartFacade> = cart.clone();
        let panel = CartPanel::new(&Environment::interactive(), facade);
        panel.on_mount();
        panel
    }

    // === Facade Tests ===

    #[test]
    fn test_memory_cart_merges_and_renumbers() {
        let cart = MemoryCart::new();
        cart.add_entry(SAMPLE_PRODUCT, 1).unwrap();
        cart.add_entry(SAMPLE_PRODUCT, 2).unwrap();
        cart.add_entry("1382080", 1).unwrap();

        let view = cart.active();
        assert_eq!(view.entries.len(), 2);
        assert_eq!(view.entries[0].quantity, 3);
        assert_eq!(view.total_items(), 4);

        cart.remove_entry(0).unwrap();
        assert_eq!(cart.active().entries[0].entry_number, 0);
        assert!(matches!(
            cart.remove_entry(5),
            Err(IslandError::EntryNotFound(5))
        ));
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(11412), "$114.12");
        assert_eq!(format_price(5), "$0.05");
    }

    // === Panel Tests ===

    #[test]
    fn test_mount_refreshes_cart() {
        let cart = Rc::new(MemoryCart::new());
        let _panel = panel_with(&cart);
        assert_eq!(cart.reloads(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_is_refused_while_adding() {
        LocalSet::new()
            .run_until(async {
                let cart = Rc::new(MemoryCart::new());
                let panel = panel_with(&cart);

                assert_eq!(panel.perform("add").unwrap(), ActionOutcome::Started);
                assert!(panel.perform("add").unwrap().is_ignored());
                assert_eq!(panel.cart().total_items(), 1);

                tokio::time::sleep(Duration::from_millis(1001)).await;
                panel.perform("add").unwrap();
                assert_eq!(panel.cart().total_items(), 2);
            })
            .await;
    }

    #[test]
    fn test_decrease_to_zero_removes_entry() {
        let cart = Rc::new(MemoryCart::new());
        cart.add_entry(SAMPLE_PRODUCT, 1).unwrap();
        let panel = panel_with(&cart);

        panel.perform("increase:0").unwrap();
        assert_eq!(panel.cart().entries[0].quantity, 2);
        panel.perform("decrease:0").unwrap();
        panel.perform("decrease:0").unwrap();
        assert!(panel.cart().entries.is_empty());
        assert!(matches!(
            panel.perform("remove:0"),
            Err(IslandError::EntryNotFound(0))
        ));
    }

    #[test]
    fn test_clear_removes_everything() {
        let cart = Rc::new(MemoryCart::new());
        cart.add_entry(SAMPLE_PRODUCT, 1).unwrap();
        cart.add_entry("1382080", 4).unwrap();
        let panel = panel_with(&cart);

        panel.perform("clear").unwrap();
        assert!(panel.cart().entries.is_empty());
    }

    #[test]
    fn test_export_document() {
        let cart = Rc::new(MemoryCart::new());
        cart.add_entry(SAMPLE_PRODUCT, 2).unwrap();
        cart.set_logged_in(true);
        let panel = panel_with(&cart);

        let ActionOutcome::Output(document) = panel.perform("export").unwrap() else {
            panic!("export should produce a document");
        };
        let json: serde_json::Value = serde_json::from_str(&document).unwrap();
        assert_eq!(json["total_items"], 2);
        assert_eq!(json["total_price"], "$228.24");
        assert_eq!(json["user_status"], "logged-in");
        assert!(json["exported_at"].is_string());
    }

    #[tokio::test(start_paused = true)]
    async fn test_analyze_reports_metrics() {
        LocalSet::new()
            .run_until(async {
                let cart = Rc::new(MemoryCart::new());
                let panel = panel_with(&cart);
                panel.perform("analyze").unwrap();
                assert!(panel.metrics().is_none());

                tokio::time::sleep(Duration::from_millis(501)).await;
                let metrics = panel.metrics().unwrap();
                assert_eq!(metrics.cart_load_ms, 500);
                assert!((5..15).contains(&metrics.api_calls));
                assert!((10..30).contains(&metrics.cache_hits));
            })
            .await;
    }
}
