//! Deterministic in-memory backend.
//!
//! Implements [`Backend`] with no network and no randomness: sequential
//! preorder ids, call counters, and per-call failure injection. The money
//! arithmetic matches the real backend (item prices × quantities plus a flat
//! surcharge; authoritative balance enforcement on debit) so the submission
//! scenarios exercise the same totals the production flow would see.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use chrono::Utc;
use ctn_backend::{Backend, BackendError, BackendResult, CatalogFilter, NewPreorder};
use ctn_schemas::{CatalogItem, Money, Preorder, Student};

#[derive(Debug, Default)]
struct State {
    catalog: Vec<CatalogItem>,
    students: Vec<Student>,
    blocked: HashMap<i64, HashSet<i64>>,
    preorders: Vec<Preorder>,
    next_preorder_id: i64,

    create_calls: u32,
    debit_calls: u32,
    catalog_calls: u32,
    blocked_calls: u32,

    fail_next_create: Option<BackendError>,
    fail_next_debit: Option<BackendError>,
    fail_catalog: Option<BackendError>,
    fail_blocked: Option<BackendError>,
}

/// In-memory [`Backend`] for scenario tests.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    state: Mutex<State>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_preorder_id: 1,
                ..State::default()
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("testkit state mutex poisoned")
    }

    // -----------------------------------------------------------------------
    // Seeding
    // -----------------------------------------------------------------------

    pub fn seed_item(&self, item: CatalogItem) -> &Self {
        self.lock().catalog.push(item);
        self
    }

    pub fn seed_student(&self, student: Student) -> &Self {
        self.lock().students.push(student);
        self
    }

    /// Block `item_id` for `student_id`.
    pub fn block_item(&self, student_id: i64, item_id: i64) -> &Self {
        self.lock()
            .blocked
            .entry(student_id)
            .or_default()
            .insert(item_id);
        self
    }

    // -----------------------------------------------------------------------
    // Failure injection
    // -----------------------------------------------------------------------

    /// Fail the next `create_preorder` call with `err`.
    pub fn fail_next_create(&self, err: BackendError) {
        self.lock().fail_next_create = Some(err);
    }

    /// Fail the next `debit_balance` call with `err` — the partial-failure
    /// window.
    pub fn fail_next_debit(&self, err: BackendError) {
        self.lock().fail_next_debit = Some(err);
    }

    /// Fail every `fetch_catalog` call with `err` until cleared with `None`.
    pub fn fail_catalog(&self, err: Option<BackendError>) {
        self.lock().fail_catalog = err;
    }

    /// Fail every `fetch_blocked_items` call with `err` until cleared.
    pub fn fail_blocked(&self, err: Option<BackendError>) {
        self.lock().fail_blocked = err;
    }

    // -----------------------------------------------------------------------
    // Assertions
    // -----------------------------------------------------------------------

    pub fn create_calls(&self) -> u32 {
        self.lock().create_calls
    }

    pub fn debit_calls(&self) -> u32 {
        self.lock().debit_calls
    }

    pub fn catalog_calls(&self) -> u32 {
        self.lock().catalog_calls
    }

    pub fn blocked_calls(&self) -> u32 {
        self.lock().blocked_calls
    }

    /// Stored preorder by id, if any.
    pub fn preorder(&self, id: i64) -> Option<Preorder> {
        self.lock().preorders.iter().find(|p| p.id == id).cloned()
    }

    pub fn preorder_count(&self) -> usize {
        self.lock().preorders.len()
    }

    /// Current stored balance for a student.
    pub fn balance_of(&self, student_id: i64) -> Option<Money> {
        self.lock()
            .students
            .iter()
            .find(|s| s.id == student_id)
            .map(|s| s.balance)
    }
}

#[async_trait::async_trait]
impl Backend for InMemoryBackend {
    async fn fetch_catalog(&self, filter: &CatalogFilter) -> BackendResult<Vec<CatalogItem>> {
        let mut st = self.lock();
        st.catalog_calls += 1;
        if let Some(err) = st.fail_catalog.clone() {
            return Err(err);
        }
        let items = st
            .catalog
            .iter()
            .filter(|item| {
                if let Some(ref name) = filter.name {
                    if !item.name.to_lowercase().contains(&name.to_lowercase()) {
                        return false;
                    }
                }
                if let Some(ref cat) = filter.category {
                    if &item.category != cat {
                        return false;
                    }
                }
                true
            })
            .cloned()
            .collect();
        Ok(items)
    }

    async fn fetch_blocked_items(&self, student_id: i64) -> BackendResult<Vec<i64>> {
        let mut st = self.lock();
        st.blocked_calls += 1;
        if let Some(err) = st.fail_blocked.clone() {
            return Err(err);
        }
        let mut ids: Vec<i64> = st
            .blocked
            .get(&student_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn find_student_by_cedula(&self, cedula: &str) -> BackendResult<Student> {
        let st = self.lock();
        st.students
            .iter()
            .find(|s| s.cedula == cedula)
            .cloned()
            .ok_or(BackendError::Status {
                status: 404,
                detail: format!("Estudiante con cédula {cedula} no encontrado"),
            })
    }

    async fn create_preorder(&self, req: &NewPreorder) -> BackendResult<Preorder> {
        let mut st = self.lock();
        st.create_calls += 1;
        if let Some(err) = st.fail_next_create.take() {
            return Err(err);
        }
        if !st.students.iter().any(|s| s.id == req.student_id) {
            return Err(BackendError::Status {
                status: 404,
                detail: format!("Estudiante con ID {} no encontrado", req.student_id),
            });
        }

        // Recompute the authoritative total from stored prices, exactly as
        // the real service does; the client's local estimate is ignored.
        let mut item_total = Money::ZERO;
        for line in &req.lines {
            let item = st
                .catalog
                .iter()
                .find(|i| i.id == line.item_id)
                .ok_or_else(|| BackendError::Status {
                    status: 404,
                    detail: format!("Producto con ID {} no encontrado", line.item_id),
                })?;
            if item.stock < line.quantity {
                return Err(BackendError::Status {
                    status: 400,
                    detail: format!("Stock insuficiente para {}", item.name),
                });
            }
            let line_total =
                item.price
                    .checked_mul_qty(line.quantity)
                    .ok_or(BackendError::Status {
                        status: 400,
                        detail: "total fuera de rango".to_string(),
                    })?;
            item_total += line_total;
        }
        for line in &req.lines {
            if let Some(item) = st.catalog.iter_mut().find(|i| i.id == line.item_id) {
                item.stock -= line.quantity;
            }
        }

        let id = st.next_preorder_id;
        st.next_preorder_id += 1;
        let order = Preorder {
            id,
            student_id: req.student_id,
            total: item_total + req.surcharge,
            surcharge: req.surcharge,
            created_at: Utc::now(),
            delivered: false,
            delivered_at: None,
        };
        st.preorders.push(order.clone());
        Ok(order)
    }

    async fn debit_balance(&self, student_id: i64, amount: Money) -> BackendResult<Student> {
        let mut st = self.lock();
        st.debit_calls += 1;
        if let Some(err) = st.fail_next_debit.take() {
            return Err(err);
        }
        let student = st
            .students
            .iter_mut()
            .find(|s| s.id == student_id)
            .ok_or_else(|| BackendError::Status {
                status: 404,
                detail: format!("Estudiante con ID {student_id} no encontrado"),
            })?;
        if amount > student.balance {
            return Err(BackendError::Status {
                status: 400,
                detail: "Saldo insuficiente".to_string(),
            });
        }
        student.balance -= amount;
        Ok(student.clone())
    }

    async fn pending_preorders(&self, student_id: i64) -> BackendResult<Vec<Preorder>> {
        let st = self.lock();
        Ok(st
            .preorders
            .iter()
            .filter(|p| p.student_id == student_id && !p.delivered)
            .cloned()
            .collect())
    }

    async fn mark_delivered(&self, preorder_id: i64) -> BackendResult<Preorder> {
        let mut st = self.lock();
        let order = st
            .preorders
            .iter_mut()
            .find(|p| p.id == preorder_id)
            .ok_or_else(|| BackendError::Status {
                status: 404,
                detail: format!("Precompra con ID {preorder_id} no encontrada"),
            })?;
        if order.delivered {
            return Err(BackendError::Status {
                status: 409,
                detail: format!("Precompra {preorder_id} ya fue entregada"),
            });
        }
        order.delivered = true;
        order.delivered_at = Some(Utc::now());
        Ok(order.clone())
    }
}
