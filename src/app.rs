//! Application context and command dispatcher.
//!
//! `OrderDesk` owns every piece of mutable desk state. Input arrives as a
//! [`Command`]; each dispatch returns the [`UiUpdate`]s the presenter should
//! render. Nothing here knows how the updates are drawn.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::api::OrderApi;
use crate::detail::{DetailView, ModalView};
use crate::modal::{ConfirmationModal, ModalAction};
use crate::models::OrderSummary;
use crate::order_list::{ListChange, OrderListModel, OrderRow};
use crate::printer::ReceiptPrinter;
use crate::sync::{poll_once, DiffMode, SyncEvent, SyncState};

pub const PRINT_ERROR_BANNER: &str =
    "Oops, ocurrio un error al imprimir el recibo. Por favor, intente de nuevo.";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Periodic poll.
    Tick,
    Reload,
    Consult(String),
    /// Delete straight from a list row, without the modal.
    DeleteRow(String),
    Modal(ModalAction),
    DismissBanner,
    ShowList,
    Quit,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UiUpdate {
    RowAdded(OrderRow),
    RowRemoved(String),
    ModalOpened(ModalView),
    ModalClosed,
    BannerShown(String),
    BannerHidden,
    Notice(String),
    ListSnapshot(Vec<OrderRow>),
}

impl From<ListChange> for UiUpdate {
    fn from(change: ListChange) -> Self {
        match change {
            ListChange::Inserted(row) => UiUpdate::RowAdded(row),
            ListChange::Removed(id) => UiUpdate::RowRemoved(id),
        }
    }
}

pub struct OrderDesk {
    api: Arc<dyn OrderApi>,
    printer: ReceiptPrinter,
    diff_mode: DiffMode,
    sync: SyncState,
    list: OrderListModel,
    detail: DetailView,
    modal: ConfirmationModal,
    banner: Option<String>,
}

impl OrderDesk {
    pub fn new(api: Arc<dyn OrderApi>, printer: ReceiptPrinter, diff_mode: DiffMode) -> Self {
        Self {
            api,
            printer,
            diff_mode,
            sync: SyncState::new(),
            list: OrderListModel::new(),
            detail: DetailView::new(),
            modal: ConfirmationModal::new(),
            banner: None,
        }
    }

    pub fn sync_state(&self) -> &SyncState {
        &self.sync
    }

    pub fn rows(&self) -> &[OrderRow] {
        self.list.rows()
    }

    pub fn modal_open(&self) -> bool {
        self.modal.is_open()
    }

    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    /// Whether the poll timer should fire at all.
    pub fn polling_active(&self) -> bool {
        self.sync.is_active()
    }

    pub async fn dispatch(&mut self, command: Command) -> Vec<UiUpdate> {
        match command {
            Command::Tick => self.tick().await,
            Command::Reload => self.reload().await,
            Command::Consult(order_id) => self.consult(&order_id).await,
            Command::DeleteRow(order_id) => self.delete_row(&order_id).await,
            Command::Modal(action) => self.modal_action(action).await,
            Command::DismissBanner => match self.banner.take() {
                Some(_) => vec![UiUpdate::BannerHidden],
                None => Vec::new(),
            },
            Command::ShowList => vec![UiUpdate::ListSnapshot(self.list.rows().to_vec())],
            // The run loop stops on Quit before it gets here.
            Command::Quit => Vec::new(),
        }
    }

    async fn tick(&mut self) -> Vec<UiUpdate> {
        match poll_once(&mut self.sync, self.api.as_ref(), self.diff_mode).await {
            Ok(events) => self.apply_events(&events),
            Err(_) => Vec::new(),
        }
    }

    async fn reload(&mut self) -> Vec<UiUpdate> {
        if self.modal.is_open() {
            return vec![busy_notice()];
        }
        match self.api.list_orders().await {
            Ok(fetched) => {
                let events = self.sync.merge_fetch(&fetched);
                info!(added = events.len(), "Orders reloaded");
                self.apply_events(&events)
            }
            Err(e) => {
                warn!(error = %e, "Manual reload failed");
                vec![UiUpdate::Notice(format!("Error fetching orders: {e}"))]
            }
        }
    }

    async fn consult(&mut self, order_id: &str) -> Vec<UiUpdate> {
        if self.modal.is_open() {
            return vec![busy_notice()];
        }
        let Some(order) = self.sync.get(order_id).cloned() else {
            return vec![unknown_notice(order_id)];
        };

        self.detail.clear();
        let fetched = self.api.get_order_details(order_id).await;
        if let Err(e) = &fetched {
            error!(order_id, error = %e, "Error fetching order details");
        }
        self.detail.load(fetched);

        let view = self.detail.modal_view(&order);
        if !self.modal.open(order) {
            return Vec::new();
        }
        self.sync.suspend();
        vec![UiUpdate::ModalOpened(view)]
    }

    async fn delete_row(&mut self, order_id: &str) -> Vec<UiUpdate> {
        if self.modal.is_open() {
            return vec![busy_notice()];
        }
        if !self.sync.is_tracked(order_id) {
            return vec![unknown_notice(order_id)];
        }
        self.delete_order(order_id).await
    }

    async fn modal_action(&mut self, action: ModalAction) -> Vec<UiUpdate> {
        let Some(order) = self.modal.close() else {
            return vec![UiUpdate::Notice("No order is open".to_string())];
        };
        let mut updates = match action {
            ModalAction::Release => self.release(&order).await,
            ModalAction::Delete => self.delete_order(&order.id).await,
            ModalAction::Return => Vec::new(),
        };
        self.detail.clear();
        self.sync.resume();
        updates.insert(0, UiUpdate::ModalClosed);
        updates
    }

    async fn release(&mut self, order: &OrderSummary) -> Vec<UiUpdate> {
        let outcome = self.printer.print_receipt(order, self.detail.items());
        if !outcome.success {
            warn!(order_id = %order.id, message = %outcome.message, "Release aborted: receipt not printed");
            return self.show_banner();
        }
        if !self.api.release_order(&order.id).await {
            warn!(order_id = %order.id, "Receipt printed but release was rejected");
            return self.show_banner();
        }
        info!(order_id = %order.id, "Order released");
        self.forget(&order.id)
    }

    /// Local removal first; the server call's outcome only gets logged.
    async fn delete_order(&mut self, order_id: &str) -> Vec<UiUpdate> {
        let updates = self.forget(order_id);
        if !self.api.delete_order_details(order_id).await {
            warn!(order_id, "Delete request failed; order already removed locally");
        }
        updates
    }

    fn forget(&mut self, order_id: &str) -> Vec<UiUpdate> {
        self.sync.remove_local(order_id);
        self.list
            .remove(order_id)
            .map(UiUpdate::from)
            .into_iter()
            .collect()
    }

    fn show_banner(&mut self) -> Vec<UiUpdate> {
        self.banner = Some(PRINT_ERROR_BANNER.to_string());
        vec![UiUpdate::BannerShown(PRINT_ERROR_BANNER.to_string())]
    }

    fn apply_events(&mut self, events: &[SyncEvent]) -> Vec<UiUpdate> {
        events
            .iter()
            .filter_map(|event| self.list.apply(event))
            .map(UiUpdate::from)
            .collect()
    }
}

fn busy_notice() -> UiUpdate {
    UiUpdate::Notice("Finish the open order first".to_string())
}

fn unknown_notice(order_id: &str) -> UiUpdate {
    UiUpdate::Notice(format!("Order #{order_id} is not in the list"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detail::DetailEntry;
    use crate::printer::ReceiptSink;
    use crate::receipt::LayoutConfig;
    use crate::testing::{line_item, pending, FakeOrderApi, MissingSink, RecordingSink};

    fn desk_with(api: Arc<FakeOrderApi>, sink: Box<dyn ReceiptSink>) -> OrderDesk {
        let printer = ReceiptPrinter::new(sink, LayoutConfig::default());
        OrderDesk::new(api, printer, DiffMode::Membership)
    }

    async fn seeded_desk(
        ids: &[&str],
        sink: Box<dyn ReceiptSink>,
    ) -> (OrderDesk, Arc<FakeOrderApi>) {
        let api = Arc::new(FakeOrderApi::with_orders(
            ids.iter().map(|id| pending(id)).collect(),
        ));
        let mut desk = desk_with(api.clone(), sink);
        desk.dispatch(Command::Tick).await;
        (desk, api)
    }

    fn tracked_ids(desk: &OrderDesk) -> Vec<String> {
        desk.sync_state()
            .tracked()
            .iter()
            .map(|o| o.id.clone())
            .collect()
    }

    #[tokio::test]
    async fn tick_fills_the_list() {
        let (desk, _) = seeded_desk(&["1", "2"], Box::new(RecordingSink::default())).await;
        assert_eq!(tracked_ids(&desk), ["1", "2"]);
        assert_eq!(desk.rows().len(), 2);
        assert_eq!(desk.sync_state().last_pending_count(), 2);
    }

    #[tokio::test]
    async fn consult_opens_modal_and_suspends() {
        let (mut desk, api) = seeded_desk(&["1"], Box::new(RecordingSink::default())).await;
        api.set_details("1", vec![line_item("Taco", "PZA", 12.5)]);
        let updates = desk.dispatch(Command::Consult("1".into())).await;
        assert!(matches!(updates.as_slice(), [UiUpdate::ModalOpened(view)] if view.entries.len() == 1));
        assert!(desk.modal_open());
        assert!(!desk.polling_active());

        // No fetch while suspended.
        let before = api.call_count("list_orders");
        assert!(desk.dispatch(Command::Tick).await.is_empty());
        assert_eq!(api.call_count("list_orders"), before);
    }

    #[tokio::test]
    async fn consult_with_failed_details_still_opens() {
        let (mut desk, _) = seeded_desk(&["1"], Box::new(RecordingSink::default())).await;
        let updates = desk.dispatch(Command::Consult("1".into())).await;
        match updates.as_slice() {
            [UiUpdate::ModalOpened(view)] => assert_eq!(
                view.entries,
                vec![DetailEntry::Error("Error fetching order details".into())]
            ),
            other => panic!("unexpected updates: {other:?}"),
        }
    }

    #[tokio::test]
    async fn second_consult_is_a_noop() {
        let (mut desk, api) = seeded_desk(&["1", "2"], Box::new(RecordingSink::default())).await;
        desk.dispatch(Command::Consult("1".into())).await;
        let updates = desk.dispatch(Command::Consult("2".into())).await;
        assert!(matches!(updates.as_slice(), [UiUpdate::Notice(_)]));
        assert_eq!(api.call_count("get_order_details"), 1);
        assert!(desk.modal_open());

        // A single Return resumes polling: there was only one suspend.
        desk.dispatch(Command::Modal(ModalAction::Return)).await;
        assert!(desk.polling_active());
    }

    #[tokio::test]
    async fn release_after_print_failure_keeps_order_and_skips_release() {
        let (mut desk, api) = seeded_desk(&["1"], Box::new(MissingSink)).await;
        desk.dispatch(Command::Consult("1".into())).await;
        let updates = desk.dispatch(Command::Modal(ModalAction::Release)).await;

        assert_eq!(api.call_count("release_order"), 0);
        assert_eq!(tracked_ids(&desk), ["1"]);
        assert_eq!(desk.sync_state().last_pending_count(), 1);
        assert_eq!(desk.banner(), Some(PRINT_ERROR_BANNER));
        assert_eq!(
            updates,
            vec![
                UiUpdate::ModalClosed,
                UiUpdate::BannerShown(PRINT_ERROR_BANNER.into())
            ]
        );
        assert!(desk.polling_active());
    }

    #[tokio::test]
    async fn release_rejected_by_server_keeps_order() {
        let sink = RecordingSink::default();
        let jobs = sink.jobs.clone();
        let (mut desk, api) = seeded_desk(&["1"], Box::new(sink)).await;
        api.set_release_ok(false);
        desk.dispatch(Command::Consult("1".into())).await;
        desk.dispatch(Command::Modal(ModalAction::Release)).await;

        assert_eq!(jobs.lock().unwrap().len(), 1);
        assert_eq!(api.call_count("release_order"), 1);
        assert_eq!(tracked_ids(&desk), ["1"]);
        assert!(desk.banner().is_some());
    }

    #[tokio::test]
    async fn successful_release_removes_order() {
        let (mut desk, api) = seeded_desk(&["1", "2"], Box::new(RecordingSink::default())).await;
        api.set_details("1", vec![line_item("Taco", "PZA", 12.5)]);
        desk.dispatch(Command::Consult("1".into())).await;
        let updates = desk.dispatch(Command::Modal(ModalAction::Release)).await;

        assert_eq!(
            updates,
            vec![UiUpdate::ModalClosed, UiUpdate::RowRemoved("1".into())]
        );
        assert_eq!(tracked_ids(&desk), ["2"]);
        assert_eq!(desk.sync_state().last_pending_count(), 1);
        assert!(desk.banner().is_none());
        assert!(api.calls().contains(&"release_order:1".to_string()));
    }

    #[tokio::test]
    async fn delete_removes_order_even_when_server_fails() {
        for delete_ok in [true, false] {
            let (mut desk, api) =
                seeded_desk(&["1", "2"], Box::new(RecordingSink::default())).await;
            api.set_delete_ok(delete_ok);
            desk.dispatch(Command::Consult("2".into())).await;
            desk.dispatch(Command::Modal(ModalAction::Delete)).await;

            assert_eq!(tracked_ids(&desk), ["1"]);
            assert_eq!(desk.sync_state().last_pending_count(), 1);
            assert_eq!(api.call_count("delete_order_details"), 1);
            assert!(!desk.modal_open());
            assert!(desk.polling_active());
        }
    }

    #[tokio::test]
    async fn return_closes_without_mutation() {
        let (mut desk, api) = seeded_desk(&["1"], Box::new(RecordingSink::default())).await;
        desk.dispatch(Command::Consult("1".into())).await;
        let updates = desk.dispatch(Command::Modal(ModalAction::Return)).await;
        assert_eq!(updates, vec![UiUpdate::ModalClosed]);
        assert_eq!(tracked_ids(&desk), ["1"]);
        assert_eq!(api.call_count("release_order"), 0);
        assert_eq!(api.call_count("delete_order_details"), 0);
    }

    #[tokio::test]
    async fn row_delete_is_ignored_while_modal_open() {
        let (mut desk, api) = seeded_desk(&["1", "2"], Box::new(RecordingSink::default())).await;
        desk.dispatch(Command::Consult("1".into())).await;
        desk.dispatch(Command::DeleteRow("2".into())).await;
        assert_eq!(tracked_ids(&desk), ["1", "2"]);
        assert_eq!(api.call_count("delete_order_details"), 0);

        desk.dispatch(Command::Modal(ModalAction::Return)).await;
        let updates = desk.dispatch(Command::DeleteRow("2".into())).await;
        assert_eq!(updates, vec![UiUpdate::RowRemoved("2".into())]);
        assert_eq!(tracked_ids(&desk), ["1"]);
    }

    #[tokio::test]
    async fn reload_only_adds() {
        let (mut desk, api) = seeded_desk(&["1", "2"], Box::new(RecordingSink::default())).await;
        api.set_orders(vec![pending("2"), pending("3")]);
        let updates = desk.dispatch(Command::Reload).await;
        assert_eq!(updates.len(), 1);
        assert!(matches!(&updates[0], UiUpdate::RowAdded(row) if row.id == "3"));
        assert_eq!(tracked_ids(&desk), ["1", "2", "3"]);
    }

    #[tokio::test]
    async fn failed_tick_changes_nothing() {
        let (mut desk, api) = seeded_desk(&["1"], Box::new(RecordingSink::default())).await;
        api.set_listing_fails(true);
        assert!(desk.dispatch(Command::Tick).await.is_empty());
        assert_eq!(tracked_ids(&desk), ["1"]);
    }

    #[tokio::test]
    async fn banner_stays_until_dismissed() {
        let (mut desk, _) = seeded_desk(&["1"], Box::new(MissingSink)).await;
        desk.dispatch(Command::Consult("1".into())).await;
        desk.dispatch(Command::Modal(ModalAction::Release)).await;
        desk.dispatch(Command::Tick).await;
        assert!(desk.banner().is_some());
        assert_eq!(
            desk.dispatch(Command::DismissBanner).await,
            vec![UiUpdate::BannerHidden]
        );
        assert!(desk.banner().is_none());
        assert!(desk.dispatch(Command::DismissBanner).await.is_empty());
    }

    #[tokio::test]
    async fn modal_action_without_open_modal() {
        let (mut desk, api) = seeded_desk(&["1"], Box::new(RecordingSink::default())).await;
        let updates = desk.dispatch(Command::Modal(ModalAction::Delete)).await;
        assert!(matches!(updates.as_slice(), [UiUpdate::Notice(_)]));
        assert_eq!(api.call_count("delete_order_details"), 0);
        assert_eq!(tracked_ids(&desk), ["1"]);
    }
}
