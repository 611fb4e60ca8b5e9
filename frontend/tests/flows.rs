use std::sync::Arc;

use chrono::NaiveDate;
use finance_tracker_frontend::config::AppConfig;
use finance_tracker_frontend::services::data_service::{CategoryService, EntryService, LedgerService};
use finance_tracker_frontend::state::auth_flow::{AuthFlow, AuthOutcome, SessionTracker};
use finance_tracker_frontend::state::editor::{
    CategoryEditor, DeleteOutcome, LedgerEditor, SubmitOutcome, EDIT_PAGE, LIST_PAGE,
};
use finance_tracker_frontend::state::entry_form::{EntryDialog, EntryFormAction, EntrySubmitOutcome};
use finance_tracker_frontend::state::entry_list::EntryList;
use finance_tracker_frontend::{DataService, ErrorCode, MemoryDataService, PolicyError};
use shared::{NewCategory, NewLedger};

async fn signed_up() -> (Arc<MemoryDataService>, AppConfig) {
    let config = AppConfig::default();
    let service = Arc::new(MemoryDataService::new());
    let flow = AuthFlow::new(service.clone(), config.notifications.clone());

    let outcome = flow.sign_up("carol@example.com", "Str0ng!pass", "Str0ng!pass").await;
    assert!(matches!(outcome, AuthOutcome::SignedIn(_)), "sign up failed: {:?}", outcome);
    (service, config)
}

#[tokio::test(start_paused = true)]
async fn sign_up_then_record_first_entry() {
    let config = AppConfig::default();
    let service = Arc::new(MemoryDataService::new());
    let tracker = SessionTracker::new(service.as_ref());
    let flow = AuthFlow::new(service.clone(), config.notifications.clone());

    assert!(!tracker.is_signed_in());
    let outcome = flow.sign_up("carol@example.com", "Str0ng!pass", "Str0ng!pass").await;
    assert!(matches!(outcome, AuthOutcome::SignedIn(_)));
    assert_eq!(tracker.session().map(|s| s.email), Some("carol@example.com".to_string()));

    let ledgers = LedgerEditor::new(service.clone(), config.notifications.clone());
    ledgers.open(None).await.unwrap();
    ledgers.open_create();
    assert!(matches!(
        ledgers.submit(NewLedger::new("Personal")).await,
        SubmitOutcome::Saved(_)
    ));

    let dialog = EntryDialog::new(
        service.clone(),
        config.notifications.clone(),
        config.default_currency.clone(),
    );
    dialog.open(None, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()).await;
    dialog.edit(EntryFormAction::SetDetail("Paycheque".to_string()));
    dialog.edit(EntryFormAction::SetAmount("1500.50".to_string()));
    dialog.edit(EntryFormAction::SetPositive(true));

    let EntrySubmitOutcome::Saved(change) = dialog.submit().await else {
        panic!("entry was not saved");
    };
    let mut list = EntryList::new(config.default_currency.clone());
    assert!(list.apply(change));
    assert_eq!(list.totals().income.to_padded_string(), "1500.50");
    assert_eq!(
        service.list_recent_entries(config.recent_entries_limit).await.unwrap().len(),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn last_ledger_survives_delete() {
    let (service, config) = signed_up().await;
    let personal = service.add_ledger(NewLedger::new("Personal")).await.unwrap();

    let editor = LedgerEditor::new(service.clone(), config.notifications.clone());
    editor.open(None).await.unwrap();
    editor.request_delete(personal.clone());
    assert_eq!(
        editor.confirm_delete().await,
        DeleteOutcome::Blocked(PolicyError::LastLedger)
    );
    assert_eq!(service.list_ledgers().await.unwrap(), vec![personal.clone()]);

    let travel = service.add_ledger(NewLedger::new("Travel")).await.unwrap();
    editor.refresh().await.unwrap();
    editor.request_delete(travel);
    assert_eq!(editor.confirm_delete().await, DeleteOutcome::Deleted);

    let remaining = service.list_ledgers().await.unwrap();
    assert_eq!(remaining, vec![personal]);
    assert_eq!(editor.items().len(), 1);
    assert_eq!(editor.state().page, LIST_PAGE);
}

#[tokio::test(start_paused = true)]
async fn category_name_collision_round_trip() {
    let (service, config) = signed_up().await;
    let editor = CategoryEditor::new(service.clone(), config.notifications.clone());
    editor.open(None).await.unwrap();

    editor.open_create();
    let food = NewCategory {
        name: "Food".to_string(),
        color: None,
    };
    assert!(matches!(editor.submit(food.clone()).await, SubmitOutcome::Saved(_)));

    editor.open_create();
    assert_eq!(editor.submit(food.clone()).await, SubmitOutcome::NameTaken);
    assert_eq!(editor.state().page, EDIT_PAGE);
    let conflict = service.add_category(food).await.unwrap_err();
    assert_eq!(conflict.code, ErrorCode::Conflict);

    let transport = NewCategory {
        name: "Transport".to_string(),
        color: Some("#3366ff".to_string()),
    };
    assert!(matches!(editor.submit(transport).await, SubmitOutcome::Saved(_)));

    let names: Vec<String> = service
        .list_categories()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["Food".to_string(), "Transport".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn reopening_dialog_starts_clean() {
    let (service, config) = signed_up().await;
    let shared_service: Arc<dyn DataService> = service.clone();
    let editor = CategoryEditor::new(shared_service, config.notifications.clone());

    editor.open(None).await.unwrap();
    editor.open_create();
    editor.close();
    assert!(!editor.state().is_open);

    editor.open(None).await.unwrap();
    let state = editor.state();
    assert_eq!(state.page, LIST_PAGE);
    assert!(state.history.is_empty());
    assert!(state.edit_target.is_none());
    assert_eq!(state.session, 2);
}
